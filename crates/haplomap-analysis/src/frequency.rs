//! Haplogroup frequency tables
//!
//! A [`FrequencyTable`] counts the haplogroups of one group of samples in two
//! ways:
//!
//! - **exact**: how many samples carry exactly this label
//! - **rollup**: how many samples carry this label or one of its descendants
//!
//! Rollup counts are collected by walking the segment path of every label, so
//! a sample counts once toward each of its ancestors (itself included). The
//! rollup count of a root therefore equals the number of samples under that
//! root, and every node's count is at least the sum of its children's.
//!
//! # Examples
//!
//! ```
//! use haplomap_analysis::frequency::FrequencyTable;
//! use haplomap_core::Haplogroup;
//!
//! let labels: Vec<Haplogroup> = ["R1b", "R1b1a2", "I2"]
//!     .into_iter()
//!     .filter_map(Haplogroup::parse)
//!     .collect();
//! let table: FrequencyTable = labels.iter().collect();
//!
//! let r1b = Haplogroup::parse("R1b").unwrap();
//! assert_eq!(table.total(), 3);
//! assert_eq!(table.exact(&r1b), 1);
//! assert_eq!(table.rollup(&r1b), 2);
//!
//! let roots: Vec<_> = table.tree().into_iter().map(|node| (node.label, node.count)).collect();
//! assert_eq!(roots, [("I".to_owned(), 1), ("R".to_owned(), 2)]);
//! ```

use std::{collections::BTreeMap, ops::Bound};

use haplomap_core::Haplogroup;
use serde::{Deserialize, Serialize};

/// Exact and ancestor-rollup haplogroup counts of a group of samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    exact: BTreeMap<String, usize>,
    /// Keyed by segment path; the ordering is a pre-order walk of the tree.
    rollup: BTreeMap<Vec<String>, usize>,
    total: usize,
}

/// A node of the haplogroup tree of a [`FrequencyTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyNode {
    pub label: String,
    /// Rollup count
    pub count: usize,
    /// Exact count
    pub exact: usize,
    pub children: Vec<FrequencyNode>,
}

/// Flat parent/child arrays of a tree, as consumed by sunburst charts.
///
/// `values` are rollup counts, so a parent's value is never smaller than the
/// sum of its children's ("total" branch values). Roots have an empty parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sunburst {
    pub ids: Vec<String>,
    pub labels: Vec<String>,
    pub parents: Vec<String>,
    pub values: Vec<usize>,
}

impl FrequencyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one sample.
    pub fn add(&mut self, haplogroup: &Haplogroup) {
        *self.exact.entry(haplogroup.label().to_owned()).or_insert(0) += 1;
        let segments = haplogroup.segments();
        for depth in 1..=segments.len() {
            *self.rollup.entry(segments[..depth].to_vec()).or_insert(0) += 1;
        }
        self.total += 1;
    }

    /// Adds all counts of `other` to `self`.
    pub fn merge(&mut self, other: &Self) {
        for (label, count) in &other.exact {
            *self.exact.entry(label.clone()).or_insert(0) += count;
        }
        for (path, count) in &other.rollup {
            *self.rollup.entry(path.clone()).or_insert(0) += count;
        }
        self.total += other.total;
    }

    /// Number of samples counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    #[must_use]
    pub fn exact(&self, haplogroup: &Haplogroup) -> usize {
        self.exact.get(haplogroup.label()).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn rollup(&self, haplogroup: &Haplogroup) -> usize {
        self.rollup
            .get(haplogroup.segments())
            .copied()
            .unwrap_or(0)
    }

    /// Exact counts by label.
    #[must_use]
    pub fn exact_counts(&self) -> &BTreeMap<String, usize> {
        &self.exact
    }

    /// Rollup counts by label, in pre-order.
    pub fn rollup_counts(&self) -> impl Iterator<Item = (String, usize)> + '_ {
        self.rollup.iter().map(|(path, count)| (path.concat(), *count))
    }

    /// The haplogroup tree, roots first, children ordered by segment.
    #[must_use]
    pub fn tree(&self) -> Vec<FrequencyNode> {
        self.children_of(&[])
    }

    fn children_of(&self, parent: &[String]) -> Vec<FrequencyNode> {
        self.rollup
            .range::<[String], _>((Bound::Excluded(parent), Bound::Unbounded))
            .take_while(|(path, _)| path.starts_with(parent))
            .filter(|(path, _)| path.len() == parent.len() + 1)
            .map(|(path, count)| {
                let label = path.concat();
                FrequencyNode {
                    exact: self.exact.get(&label).copied().unwrap_or(0),
                    label,
                    count: *count,
                    children: self.children_of(path),
                }
            })
            .collect()
    }

    /// The tree flattened into sunburst arrays, in pre-order.
    #[must_use]
    pub fn sunburst(&self) -> Sunburst {
        let mut sunburst = Sunburst::default();
        for (path, count) in &self.rollup {
            let id = path.concat();
            sunburst.parents.push(path[..path.len() - 1].concat());
            sunburst.labels.push(id.clone());
            sunburst.ids.push(id);
            sunburst.values.push(*count);
        }
        sunburst
    }
}

impl<'a> FromIterator<&'a Haplogroup> for FrequencyTable {
    fn from_iter<T: IntoIterator<Item = &'a Haplogroup>>(iter: T) -> Self {
        let mut table = Self::new();
        for haplogroup in iter {
            table.add(haplogroup);
        }
        table
    }
}

impl<'a> Extend<&'a Haplogroup> for FrequencyTable {
    fn extend<T: IntoIterator<Item = &'a Haplogroup>>(&mut self, iter: T) {
        for haplogroup in iter {
            self.add(haplogroup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hg(label: &str) -> Haplogroup {
        Haplogroup::parse(label).unwrap()
    }

    fn table(labels: &[&str]) -> FrequencyTable {
        labels.iter().map(|label| hg(label)).collect::<Vec<_>>().iter().collect()
    }

    #[test]
    fn test_exact_and_rollup_counts() {
        let table = table(&["R1b", "R1b1a2", "I2"]);
        let exact: Vec<_> = table.exact_counts().iter().map(|(l, c)| (l.as_str(), *c)).collect();
        assert_eq!(exact, [("I2", 1), ("R1b", 1), ("R1b1a2", 1)]);

        let rollup: BTreeMap<String, usize> = table.rollup_counts().collect();
        assert_eq!(rollup["R"], 2);
        assert_eq!(rollup["R1"], 2);
        assert_eq!(rollup["R1b"], 2);
        assert_eq!(rollup["R1b1"], 1);
        assert_eq!(rollup["R1b1a"], 1);
        assert_eq!(rollup["R1b1a2"], 1);
        assert_eq!(rollup["I"], 1);
        assert_eq!(rollup["I2"], 1);
        assert_eq!(rollup.len(), 8);
    }

    #[test]
    fn test_exact_sum_equals_total() {
        let table = table(&["H1", "H1", "H10e", "U5b2", "H"]);
        assert_eq!(table.exact_counts().values().sum::<usize>(), table.total());
        assert_eq!(table.rollup(&hg("H")), 4);
        assert_eq!(table.rollup(&hg("H1")), 2);
        assert_eq!(table.rollup(&hg("H10")), 1);
        assert_eq!(table.exact(&hg("H")), 1);
        assert_eq!(table.exact(&hg("K")), 0);
    }

    #[test]
    fn test_rollup_dominates_children() {
        fn check(nodes: &[FrequencyNode]) {
            for node in nodes {
                let children: usize = node.children.iter().map(|c| c.count).sum();
                assert!(node.count >= children + node.exact, "{}", node.label);
                assert!(node.count >= node.exact);
                check(&node.children);
            }
        }
        check(&table(&["R1b", "R1b1a2", "R1a1", "R1b1a2", "I2a", "I"]).tree());
    }

    #[test]
    fn test_tree_shape() {
        let tree = table(&["H1", "H10", "H"]).tree();
        assert_eq!(tree.len(), 1);
        let h = &tree[0];
        assert_eq!((h.label.as_str(), h.count, h.exact), ("H", 3, 1));
        let children: Vec<_> = h.children.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(children, ["H1", "H10"]);
        assert!(h.children.iter().all(|c| c.children.is_empty()));
    }

    #[test]
    fn test_sunburst_arrays() {
        let sunburst = table(&["I2", "I2"]).sunburst();
        assert_eq!(sunburst.ids, ["I", "I2"]);
        assert_eq!(sunburst.labels, sunburst.ids);
        assert_eq!(sunburst.parents, ["", "I"]);
        assert_eq!(sunburst.values, [2, 2]);
    }

    #[test]
    fn test_merge() {
        let mut a = table(&["R1b"]);
        a.merge(&table(&["R1b", "R1a"]));
        assert_eq!(a, table(&["R1b", "R1b", "R1a"]));
        assert!(FrequencyTable::new().is_empty());
    }
}
