//! Fixed-boundary binning for date filtering
//!
//! Samples are filtered on the map by date range. The ranges are chosen once
//! per run from a strictly increasing list of edges, and every bin is the
//! half-open interval between two consecutive edges:
//!
//! ```text
//! edges:  0      1000      2000      3000
//! bins:   [0, 1000) [1000, 2000) [2000, 3000)
//! ```
//!
//! A value on an edge belongs to the bin that starts at that edge. Values
//! below the first edge, at or above the last edge, or not finite are
//! unbinned.
//!
//! # Examples
//!
//! ```
//! use haplomap_stats::binning::TimeBins;
//!
//! let bins = TimeBins::new(vec![0.0, 1000.0, 2000.0]).unwrap();
//!
//! assert_eq!(bins.assign(999.5), Some(0));
//! assert_eq!(bins.assign(1000.0), Some(1));
//! assert_eq!(bins.assign(2000.0), None);
//! assert_eq!(bins.get(1).unwrap().label(), "1000-2000");
//! ```

use std::ops::Range;

/// Reasons a list of bin edges is rejected.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum BinEdgesError {
    #[display("at least two bin edges are required, got {count}")]
    TooFewEdges { count: usize },
    #[display("bin edge #{index} is not a finite number")]
    NonFiniteEdge { index: usize },
    #[display("bin edges must be strictly increasing, but {previous} is followed by {next}")]
    NotIncreasing { previous: f64, next: f64 },
}

/// One half-open interval `[start, end)` of a [`TimeBins`] set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBin {
    /// Position of this bin in the set, starting at 0
    pub index: usize,
    /// Inclusive lower bound
    pub start: f64,
    /// Exclusive upper bound
    pub end: f64,
}

impl TimeBin {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.start <= value && value < self.end
    }

    #[must_use]
    pub fn range(&self) -> Range<f64> {
        self.start..self.end
    }

    /// Display label used by the map filter, e.g. `"1000-2000"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// A contiguous, non-overlapping set of bins built from validated edges.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBins {
    edges: Vec<f64>,
}

impl Default for TimeBins {
    fn default() -> Self {
        Self {
            edges: Self::DEFAULT_EDGES.to_vec(),
        }
    }
}

/// Per-bin occupancy of a set of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinCounts {
    /// Number of values in each bin, indexed like the bins
    pub per_bin: Vec<usize>,
    /// Number of values that fell in no bin (missing or out of range)
    pub unbinned: usize,
}

impl TimeBins {
    /// Edges of the selectable date ranges on the map, in years BP.
    pub const DEFAULT_EDGES: [f64; 11] = [
        0.0, 1000.0, 2000.0, 3000.0, 4000.0, 5000.0, 6000.0, 7000.0, 8000.0, 11000.0, 44500.0,
    ];

    /// Builds bins from a list of edges.
    ///
    /// The edges must contain at least two finite values in strictly
    /// increasing order.
    pub fn new(edges: Vec<f64>) -> Result<Self, BinEdgesError> {
        if edges.len() < 2 {
            return Err(BinEdgesError::TooFewEdges { count: edges.len() });
        }
        if let Some(index) = edges.iter().position(|edge| !edge.is_finite()) {
            return Err(BinEdgesError::NonFiniteEdge { index });
        }
        if let Some(pair) = edges.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(BinEdgesError::NotIncreasing {
                previous: pair[0],
                next: pair[1],
            });
        }
        Ok(Self { edges })
    }

    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins (one less than the number of edges).
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The full covered interval, from the first edge to the last.
    #[must_use]
    pub fn range(&self) -> Range<f64> {
        self.edges[0]..self.edges[self.edges.len() - 1]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<TimeBin> {
        let start = *self.edges.get(index)?;
        let end = *self.edges.get(index + 1)?;
        Some(TimeBin { index, start, end })
    }

    pub fn iter(&self) -> impl Iterator<Item = TimeBin> + '_ {
        self.edges
            .windows(2)
            .enumerate()
            .map(|(index, pair)| TimeBin {
                index,
                start: pair[0],
                end: pair[1],
            })
    }

    /// Returns the index of the bin containing `value`.
    ///
    /// Returns `None` for values outside the covered range and for
    /// non-finite values.
    #[must_use]
    pub fn assign(&self, value: f64) -> Option<usize> {
        if !self.range().contains(&value) {
            return None;
        }
        // Number of edges <= value; the containing bin starts at the last of them.
        let upper = self.edges.partition_point(|&edge| edge <= value);
        Some(upper - 1)
    }

    /// Like [`Self::assign`], for values that may be missing.
    #[must_use]
    pub fn assign_opt(&self, value: Option<f64>) -> Option<usize> {
        value.and_then(|value| self.assign(value))
    }

    /// Counts how many values fall into each bin.
    pub fn count<I>(&self, values: I) -> BinCounts
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut per_bin = vec![0; self.len()];
        let mut unbinned = 0;
        for value in values {
            match self.assign_opt(value) {
                Some(index) => per_bin[index] += 1,
                None => unbinned += 1,
            }
        }
        BinCounts { per_bin, unbinned }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_bins() -> TimeBins {
        TimeBins::new(vec![0.0, 1000.0, 2000.0]).unwrap()
    }

    #[test]
    fn test_lower_boundary_belongs_to_starting_bin() {
        let bins = small_bins();
        assert_eq!(bins.assign(0.0), Some(0));
        assert_eq!(bins.assign(1000.0), Some(1));
    }

    #[test]
    fn test_upper_boundary_is_exclusive() {
        let bins = small_bins();
        assert_eq!(bins.assign(999.999), Some(0));
        assert_eq!(bins.assign(1999.999), Some(1));
        assert_eq!(bins.assign(2000.0), None);
    }

    #[test]
    fn test_out_of_range_and_non_finite() {
        let bins = small_bins();
        assert_eq!(bins.assign(-1.0), None);
        assert_eq!(bins.assign(5000.0), None);
        assert_eq!(bins.assign(f64::NAN), None);
        assert_eq!(bins.assign(f64::INFINITY), None);
        assert_eq!(bins.assign_opt(None), None);
    }

    #[test]
    fn test_every_value_in_range_has_exactly_one_bin() {
        let bins = TimeBins::default();
        let mut value = 0.0;
        while value < 44500.0 {
            let matching = bins.iter().filter(|bin| bin.contains(value)).count();
            assert_eq!(matching, 1, "value {value}");
            let index = bins.assign(value).unwrap();
            assert!(bins.get(index).unwrap().contains(value));
            value += 250.0;
        }
    }

    #[test]
    fn test_default_edges() {
        let bins = TimeBins::default();
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.range(), 0.0..44500.0);
        assert_eq!(bins.get(8).unwrap().label(), "8000-11000");
        assert_eq!(bins.get(9).unwrap().label(), "11000-44500");
        assert!(bins.get(10).is_none());
    }

    #[test]
    fn test_rejects_invalid_edges() {
        assert_eq!(
            TimeBins::new(vec![0.0]),
            Err(BinEdgesError::TooFewEdges { count: 1 })
        );
        assert_eq!(
            TimeBins::new(vec![0.0, f64::NAN]),
            Err(BinEdgesError::NonFiniteEdge { index: 1 })
        );
        assert_eq!(
            TimeBins::new(vec![0.0, 1000.0, 1000.0]),
            Err(BinEdgesError::NotIncreasing {
                previous: 1000.0,
                next: 1000.0
            })
        );
    }

    #[test]
    fn test_count() {
        let bins = small_bins();
        let counts = bins.count([Some(10.0), Some(1000.0), Some(1500.0), None, Some(9000.0)]);
        assert_eq!(counts.per_bin, vec![1, 2]);
        assert_eq!(counts.unbinned, 2);
    }
}
