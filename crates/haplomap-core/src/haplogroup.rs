//! Hierarchical haplogroup labels
//!
//! Haplogroup names encode their place in the phylogeny by alternating runs of
//! letters and digits: `R1b1a2` is a descendant of `R1b1a`, which descends from
//! `R1b1`, and so on up to the root clade `R`. A [`Haplogroup`] keeps the
//! cleaned label together with its explicit path segments so that ancestor
//! lookups are a prefix walk over the segment list.
//!
//! ```text
//! R1b1a2  ->  [R] [1] [b] [1] [a] [2]
//! H10e    ->  [H] [10] [e]
//! HV0a    ->  [HV] [0] [a]
//! ```
//!
//! Multi-digit numbers stay one segment, so `H10` is a child of `H` and not of
//! `H1`.
//!
//! # Cleaning
//!
//! Annotation files mix real labels with placeholders and free-text notes.
//! [`clean_label`] maps placeholders (`..`, `n/a`, `not published`, ...) to
//! `None` and cuts annotations that follow the label (`R1b1a2 (xR1b1a2a)`,
//! `H1 or H2`, `U5a1~`).
//!
//! # Examples
//!
//! ```
//! use haplomap_core::haplogroup::Haplogroup;
//!
//! let hg = Haplogroup::parse(" R1b1a2 (xR1b1a2a) ").unwrap();
//! assert_eq!(hg.label(), "R1b1a2");
//! assert_eq!(hg.root(), "R");
//! assert_eq!(
//!     hg.ancestors().collect::<Vec<_>>(),
//!     ["R", "R1", "R1b", "R1b1", "R1b1a", "R1b1a2"]
//! );
//!
//! assert!(Haplogroup::parse("n/a").is_none());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters that start an annotation after the actual label.
const ANNOTATION_CHARS: &[char] = &['+', '/', '(', ')', '\'', '~', '@', '-'];

/// Whole-value placeholders, compared case-insensitively.
const SENTINELS: &[&str] = &[
    "", "..", "n/a", "na", "nan", "none", "null", "unknown", "?",
];

/// Prefixes of free-text placeholders, compared case-insensitively.
const SENTINEL_PREFIXES: &[&str] = &["not", "likely"];

fn is_sentinel(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    value.contains("..")
        || SENTINELS.contains(&lower.as_str())
        || SENTINEL_PREFIXES
            .iter()
            .any(|prefix| lower.starts_with(prefix))
}

/// Cleans a raw haplogroup cell.
///
/// Returns `None` for placeholders and for labels that are empty once the
/// trailing annotation is removed.
///
/// ```
/// use haplomap_core::haplogroup::clean_label;
///
/// assert_eq!(clean_label("  U5b2b "), Some("U5b2b"));
/// assert_eq!(clean_label("H1 or H2"), Some("H1"));
/// assert_eq!(clean_label("I2a1+"), Some("I2a1"));
/// assert_eq!(clean_label(".."), None);
/// assert_eq!(clean_label("Not published"), None);
/// assert_eq!(clean_label("(xR1b)"), None);
/// ```
#[must_use]
pub fn clean_label(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let first_word = trimmed.split_whitespace().next().unwrap_or_default();
    if is_sentinel(trimmed) || is_sentinel(first_word) {
        return None;
    }
    let end = trimmed
        .find(|c: char| c.is_whitespace() || ANNOTATION_CHARS.contains(&c))
        .unwrap_or(trimmed.len());
    let label = &trimmed[..end];
    (!label.is_empty() && !is_sentinel(label)).then_some(label)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Letter,
    Digit,
    Other,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_ascii_digit() {
            Self::Digit
        } else if c.is_alphabetic() {
            Self::Letter
        } else {
            Self::Other
        }
    }
}

/// Splits a cleaned label into alternating letter and digit runs.
///
/// Other characters (such as a trailing `*`) stay attached to the segment
/// they follow.
fn segment(label: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current_class = None;
    for c in label.chars() {
        let class = CharClass::of(c);
        let continues = match (current_class, class) {
            (None, _) => false,
            (Some(_), CharClass::Other) => true,
            (Some(prev), class) => prev == class,
        };
        if continues && let Some(last) = segments.last_mut() {
            last.push(c);
            continue;
        }
        segments.push(c.to_string());
        current_class = Some(class);
    }
    segments
}

/// A cleaned haplogroup label with its path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Haplogroup {
    label: String,
    segments: Vec<String>,
}

/// Error returned when a string does not contain a usable haplogroup label.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("not a haplogroup label: {raw:?}")]
pub struct InvalidHaplogroup {
    pub raw: String,
}

impl Haplogroup {
    /// Cleans and segments a raw cell value.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let label = clean_label(raw)?;
        Some(Self {
            label: label.to_owned(),
            segments: segment(label),
        })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of path segments; a root clade has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The top-level clade, e.g. `R` for `R1b1a2`.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// Labels of every ancestor from the root down to this label itself.
    pub fn ancestors(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.segments.len()).map(|depth| self.prefix(depth))
    }

    /// The label truncated to its first `depth` segments.
    #[must_use]
    pub fn prefix(&self, depth: usize) -> String {
        self.segments[..depth.min(self.segments.len())].concat()
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for Haplogroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.label, f)
    }
}

impl TryFrom<String> for Haplogroup {
    type Error = InvalidHaplogroup;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw).ok_or(InvalidHaplogroup { raw })
    }
}

impl From<Haplogroup> for String {
    fn from(haplogroup: Haplogroup) -> Self {
        haplogroup.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments_of(label: &str) -> Vec<String> {
        Haplogroup::parse(label).unwrap().segments().to_vec()
    }

    #[test]
    fn test_segments_alternate_letters_and_digits() {
        assert_eq!(segments_of("R1b1a2"), ["R", "1", "b", "1", "a", "2"]);
        assert_eq!(segments_of("H10e"), ["H", "10", "e"]);
        assert_eq!(segments_of("HV0a"), ["HV", "0", "a"]);
        assert_eq!(segments_of("I"), ["I"]);
    }

    #[test]
    fn test_other_characters_stay_attached() {
        assert_eq!(segments_of("R1b*"), ["R", "1", "b*"]);
    }

    #[test]
    fn test_ancestors_include_self() {
        let hg = Haplogroup::parse("I2").unwrap();
        assert_eq!(hg.ancestors().collect::<Vec<_>>(), ["I", "I2"]);
        assert_eq!(hg.depth(), 2);
        assert_eq!(hg.prefix(5), "I2");
    }

    #[test]
    fn test_multi_digit_is_not_child_of_single_digit() {
        let h1 = Haplogroup::parse("H1").unwrap();
        let h10 = Haplogroup::parse("H10").unwrap();
        let h = Haplogroup::parse("H").unwrap();
        assert!(!h1.is_ancestor_of(&h10));
        assert!(h.is_ancestor_of(&h10));
        assert!(h10.is_ancestor_of(&h10));
    }

    #[test]
    fn test_sentinels() {
        for raw in [
            "", "  ", "..", "n/a", "N/A", "na", "NaN", "none", "unknown", "not published",
            "Likely R1b", "R1b..", "n/a (female)",
        ] {
            assert_eq!(clean_label(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn test_annotations_are_stripped() {
        assert_eq!(clean_label("R1b1a1b1a1a2c1~"), Some("R1b1a1b1a1a2c1"));
        assert_eq!(clean_label("J2a1a(xJ2a1a1)"), Some("J2a1a"));
        assert_eq!(clean_label("U5a1'2'3"), Some("U5a1"));
        assert_eq!(clean_label("E1b1b1a1b1a-V13"), Some("E1b1b1a1b1a"));
        assert_eq!(clean_label("T2b@16296"), Some("T2b"));
        assert_eq!(clean_label("K1a/U8b"), Some("K1a"));
    }

    #[test]
    fn test_real_labels_survive() {
        for label in ["N1a1a1a1", "NO1", "R1b", "L3e", "M7b1a1"] {
            assert_eq!(clean_label(label), Some(label));
        }
    }

    #[test]
    fn test_serde_uses_label() {
        let hg = Haplogroup::parse("U5b2").unwrap();
        let json = serde_json::to_string(&hg).unwrap();
        assert_eq!(json, "\"U5b2\"");
        let back: Haplogroup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hg);
        assert!(serde_json::from_str::<Haplogroup>("\"..\"").is_err());
    }
}
