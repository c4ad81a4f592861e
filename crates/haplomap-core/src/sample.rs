//! Canonical sample records
//!
//! A [`Sample`] is one individual from the annotation table after
//! normalization: validated coordinates, an optional date in years before
//! present, and up to two haplogroup labels, one per [`Lineage`].

use serde::{Deserialize, Serialize};

use crate::haplogroup::Haplogroup;

/// Identifier of a sample, taken from the table or derived from its row.
pub type SampleId = String;

/// One of the two independently processed lineage tracks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
pub enum Lineage {
    /// Paternal line, Y chromosome
    #[display("Y")]
    #[serde(rename = "Y")]
    Y,
    /// Maternal line, mitochondrial DNA
    #[display("mtDNA")]
    #[serde(rename = "mtDNA")]
    Mt,
}

impl Lineage {
    pub const ALL: [Lineage; 2] = [Lineage::Y, Lineage::Mt];
}

/// A geographic position in degrees.
///
/// Sample coordinates are rounded to two decimal places on ingestion;
/// cluster centroids are not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Degrees north, in `[-90, 90]`
    pub latitude: f64,
    /// Degrees east, in `[-180, 180]`
    pub longitude: f64,
}

impl Coordinates {
    /// Returns the coordinates as a `[latitude, longitude]` point.
    #[must_use]
    pub fn to_point(self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }

    /// Key that is equal for coordinates with identical bit patterns.
    ///
    /// Coordinates are rounded on ingestion, so equal sites compare equal.
    #[must_use]
    pub fn site_key(self) -> (u64, u64) {
        (self.latitude.to_bits(), self.longitude.to_bits())
    }
}

/// A normalized genetic sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    pub coordinates: Coordinates,
    /// Mean date in years before 1950 CE, `None` when unknown
    pub date_bp: Option<f64>,
    pub haplogroup_y: Option<Haplogroup>,
    pub haplogroup_mt: Option<Haplogroup>,
    /// Political entity the sample was found in
    pub country: Option<String>,
}

impl Sample {
    #[must_use]
    pub fn haplogroup(&self, lineage: Lineage) -> Option<&Haplogroup> {
        match lineage {
            Lineage::Y => self.haplogroup_y.as_ref(),
            Lineage::Mt => self.haplogroup_mt.as_ref(),
        }
    }

    /// Whether the sample takes part in at least one lineage pipeline.
    #[must_use]
    pub fn has_any_haplogroup(&self) -> bool {
        self.haplogroup_y.is_some() || self.haplogroup_mt.is_some()
    }
}
