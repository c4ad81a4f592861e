//! Row normalization
//!
//! Turns [`RawRecord`]s into [`Sample`]s. Every row produces an explicit
//! `Result<Sample, RowRejection>`; rejected rows are dropped and counted by
//! reason, they never abort a run.
//!
//! # Rules
//!
//! - **Coordinates**: both required, numeric, finite and within
//!   `[-90, 90]` / `[-180, 180]`; rounded to two decimals so that
//!   near-identical sites collapse into one location.
//! - **Date**: the mean BP estimate. An empty or `..` cell means "unknown"
//!   (`date_bp = None`). Other text that is not a number falls back to the
//!   free-text full-date column (`2624-2350 calBCE (...)`); if that fails
//!   too the row is rejected. Present-day samples (BP 0) are rejected unless
//!   configured otherwise.
//! - **Haplogroups**: cleaned with [`Haplogroup::parse`]; placeholders become
//!   `None`.
//! - **Country**: trimmed, with known misspellings corrected.
//!
//! # Examples
//!
//! ```
//! use haplomap_core::{
//!     normalize::{Normalizer, RowRejection},
//!     raw::{Column, RawRecord},
//! };
//!
//! let normalizer = Normalizer::default();
//! let record = RawRecord::new(1)
//!     .with(Column::Latitude, "51.234")
//!     .with(Column::Longitude, "-1.5")
//!     .with(Column::DateMeanBp, "4200")
//!     .with(Column::HaplogroupY, "R1b1a2 (xR1b1a2a)")
//!     .with(Column::HaplogroupMt, "..");
//!
//! let sample = normalizer.normalize_row(&record).unwrap();
//! assert_eq!(sample.coordinates.latitude, 51.23);
//! assert_eq!(sample.haplogroup_y.unwrap().label(), "R1b1a2");
//! assert!(sample.haplogroup_mt.is_none());
//!
//! let bad = RawRecord::new(2)
//!     .with(Column::Latitude, "95")
//!     .with(Column::Longitude, "10");
//! assert_eq!(normalizer.normalize_row(&bad), Err(RowRejection::InvalidLatitude));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    haplogroup::Haplogroup,
    raw::{Column, RawRecord},
    sample::{Coordinates, Sample},
};

/// Calendar year of "present" in BP dating.
const PRESENT_YEAR_CE: f64 = 1950.0;

/// Country spellings corrected on ingestion.
const COUNTRY_CORRECTIONS: &[(&str, &str)] = &[
    ("Gernamy", "Germany"),
    ("Federated States of Micronesia", "Micronesia"),
];

/// Why a row was dropped during normalization.
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
    derive_more::Error,
)]
pub enum RowRejection {
    #[display("missing coordinates")]
    MissingCoordinates,
    #[display("latitude not a number in [-90, 90]")]
    InvalidLatitude,
    #[display("longitude not a number in [-180, 180]")]
    InvalidLongitude,
    #[display("date is not numeric and no full date fallback could be parsed")]
    InvalidDate,
    #[display("date lies in the future")]
    NegativeDate,
    #[display("present-day sample")]
    PresentDay,
}

/// Options of the [`Normalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Reject samples dated to BP 0 (present-day reference individuals)
    pub drop_present_day: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            drop_present_day: true,
        }
    }
}

/// Number of rejected rows per reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts(BTreeMap<RowRejection, usize>);

impl RejectionCounts {
    pub fn record(&mut self, reason: RowRejection) {
        *self.0.entry(reason).or_insert(0) += 1;
    }

    #[must_use]
    pub fn get(&self, reason: RowRejection) -> usize {
        self.0.get(&reason).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RowRejection, usize)> + '_ {
        self.0.iter().map(|(reason, count)| (*reason, *count))
    }
}

/// Output of [`Normalizer::normalize_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSamples {
    /// Accepted samples, in input order
    pub samples: Vec<Sample>,
    pub rejections: RejectionCounts,
}

impl NormalizedSamples {
    /// Number of rows that were dropped.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejections.total()
    }
}

/// Maps raw annotation rows to canonical samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    #[must_use]
    pub fn new(config: NormalizeConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> NormalizeConfig {
        self.config
    }

    /// Normalizes a single row.
    pub fn normalize_row(&self, record: &RawRecord) -> Result<Sample, RowRejection> {
        let latitude = parse_coordinate(
            record.get(Column::Latitude),
            90.0,
            RowRejection::InvalidLatitude,
        )?;
        let longitude = parse_coordinate(
            record.get(Column::Longitude),
            180.0,
            RowRejection::InvalidLongitude,
        )?;
        let date_bp = self.parse_date(record)?;

        let id = record
            .get(Column::GeneticId)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("row-{}", record.row), str::to_owned);

        Ok(Sample {
            id,
            coordinates: Coordinates {
                latitude,
                longitude,
            },
            date_bp,
            haplogroup_y: record.get(Column::HaplogroupY).and_then(Haplogroup::parse),
            haplogroup_mt: record.get(Column::HaplogroupMt).and_then(Haplogroup::parse),
            country: record.get(Column::PoliticalEntity).and_then(normalize_country),
        })
    }

    /// Normalizes every row, counting rejections.
    pub fn normalize_all<'a, I>(&self, records: I) -> NormalizedSamples
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        let mut output = NormalizedSamples::default();
        for record in records {
            match self.normalize_row(record) {
                Ok(sample) => output.samples.push(sample),
                Err(reason) => {
                    log::trace!("row {} rejected: {reason}", record.row);
                    output.rejections.record(reason);
                }
            }
        }
        output
    }

    fn parse_date(&self, record: &RawRecord) -> Result<Option<f64>, RowRejection> {
        let date = match record.get(Column::DateMeanBp).map(str::trim) {
            None | Some("" | "..") => None,
            Some(text) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => Some(
                    record
                        .get(Column::FullDate)
                        .and_then(parse_full_date)
                        .ok_or(RowRejection::InvalidDate)?,
                ),
            },
        };
        match date {
            Some(value) if value < 0.0 => Err(RowRejection::NegativeDate),
            Some(value) if value <= 0.0 && self.config.drop_present_day => {
                Err(RowRejection::PresentDay)
            }
            _ => Ok(date),
        }
    }
}

/// Parses a coordinate within `[-limit, limit]`, rounded to two decimals.
fn parse_coordinate(
    cell: Option<&str>,
    limit: f64,
    invalid: RowRejection,
) -> Result<f64, RowRejection> {
    let text = match cell.map(str::trim) {
        None | Some("" | "..") => return Err(RowRejection::MissingCoordinates),
        Some(text) => text,
    };
    let value: f64 = text.parse().map_err(|_| invalid)?;
    if !value.is_finite() || value.abs() > limit {
        return Err(invalid);
    }
    Ok((value * 100.0).round() / 100.0)
}

fn normalize_country(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ".." {
        return None;
    }
    let corrected = COUNTRY_CORRECTIONS
        .iter()
        .find_map(|(wrong, right)| (*wrong == trimmed).then_some(*right))
        .unwrap_or(trimmed);
    Some(corrected.to_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Era {
    Bce,
    Ce,
    Bp,
}

impl Era {
    fn parse(token: &str) -> Option<Self> {
        let upper = token.trim_end_matches(['.', ',', ';']).to_ascii_uppercase();
        match upper.strip_prefix("CAL").unwrap_or(&upper) {
            "BCE" | "BC" => Some(Self::Bce),
            "CE" | "AD" => Some(Self::Ce),
            "BP" => Some(Self::Bp),
            _ => None,
        }
    }

    fn to_bp(self, year: f64) -> f64 {
        match self {
            // There is no year 0: 1 BCE is immediately followed by 1 CE.
            Era::Bce => year + PRESENT_YEAR_CE - 1.0,
            Era::Ce => PRESENT_YEAR_CE - year,
            Era::Bp => year,
        }
    }
}

/// Parses one endpoint such as `2624`, `2350 calBCE` or `100 CE`.
fn parse_endpoint(text: &str) -> Option<(f64, Option<Era>)> {
    let mut tokens = text.split_whitespace();
    let year: f64 = tokens.next()?.parse().ok()?;
    if !year.is_finite() || year < 0.0 {
        return None;
    }
    let era = match tokens.next() {
        Some(token) => Some(Era::parse(token)?),
        None => None,
    };
    Some((year, era))
}

/// Converts a free-text full date into a mean BP value.
///
/// Accepts a single year or a range, each with an era marker
/// (`BCE`/`BC`, `CE`/`AD`, `BP`, optionally prefixed with `cal`). A range
/// endpoint without a marker takes the marker of the other endpoint.
/// Anything in parentheses is ignored.
///
/// ```
/// use haplomap_core::normalize::parse_full_date;
///
/// assert_eq!(parse_full_date("2624-2350 calBCE (3990±40 BP, Ua-35016)"), Some(4436.0));
/// assert_eq!(parse_full_date("1200-1400 CE"), Some(650.0));
/// assert_eq!(parse_full_date("100 BCE-100 CE"), Some(1949.5));
/// assert_eq!(parse_full_date("present"), None);
/// ```
#[must_use]
pub fn parse_full_date(text: &str) -> Option<f64> {
    let text = text.split('(').next()?.trim();
    let mut parts = text.splitn(2, '-');
    let first = parse_endpoint(parts.next()?)?;
    let second = match parts.next() {
        Some(part) => Some(parse_endpoint(part)?),
        None => None,
    };

    let (first_bp, second_bp) = match second {
        None => (first.1?.to_bp(first.0), None),
        Some(second) => {
            let second_era = second.1.or(first.1)?;
            let first_era = first.1.unwrap_or(second_era);
            (
                first_era.to_bp(first.0),
                Some(second_era.to_bp(second.0)),
            )
        }
    };
    Some(second_bp.map_or(first_bp, |second_bp| (first_bp + second_bp) / 2.0))
}
