//! Core data model of the haplogroup map.
//!
//! This crate turns rows of an ancient-DNA annotation table into validated
//! [`Sample`]s:
//!
//! - [`raw`]: the column contract and string-cell rows
//! - [`normalize`]: per-row validation and cleaning with explicit rejections
//! - [`haplogroup`]: hierarchical haplogroup labels and their ancestors
//! - [`sample`]: the canonical sample record and the two [`Lineage`]s
//!
//! Everything here is pure and deterministic; file access lives in the CLI.

pub use self::{
    haplogroup::{Haplogroup, InvalidHaplogroup},
    normalize::{NormalizeConfig, NormalizedSamples, Normalizer, RejectionCounts, RowRejection},
    raw::{Column, ColumnIndex, MissingColumns, RawRecord},
    sample::{Coordinates, Lineage, Sample, SampleId},
};

pub mod haplogroup;
pub mod normalize;
pub mod raw;
pub mod sample;
