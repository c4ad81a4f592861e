//! Clustering and frequency aggregation for the haplogroup map
//!
//! This crate turns normalized samples into the data behind the map: spatial
//! clusters per lineage and nested haplogroup counts per cluster and time bin.
//!
//! # Overview
//!
//! The Y and mtDNA lineages are processed independently; a sample takes part
//! in each lineage for which it carries a haplogroup.
//!
//! 1. **Normalize** ([`haplomap_core::Normalizer`]): validate raw rows
//! 2. **Bin** ([`haplomap_stats::binning::TimeBins`]): assign each dated
//!    sample to one half-open time bin
//! 3. **Cluster** ([`clustering::cluster_lineage`]): seeded weighted k-means
//!    over the distinct sample sites
//! 4. **Aggregate** ([`aggregate::aggregate_cluster`]): exact and ancestor
//!    rollup counts ([`frequency::FrequencyTable`]) for all time and per bin
//! 5. **Report** ([`report::MapData`]): markers, legends and chart payloads
//!
//! [`pipeline::Pipeline`] runs all steps with one validated
//! [`pipeline::PipelineConfig`].
//!
//! # Determinism
//!
//! With identical input and configuration, a run produces identical cluster
//! assignments and tables. The only varying field of [`report::MapData`] is
//! its generation timestamp.
//!
//! # Examples
//!
//! ```
//! use haplomap_analysis::pipeline::{Pipeline, PipelineConfig};
//! use haplomap_core::{Column, Lineage, RawRecord};
//!
//! let config = PipelineConfig {
//!     cluster_y: 2,
//!     cluster_mt: 2,
//!     ..PipelineConfig::default()
//! };
//! let pipeline = Pipeline::new(config)?;
//!
//! let row = |row, lat: &str, long: &str, y: &str| {
//!     RawRecord::new(row)
//!         .with(Column::Latitude, lat)
//!         .with(Column::Longitude, long)
//!         .with(Column::DateMeanBp, "4200")
//!         .with(Column::HaplogroupY, y)
//!         .with(Column::HaplogroupMt, "..")
//! };
//! let records = [
//!     row(1, "48.1", "11.5", "R1b1a2"),
//!     row(2, "48.2", "11.6", "R1b"),
//!     row(3, "35.0", "105.0", "O2a"),
//! ];
//!
//! let data = pipeline.run(&records);
//! let y = data.layer(Lineage::Y).unwrap();
//! assert_eq!(y.markers.len(), 2);
//! assert!(data.layer(Lineage::Mt).unwrap().is_empty());
//!
//! let europe = &y.markers[0];
//! assert_eq!(europe.summary.individuals, 2);
//! assert_eq!(europe.all_time.sunburst.ids[..3], ["R", "R1", "R1b"]);
//! assert_eq!(europe.all_time.sunburst.values[..3], [2, 2, 2]);
//! # Ok::<(), haplomap_analysis::pipeline::ConfigError>(())
//! ```

pub mod aggregate;
pub mod clustering;
pub mod frequency;
pub mod pipeline;
pub mod report;
pub mod summary;
