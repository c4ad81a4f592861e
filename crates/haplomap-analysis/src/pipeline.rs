//! End-to-end batch run
//!
//! ```text
//! raw rows → normalize → bin → cluster (Y, mtDNA) → aggregate → MapData
//! ```
//!
//! All tunables live in [`PipelineConfig`], which is validated as a whole by
//! [`Pipeline::new`] before any input is touched.

use chrono::Utc;
use haplomap_core::{Lineage, NormalizeConfig, NormalizedSamples, Normalizer, RawRecord};
use haplomap_stats::{
    binning::{BinEdgesError, TimeBins},
    descriptive::DescriptiveStats,
    kmeans::KMeans,
};
use serde::{Deserialize, Serialize};

use crate::{
    clustering,
    report::{BinReport, InputSummary, LineageLayer, MapData},
};

/// Tunables of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Requested number of Y clusters
    pub cluster_y: usize,
    /// Requested number of mtDNA clusters
    pub cluster_mt: usize,
    /// Seed of the k-means initialization
    pub seed: u64,
    /// Time bin edges in years BP, strictly increasing
    pub bin_edges: Vec<f64>,
    pub normalize: NormalizeConfig,
}

impl PipelineConfig {
    pub const DEFAULT_CLUSTER_Y: usize = 150;
    pub const DEFAULT_CLUSTER_MT: usize = 350;

    #[must_use]
    pub fn cluster_count(&self, lineage: Lineage) -> usize {
        match lineage {
            Lineage::Y => self.cluster_y,
            Lineage::Mt => self.cluster_mt,
        }
    }

    /// Checks every setting and builds the time bins.
    pub fn validate(&self) -> Result<TimeBins, ConfigError> {
        for lineage in Lineage::ALL {
            let count = self.cluster_count(lineage);
            if count == 0 {
                return Err(ConfigError::ClusterCountInvalid { lineage, count });
            }
        }
        TimeBins::new(self.bin_edges.clone()).map_err(ConfigError::BinEdges)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster_y: Self::DEFAULT_CLUSTER_Y,
            cluster_mt: Self::DEFAULT_CLUSTER_MT,
            seed: KMeans::DEFAULT_SEED,
            bin_edges: TimeBins::DEFAULT_EDGES.to_vec(),
            normalize: NormalizeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("number of {lineage} clusters must be at least 1, got {count}")]
    ClusterCountInvalid { lineage: Lineage, count: usize },
    #[display("invalid time bins: {_0}")]
    BinEdges(BinEdgesError),
}

/// A validated run configuration.
///
/// # Examples
///
/// ```
/// use haplomap_analysis::pipeline::{ConfigError, Pipeline, PipelineConfig};
/// use haplomap_core::{Column, Lineage, RawRecord};
///
/// let config = PipelineConfig { cluster_y: 0, ..PipelineConfig::default() };
/// assert!(matches!(
///     Pipeline::new(config),
///     Err(ConfigError::ClusterCountInvalid { lineage: Lineage::Y, count: 0 })
/// ));
///
/// let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
/// let records = [RawRecord::new(1)
///     .with(Column::Latitude, "51.5")
///     .with(Column::Longitude, "-0.1")
///     .with(Column::DateMeanBp, "1500")
///     .with(Column::HaplogroupY, "R1b1a2")
///     .with(Column::HaplogroupMt, "H1")];
///
/// let data = pipeline.run(&records);
/// assert_eq!(data.input.accepted, 1);
/// assert_eq!(data.layer(Lineage::Y).unwrap().markers.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    bins: TimeBins,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let bins = config.validate()?;
        Ok(Self { config, bins })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn bins(&self) -> &TimeBins {
        &self.bins
    }

    /// Normalizes the rows and computes the map data.
    #[must_use]
    pub fn run(&self, records: &[RawRecord]) -> MapData {
        let normalized = Normalizer::new(self.config.normalize).normalize_all(records);
        self.analyze(records.len(), &normalized)
    }

    /// Bins, clusters and aggregates already normalized samples.
    #[must_use]
    pub fn analyze(&self, rows: usize, normalized: &NormalizedSamples) -> MapData {
        let samples = &normalized.samples;
        log::info!(
            "{} of {rows} rows accepted, {} rejected",
            samples.len(),
            normalized.rejected()
        );
        for (reason, count) in normalized.rejections.iter() {
            log::info!("  {count} rows rejected: {reason}");
        }
        if let Some(stats) = DescriptiveStats::new(samples.iter().filter_map(|s| s.date_bp)) {
            log::info!(
                "{} dated samples, {:.0}-{:.0} BP (median {:.0})",
                stats.count,
                stats.min,
                stats.max,
                stats.median
            );
        }

        let sample_bins: Vec<Option<usize>> = samples
            .iter()
            .map(|sample| self.bins.assign_opt(sample.date_bp))
            .collect();
        let counts = self.bins.count(samples.iter().map(|sample| sample.date_bp));
        for bin in self.bins.iter() {
            log::debug!("{} BP: {} samples", bin.label(), counts.per_bin[bin.index]);
        }
        if counts.unbinned > 0 {
            log::info!(
                "{} samples have no date in {:?} BP and only appear in the all-time view",
                counts.unbinned,
                self.bins.range()
            );
        }

        let layers = Lineage::ALL
            .into_iter()
            .map(|lineage| {
                let kmeans = KMeans::new(self.config.cluster_count(lineage)).with_seed(self.config.seed);
                let clustering = clustering::cluster_lineage(samples, lineage, &kmeans);
                if clustering.is_empty() {
                    log::warn!("no samples with a {lineage} haplogroup, the {lineage} layer is empty");
                } else {
                    log::info!(
                        "{lineage}: {} samples in {} clusters",
                        clustering.eligible(),
                        clustering.k_effective()
                    );
                }
                LineageLayer::new(samples, &clustering, &sample_bins, &self.bins)
            })
            .collect();

        MapData {
            generated_at: Utc::now(),
            config: self.config.clone(),
            input: InputSummary {
                rows,
                accepted: samples.len(),
                rejected: normalized.rejections.clone(),
                unbinned: counts.unbinned,
            },
            bins: self
                .bins
                .iter()
                .map(|bin| BinReport::new(bin, counts.per_bin[bin.index]))
                .collect(),
            layers,
        }
    }
}

#[cfg(test)]
mod tests {
    use haplomap_core::{Column, RowRejection};

    use super::*;

    fn record(row: usize, lat: &str, long: &str, date: &str, y: &str, mt: &str) -> RawRecord {
        RawRecord::new(row)
            .with(Column::Latitude, lat)
            .with(Column::Longitude, long)
            .with(Column::DateMeanBp, date)
            .with(Column::HaplogroupY, y)
            .with(Column::HaplogroupMt, mt)
    }

    #[test]
    fn test_validate() {
        assert!(PipelineConfig::default().validate().is_ok());

        let config = PipelineConfig {
            cluster_mt: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::ClusterCountInvalid {
                lineage: Lineage::Mt,
                count: 0
            }
        );

        let config = PipelineConfig {
            bin_edges: vec![0.0, 100.0, 100.0],
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BinEdges(BinEdgesError::NotIncreasing { .. }))
        ));
    }

    #[test]
    fn test_config_json_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"cluster_y": 20}"#).unwrap();
        assert_eq!(config.cluster_y, 20);
        assert_eq!(config.cluster_mt, PipelineConfig::DEFAULT_CLUSTER_MT);
        assert_eq!(config.seed, 42);
        assert!(config.normalize.drop_present_day);
    }

    #[test]
    fn test_run() {
        let records = [
            record(1, "50.0", "10.0", "1000", "R1b", "H1"),
            record(2, "50.0", "10.0", "500", "I2", ".."),
            record(3, "-30.0", "120.0", "..", "..", "M7"),
            record(4, "95.0", "0.0", "100", "R1b", "H"),
            record(5, "10.0", "10.0", "0", "R1b", "H"),
        ];
        let data = Pipeline::new(PipelineConfig::default()).unwrap().run(&records);

        assert_eq!(data.input.rows, 5);
        assert_eq!(data.input.accepted, 3);
        assert_eq!(data.input.rejected.get(RowRejection::InvalidLatitude), 1);
        assert_eq!(data.input.rejected.get(RowRejection::PresentDay), 1);
        assert_eq!(data.input.unbinned, 1);
        assert_eq!(data.bins[0].samples, 1);
        assert_eq!(data.bins[1].samples, 1);

        let y = data.layer(Lineage::Y).unwrap();
        assert_eq!(y.eligible_samples, 2);
        assert_eq!(y.markers.len(), 1);
        let marker = &y.markers[0];
        assert_eq!(marker.all_time.total, 2);
        assert_eq!(marker.summary.tags, ["0-1000", "1000-2000"]);
        assert_eq!(marker.per_bin[0].as_ref().unwrap().exact["I2"], 1);
        assert_eq!(marker.per_bin[1].as_ref().unwrap().exact["R1b"], 1);
        assert!(marker.per_bin[2].is_none());

        let mt = data.layer(Lineage::Mt).unwrap();
        assert_eq!(mt.eligible_samples, 2);
        assert_eq!(mt.markers.len(), 2);
    }

    #[test]
    fn test_empty_lineage() {
        let records = [record(1, "1", "1", "100", "..", "H1")];
        let data = Pipeline::new(PipelineConfig::default()).unwrap().run(&records);
        assert!(data.layer(Lineage::Y).unwrap().is_empty());
        assert!(!data.layer(Lineage::Mt).unwrap().is_empty());
    }
}
