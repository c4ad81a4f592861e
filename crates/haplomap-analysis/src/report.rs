//! Precomputed map payload
//!
//! [`MapData`] is everything the map page needs, computed up front: one
//! [`LineageLayer`] per lineage with one [`Marker`] per non-empty cluster, and
//! for every marker the frequency tables of all time and of each time bin.
//! Switching lineage or time range in the page only selects among these
//! tables; nothing is re-clustered.
//!
//! The payload is plain serde data and is embedded verbatim as JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use haplomap_core::{Coordinates, Lineage, RejectionCounts, Sample};
use haplomap_stats::binning::{TimeBin, TimeBins};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate,
    clustering::{Cluster, LineageClustering},
    frequency::{FrequencyTable, Sunburst},
    pipeline::PipelineConfig,
    summary::ClusterSummary,
};

/// The complete output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub generated_at: DateTime<Utc>,
    pub config: PipelineConfig,
    pub input: InputSummary,
    pub bins: Vec<BinReport>,
    pub layers: Vec<LineageLayer>,
}

impl MapData {
    #[must_use]
    pub fn layer(&self, lineage: Lineage) -> Option<&LineageLayer> {
        self.layers.iter().find(|layer| layer.lineage == lineage)
    }
}

/// Row counts of the normalization step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSummary {
    pub rows: usize,
    pub accepted: usize,
    pub rejected: RejectionCounts,
    /// Accepted samples with an unknown or out-of-range date
    pub unbinned: usize,
}

/// One time bin as shown in the time filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinReport {
    pub index: usize,
    pub label: String,
    pub start: f64,
    pub end: f64,
    /// Accepted samples dated within the bin
    pub samples: usize,
}

impl BinReport {
    #[must_use]
    pub fn new(bin: TimeBin, samples: usize) -> Self {
        Self {
            index: bin.index,
            label: bin.label(),
            start: bin.start,
            end: bin.end,
            samples,
        }
    }
}

/// Markers of one lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageLayer {
    pub lineage: Lineage,
    pub requested_clusters: usize,
    /// Samples carrying a haplogroup of this lineage
    pub eligible_samples: usize,
    /// Distinct sample sites that were clustered
    pub sites: usize,
    pub markers: Vec<Marker>,
}

impl LineageLayer {
    /// Builds the markers of a clustered lineage.
    ///
    /// `sample_bins[i]` is the time bin of `samples[i]`.
    #[must_use]
    pub fn new(
        samples: &[Sample],
        clustering: &LineageClustering,
        sample_bins: &[Option<usize>],
        bins: &TimeBins,
    ) -> Self {
        let markers = clustering
            .clusters
            .iter()
            .filter(|cluster| !cluster.members.is_empty())
            .map(|cluster| Marker::new(samples, clustering.lineage, cluster, sample_bins, bins))
            .collect();
        Self {
            lineage: clustering.lineage,
            requested_clusters: clustering.requested,
            eligible_samples: clustering.eligible(),
            sites: clustering.sites,
            markers,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// One cluster on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub cluster: usize,
    pub centroid: Coordinates,
    pub summary: ClusterSummary,
    pub all_time: TableReport,
    /// Table per time bin, `None` where the cluster has no members in the bin
    pub per_bin: Vec<Option<TableReport>>,
}

impl Marker {
    #[must_use]
    pub fn new(
        samples: &[Sample],
        lineage: Lineage,
        cluster: &Cluster,
        sample_bins: &[Option<usize>],
        bins: &TimeBins,
    ) -> Self {
        let tables = aggregate::aggregate_cluster(samples, lineage, cluster, sample_bins, bins.len());
        Self {
            cluster: cluster.index,
            centroid: cluster.centroid,
            summary: ClusterSummary::new(samples, cluster, sample_bins, bins),
            all_time: TableReport::from(&tables.all_time),
            per_bin: tables
                .per_bin
                .iter()
                .map(|table| (!table.is_empty()).then(|| TableReport::from(table)))
                .collect(),
        }
    }
}

/// Serialized form of a [`FrequencyTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub total: usize,
    pub exact: BTreeMap<String, usize>,
    pub sunburst: Sunburst,
}

impl From<&FrequencyTable> for TableReport {
    fn from(table: &FrequencyTable) -> Self {
        Self {
            total: table.total(),
            exact: table.exact_counts().clone(),
            sunburst: table.sunburst(),
        }
    }
}
