//! Per-cluster frequency tables
//!
//! Every cluster of a lineage gets one [`FrequencyTable`] over all of its
//! members ("all time") and one per time bin. Members without a bin (unknown
//! or out-of-range date) appear only in the all-time table, so the per-bin
//! tables of a cluster plus its unbinned members add up to the all-time table.

use haplomap_core::{Lineage, Sample};

use crate::{clustering::Cluster, frequency::FrequencyTable};

/// Frequency tables of one cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterTables {
    pub all_time: FrequencyTable,
    /// One table per time bin, empty for bins without members
    pub per_bin: Vec<FrequencyTable>,
}

impl ClusterTables {
    /// Number of members counted in any per-bin table.
    #[must_use]
    pub fn binned(&self) -> usize {
        self.per_bin.iter().map(FrequencyTable::total).sum()
    }
}

/// Builds the tables of `cluster`.
///
/// `sample_bins[i]` is the time bin of `samples[i]`; there are `num_bins`
/// bins in total.
#[must_use]
pub fn aggregate_cluster(
    samples: &[Sample],
    lineage: Lineage,
    cluster: &Cluster,
    sample_bins: &[Option<usize>],
    num_bins: usize,
) -> ClusterTables {
    let mut tables = ClusterTables {
        all_time: FrequencyTable::new(),
        per_bin: vec![FrequencyTable::new(); num_bins],
    };
    for &member in &cluster.members {
        let Some(haplogroup) = samples[member].haplogroup(lineage) else {
            continue;
        };
        tables.all_time.add(haplogroup);
        if let Some(bin) = sample_bins[member] {
            tables.per_bin[bin].add(haplogroup);
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use haplomap_core::{Coordinates, Haplogroup};

    use super::*;

    fn sample(y: &str, date_bp: Option<f64>) -> Sample {
        Sample {
            id: y.to_owned(),
            coordinates: Coordinates {
                latitude: 0.0,
                longitude: 0.0,
            },
            date_bp,
            haplogroup_y: Haplogroup::parse(y),
            haplogroup_mt: None,
            country: None,
        }
    }

    #[test]
    fn test_per_bin_tables_add_up_to_all_time() {
        let samples = vec![
            sample("R1b", Some(500.0)),
            sample("R1b1a2", Some(1500.0)),
            sample("I2", None),
            sample("I2a", Some(1000.0)),
        ];
        let sample_bins = [Some(0), Some(1), None, Some(1)];
        let cluster = Cluster {
            index: 0,
            centroid: samples[0].coordinates,
            members: vec![0, 1, 2, 3],
        };
        let tables = aggregate_cluster(&samples, Lineage::Y, &cluster, &sample_bins, 3);

        assert_eq!(tables.all_time.total(), 4);
        assert_eq!(tables.binned(), 3);
        assert_eq!(tables.per_bin[0].total(), 1);
        assert_eq!(tables.per_bin[1].total(), 2);
        assert!(tables.per_bin[2].is_empty());

        let mut merged = FrequencyTable::new();
        for table in &tables.per_bin {
            merged.merge(table);
        }
        merged.add(samples[2].haplogroup_y.as_ref().unwrap());
        assert_eq!(merged, tables.all_time);
    }

    #[test]
    fn test_members_without_label_are_skipped() {
        let samples = vec![sample("R1b", Some(100.0)), sample("..", Some(100.0))];
        let cluster = Cluster {
            index: 0,
            centroid: samples[0].coordinates,
            members: vec![0, 1],
        };
        let tables = aggregate_cluster(&samples, Lineage::Y, &cluster, &[Some(0), Some(0)], 1);
        assert_eq!(tables.all_time.total(), 1);
    }
}
