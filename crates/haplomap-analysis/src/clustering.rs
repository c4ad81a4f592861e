//! Spatial clustering of one lineage
//!
//! Samples that carry a haplogroup for the lineage are grouped on
//! `(latitude, longitude)` with weighted k-means. The fit runs over the
//! distinct sample sites, each weighted by its number of samples, so that
//! samples found at one site always share a cluster.
//!
//! Centroids are recomputed as the arithmetic mean of the member samples'
//! coordinates. Cluster indices follow the first appearance of a member in the
//! input order.
//!
//! # Examples
//!
//! ```
//! use haplomap_analysis::clustering::cluster_lineage;
//! use haplomap_core::{Coordinates, Haplogroup, Lineage, Sample};
//! use haplomap_stats::kmeans::KMeans;
//!
//! let sample = |id: &str, latitude: f64, longitude: f64, y: &str| Sample {
//!     id: id.to_owned(),
//!     coordinates: Coordinates { latitude, longitude },
//!     date_bp: None,
//!     haplogroup_y: Haplogroup::parse(y),
//!     haplogroup_mt: None,
//!     country: None,
//! };
//! let samples = [
//!     sample("a", 50.0, 10.0, "R1b"),
//!     sample("b", 50.0, 10.0, "I2"),
//!     sample("c", -30.0, 120.0, "C1"),
//!     sample("d", 0.0, 0.0, ".."),
//! ];
//!
//! let clustering = cluster_lineage(&samples, Lineage::Y, &KMeans::new(150));
//! assert_eq!(clustering.k_effective(), 2);
//! assert_eq!(clustering.assignments, [Some(0), Some(0), Some(1), None]);
//! ```

use std::collections::HashMap;

use haplomap_core::{Coordinates, Lineage, Sample};
use haplomap_stats::kmeans::KMeans;
use serde::{Deserialize, Serialize};

/// One spatial group of samples for a lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Position of the cluster in [`LineageClustering::clusters`]
    pub index: usize,
    /// Mean coordinates of the members
    pub centroid: Coordinates,
    /// Indices of the member samples, in input order
    pub members: Vec<usize>,
}

/// Result of [`cluster_lineage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageClustering {
    pub lineage: Lineage,
    /// Number of clusters that was asked for
    pub requested: usize,
    /// Cluster of every input sample, `None` for samples without a label for
    /// this lineage
    pub assignments: Vec<Option<usize>>,
    pub clusters: Vec<Cluster>,
    /// Number of distinct sites the fit ran over
    pub sites: usize,
}

impl LineageClustering {
    /// Number of clusters actually produced, at most `min(requested, sites)`.
    #[must_use]
    pub fn k_effective(&self) -> usize {
        self.clusters.len()
    }

    /// Number of samples that took part in the clustering.
    #[must_use]
    pub fn eligible(&self) -> usize {
        self.assignments.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Clusters the samples that carry a haplogroup for `lineage`.
///
/// `kmeans.k` is clamped to the number of distinct sites; no eligible samples
/// yields an empty clustering.
#[must_use]
pub fn cluster_lineage(samples: &[Sample], lineage: Lineage, kmeans: &KMeans) -> LineageClustering {
    let mut site_index = HashMap::new();
    let mut points = vec![];
    let mut weights: Vec<f64> = vec![];
    let mut sample_sites = vec![None; samples.len()];

    for (i, sample) in samples.iter().enumerate() {
        if sample.haplogroup(lineage).is_none() {
            continue;
        }
        let site = *site_index
            .entry(sample.coordinates.site_key())
            .or_insert_with(|| {
                points.push(sample.coordinates.to_point());
                weights.push(0.0);
                points.len() - 1
            });
        weights[site] += 1.0;
        sample_sites[i] = Some(site);
    }

    let fit = kmeans.fit(&points, &weights);
    log::debug!(
        "{lineage}: {} samples at {} sites into {} clusters (requested {}, inertia {:.3}, {} iterations)",
        sample_sites.iter().flatten().count(),
        points.len(),
        fit.num_clusters(),
        kmeans.k,
        fit.inertia,
        fit.iterations,
    );

    let assignments: Vec<Option<usize>> = sample_sites
        .iter()
        .map(|site| site.map(|site| fit.labels[site]))
        .collect();

    let mut members = vec![Vec::new(); fit.num_clusters()];
    for (i, cluster) in assignments.iter().enumerate() {
        if let Some(cluster) = cluster {
            members[*cluster].push(i);
        }
    }
    let clusters = members
        .into_iter()
        .enumerate()
        .map(|(index, members)| Cluster {
            index,
            centroid: mean_coordinates(samples, &members),
            members,
        })
        .collect();

    LineageClustering {
        lineage,
        requested: kmeans.k,
        assignments,
        clusters,
        sites: points.len(),
    }
}

#[expect(clippy::cast_precision_loss)]
fn mean_coordinates(samples: &[Sample], members: &[usize]) -> Coordinates {
    let n = members.len() as f64;
    let (latitude, longitude) = members.iter().fold((0.0, 0.0), |(lat, long), &i| {
        let coordinates = samples[i].coordinates;
        (lat + coordinates.latitude, long + coordinates.longitude)
    });
    Coordinates {
        latitude: latitude / n,
        longitude: longitude / n,
    }
}

#[cfg(test)]
mod tests {
    use haplomap_core::Haplogroup;

    use super::*;

    fn sample(latitude: f64, longitude: f64, y: Option<&str>, mt: Option<&str>) -> Sample {
        Sample {
            id: format!("{latitude}/{longitude}"),
            coordinates: Coordinates {
                latitude,
                longitude,
            },
            date_bp: Some(1500.0),
            haplogroup_y: y.and_then(Haplogroup::parse),
            haplogroup_mt: mt.and_then(Haplogroup::parse),
            country: None,
        }
    }

    fn blobs() -> Vec<Sample> {
        let mut samples = vec![];
        for i in 0..5 {
            let offset = f64::from(i) * 0.1;
            samples.push(sample(40.0 + offset, 10.0, Some("R1b"), Some("H1")));
            samples.push(sample(-20.0, 130.0 + offset, Some("C1"), None));
            samples.push(sample(60.0, -100.0 + offset, None, Some("A2")));
        }
        samples
    }

    #[test]
    fn test_every_eligible_sample_gets_one_cluster() {
        let samples = blobs();
        for lineage in Lineage::ALL {
            let clustering = cluster_lineage(&samples, lineage, &KMeans::new(3));
            for (sample, cluster) in samples.iter().zip(&clustering.assignments) {
                assert_eq!(sample.haplogroup(lineage).is_some(), cluster.is_some());
                if let Some(cluster) = cluster {
                    assert!(*cluster < clustering.k_effective());
                }
            }
            let members: usize = clustering.clusters.iter().map(|c| c.members.len()).sum();
            assert_eq!(members, clustering.eligible());
        }
    }

    #[test]
    fn test_separated_groups_are_found() {
        let samples = blobs();
        let clustering = cluster_lineage(&samples, Lineage::Y, &KMeans::new(2));
        assert_eq!(clustering.k_effective(), 2);
        // Y samples alternate between the European and the Australian group.
        assert_eq!(clustering.assignments[0], Some(0));
        assert_eq!(clustering.assignments[1], Some(1));
        assert_eq!(clustering.assignments[3], Some(0));
        assert_eq!(clustering.assignments[2], None);
    }

    #[test]
    fn test_k_is_clamped_to_sites() {
        let samples = blobs();
        let clustering = cluster_lineage(&samples, Lineage::Mt, &KMeans::new(350));
        assert_eq!(clustering.eligible(), 10);
        assert_eq!(clustering.sites, 10);
        assert!(clustering.k_effective() <= 10);
        assert_eq!(clustering.requested, 350);
    }

    #[test]
    fn test_shared_site_shares_cluster() {
        let samples = vec![
            sample(1.0, 1.0, Some("R1"), None),
            sample(5.0, 5.0, Some("R1"), None),
            sample(1.0, 1.0, Some("I1"), None),
        ];
        let clustering = cluster_lineage(&samples, Lineage::Y, &KMeans::new(5));
        assert_eq!(clustering.sites, 2);
        assert_eq!(clustering.k_effective(), 2);
        assert_eq!(clustering.assignments[0], clustering.assignments[2]);
    }

    #[test]
    fn test_centroid_is_member_mean() {
        let samples = vec![
            sample(0.0, 0.0, Some("R1"), None),
            sample(0.0, 0.0, Some("R1"), None),
            sample(3.0, 3.0, Some("R1"), None),
        ];
        let clustering = cluster_lineage(&samples, Lineage::Y, &KMeans::new(1));
        let centroid = clustering.clusters[0].centroid;
        assert!((centroid.latitude - 1.0).abs() < 1e-12);
        assert!((centroid.longitude - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_eligible_samples() {
        let samples = vec![sample(0.0, 0.0, None, Some("H"))];
        let clustering = cluster_lineage(&samples, Lineage::Y, &KMeans::new(150));
        assert!(clustering.is_empty());
        assert_eq!(clustering.assignments, [None]);
    }
}
