//! Marker legends
//!
//! A [`ClusterSummary`] holds what a map popup shows next to the chart: where
//! the members were found, how many there are and which period they span. The
//! labels of the bins present double as the marker's filter tags.

use haplomap_core::Sample;
use haplomap_stats::binning::{TimeBin, TimeBins};
use serde::{Deserialize, Serialize};

use crate::clustering::Cluster;

/// Legend of one cluster marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Number of member samples
    pub individuals: usize,
    /// Distinct countries of the members, in first-seen order
    pub countries: Vec<String>,
    /// Indices of the bins holding at least one member, ascending
    pub bins: Vec<usize>,
    /// Labels of [`Self::bins`], used as filter tags
    pub tags: Vec<String>,
    /// `"{first start}-{last end} BP"`, `None` when no member is binned
    pub date_range: Option<String>,
}

impl ClusterSummary {
    /// Summarizes `cluster`; `sample_bins[i]` is the time bin of `samples[i]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use haplomap_analysis::{clustering::Cluster, summary::ClusterSummary};
    /// use haplomap_core::{Coordinates, Sample};
    /// use haplomap_stats::binning::TimeBins;
    ///
    /// let sample = |country: &str| Sample {
    ///     id: country.to_owned(),
    ///     coordinates: Coordinates { latitude: 0.0, longitude: 0.0 },
    ///     date_bp: None,
    ///     haplogroup_y: None,
    ///     haplogroup_mt: None,
    ///     country: Some(country.to_owned()),
    /// };
    /// let samples = [sample("Spain"), sample("France"), sample("Spain")];
    /// let cluster = Cluster {
    ///     index: 0,
    ///     centroid: samples[0].coordinates,
    ///     members: vec![0, 1, 2],
    /// };
    /// let bins = TimeBins::default();
    ///
    /// let summary = ClusterSummary::new(&samples, &cluster, &[Some(4), None, Some(2)], &bins);
    /// assert_eq!(summary.individuals, 3);
    /// assert_eq!(summary.countries, ["Spain", "France"]);
    /// assert_eq!(summary.tags, ["2000-3000", "4000-5000"]);
    /// assert_eq!(summary.date_range.as_deref(), Some("2000-5000 BP"));
    /// ```
    #[must_use]
    pub fn new(
        samples: &[Sample],
        cluster: &Cluster,
        sample_bins: &[Option<usize>],
        bins: &TimeBins,
    ) -> Self {
        let mut countries: Vec<String> = vec![];
        let mut present = vec![false; bins.len()];
        for &member in &cluster.members {
            if let Some(country) = &samples[member].country
                && !countries.contains(country)
            {
                countries.push(country.clone());
            }
            if let Some(bin) = sample_bins[member] {
                present[bin] = true;
            }
        }

        let present_bins: Vec<_> = bins.iter().filter(|bin| present[bin.index]).collect();
        let date_range = match (present_bins.first(), present_bins.last()) {
            (Some(first), Some(last)) => Some(format!("{}-{} BP", first.start, last.end)),
            _ => None,
        };

        Self {
            individuals: cluster.members.len(),
            countries,
            bins: present_bins.iter().map(|bin| bin.index).collect(),
            tags: present_bins.iter().map(TimeBin::label).collect(),
            date_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use haplomap_core::Coordinates;

    use super::*;

    #[test]
    fn test_unbinned_cluster_has_no_range() {
        let samples = [Sample {
            id: "x".to_owned(),
            coordinates: Coordinates {
                latitude: 1.0,
                longitude: 1.0,
            },
            date_bp: None,
            haplogroup_y: None,
            haplogroup_mt: None,
            country: None,
        }];
        let cluster = Cluster {
            index: 0,
            centroid: samples[0].coordinates,
            members: vec![0],
        };
        let summary = ClusterSummary::new(&samples, &cluster, &[None], &TimeBins::default());
        assert!(summary.countries.is_empty());
        assert!(summary.tags.is_empty());
        assert_eq!(summary.date_range, None);
        assert_eq!(summary.individuals, 1);
    }
}
