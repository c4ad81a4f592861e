//! Numeric building blocks for the haplogroup map pipeline.
//!
//! This crate has no knowledge of samples or haplogroups. It provides:
//!
//! - **Time binning**: fixed, half-open date ranges used by the map filter
//! - **Clustering**: weighted k-means with reproducible seeding
//! - **Descriptive statistics**: min, max, mean, median and spread of a dataset
//!
//! # Modules
//!
//! - [`binning`]: Fixed-boundary bins with lower-inclusive, upper-exclusive intervals
//! - [`kmeans`]: Weighted k-means++ / Lloyd clustering on fixed-dimension points
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//!
//! # Examples
//!
//! ## Assigning dates to bins
//!
//! ```
//! use haplomap_stats::binning::TimeBins;
//!
//! let bins = TimeBins::default();
//! assert_eq!(bins.assign(1000.0), Some(1));
//! assert_eq!(bins.assign(50000.0), None);
//! ```
//!
//! ## Clustering coordinates
//!
//! ```
//! use haplomap_stats::kmeans::KMeans;
//!
//! let sites = [[51.5, -0.1], [51.6, 0.0], [41.9, 12.5]];
//! let fit = KMeans::new(2).fit(&sites, &[3.0, 1.0, 2.0]);
//! assert_eq!(fit.num_clusters(), 2);
//! assert_eq!(fit.labels[0], fit.labels[1]);
//! ```
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use haplomap_stats::descriptive::DescriptiveStats;
//!
//! let stats = DescriptiveStats::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```

pub mod binning;
pub mod descriptive;
pub mod kmeans;
