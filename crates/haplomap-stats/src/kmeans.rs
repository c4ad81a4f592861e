//! Weighted k-means clustering with reproducible seeding
//!
//! Points are grouped into at most `k` clusters by Lloyd's algorithm. Initial
//! centroids are chosen with k-means++ (probability proportional to weight
//! times squared distance to the nearest chosen centroid), the whole fit is
//! repeated `n_init` times, and the run with the lowest inertia wins.
//!
//! All randomness comes from a [`Pcg32`] seeded from [`KMeans::seed`], so the
//! same points, weights, `k` and seed always produce the same labels.
//!
//! # Weights
//!
//! Each point carries a non-negative weight. A point with weight `w` behaves
//! like `w` coincident points: centroids are weighted means and the inertia is
//! the weighted sum of squared distances.
//!
//! # Examples
//!
//! ```
//! use haplomap_stats::kmeans::KMeans;
//!
//! let points = [[0.0, 0.0], [0.1, 0.0], [10.0, 10.0], [10.1, 10.0]];
//! let weights = [1.0; 4];
//! let fit = KMeans::new(2).with_seed(42).fit(&points, &weights);
//!
//! assert_eq!(fit.labels[0], fit.labels[1]);
//! assert_eq!(fit.labels[2], fit.labels[3]);
//! assert_ne!(fit.labels[0], fit.labels[2]);
//! ```

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;

/// Parameters of a k-means fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    /// Requested number of clusters
    pub k: usize,
    /// Seed for centroid initialization
    pub seed: u64,
    /// Number of independent initializations; the best one is kept
    pub n_init: usize,
    /// Maximum number of Lloyd iterations per initialization
    pub max_iter: usize,
    /// Relative tolerance on centroid movement used to declare convergence
    pub tolerance: f64,
}

/// Result of [`KMeans::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit<const D: usize> {
    /// Cluster label of every input point, in `0..centroids.len()`
    pub labels: Vec<usize>,
    /// Weighted mean of the points in each cluster
    pub centroids: Vec<[f64; D]>,
    /// Weighted sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Lloyd iterations used by the winning initialization
    pub iterations: usize,
}

impl<const D: usize> KMeansFit<D> {
    fn empty() -> Self {
        Self {
            labels: vec![],
            centroids: vec![],
            inertia: 0.0,
            iterations: 0,
        }
    }

    /// Number of non-empty clusters.
    #[must_use]
    pub fn num_clusters(&self) -> usize {
        self.centroids.len()
    }
}

impl KMeans {
    pub const DEFAULT_SEED: u64 = 42;
    pub const DEFAULT_N_INIT: usize = 10;
    pub const DEFAULT_MAX_ITER: usize = 300;
    pub const DEFAULT_TOLERANCE: f64 = 1e-4;

    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            seed: Self::DEFAULT_SEED,
            n_init: Self::DEFAULT_N_INIT,
            max_iter: Self::DEFAULT_MAX_ITER,
            tolerance: Self::DEFAULT_TOLERANCE,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Clusters `points`, each weighted by the matching entry of `weights`.
    ///
    /// At most `min(k, points.len())` clusters are produced. Coincident points
    /// can leave fewer non-empty clusters; labels are always compacted to
    /// `0..fit.num_clusters()` and numbered by first appearance in `points`.
    ///
    /// Returns an empty fit when `points` is empty or `k` is zero.
    ///
    /// # Panics
    ///
    /// Panics if `points` and `weights` have different lengths, or if a
    /// weight is negative or not finite.
    #[must_use]
    pub fn fit<const D: usize>(&self, points: &[[f64; D]], weights: &[f64]) -> KMeansFit<D> {
        assert_eq!(
            points.len(),
            weights.len(),
            "every point needs exactly one weight"
        );
        assert!(
            weights.iter().all(|w| w.is_finite() && *w >= 0.0),
            "weights must be finite and non-negative"
        );

        let k = self.k.min(points.len());
        if k == 0 {
            return KMeansFit::empty();
        }

        let tolerance = self.tolerance * mean_variance(points, weights);
        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit<D>> = None;
        for _ in 0..self.n_init.max(1) {
            let centroids = init_plus_plus(points, weights, k, &mut rng);
            let fit = lloyd(points, weights, centroids, self.max_iter, tolerance);
            if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        let Some(best) = best else {
            return KMeansFit::empty();
        };
        compact_labels(best)
    }
}

fn squared_distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest<const D: usize>(point: &[f64; D], centroids: &[[f64; D]]) -> (usize, f64) {
    centroids
        .iter()
        .map(|c| squared_distance(point, c))
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, d)| {
            if d < best.1 { (i, d) } else { best }
        })
}

/// Weighted mean of the per-dimension variances, used to scale the tolerance.
fn mean_variance<const D: usize>(points: &[[f64; D]], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || D == 0 {
        return 0.0;
    }
    let mut variance_sum = 0.0;
    for dim in 0..D {
        let mean = points
            .iter()
            .zip(weights)
            .map(|(p, w)| p[dim] * w)
            .sum::<f64>()
            / total;
        variance_sum += points
            .iter()
            .zip(weights)
            .map(|(p, w)| (p[dim] - mean).powi(2) * w)
            .sum::<f64>()
            / total;
    }
    #[expect(clippy::cast_precision_loss)]
    let dims = D as f64;
    variance_sum / dims
}

/// Picks an index with probability proportional to `scores`.
///
/// Returns `None` when every score is zero.
fn sample_weighted<R>(scores: &[f64], rng: &mut R) -> Option<usize>
where
    R: Rng,
{
    let total: f64 = scores.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let threshold = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (i, &score) in scores.iter().enumerate() {
        if score <= 0.0 {
            continue;
        }
        cumulative += score;
        last_positive = Some(i);
        if cumulative > threshold {
            return Some(i);
        }
    }
    // Rounding can leave the threshold just above the final cumulative sum.
    last_positive
}

fn init_plus_plus<const D: usize, R>(
    points: &[[f64; D]],
    weights: &[f64],
    k: usize,
    rng: &mut R,
) -> Vec<[f64; D]>
where
    R: Rng,
{
    let mut chosen = vec![false; points.len()];
    let first = sample_weighted(weights, rng).unwrap_or_else(|| rng.random_range(0..points.len()));
    chosen[first] = true;
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[first]);

    let mut min_distances: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let scores: Vec<f64> = min_distances
            .iter()
            .zip(weights)
            .map(|(d, w)| d * w)
            .collect();
        // All remaining mass sits on existing centroids; fall back to the
        // first point not used yet.
        let next = sample_weighted(&scores, rng)
            .or_else(|| chosen.iter().position(|used| !used))
            .unwrap_or(0);
        chosen[next] = true;
        let centroid = points[next];
        for (dist, point) in min_distances.iter_mut().zip(points) {
            *dist = dist.min(squared_distance(point, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn assign<const D: usize>(
    points: &[[f64; D]],
    weights: &[f64],
    centroids: &[[f64; D]],
    labels: &mut [usize],
) -> f64 {
    let mut inertia = 0.0;
    for ((point, weight), label) in points.iter().zip(weights).zip(labels.iter_mut()) {
        let (index, distance) = nearest(point, centroids);
        *label = index;
        inertia += distance * weight;
    }
    inertia
}

fn lloyd<const D: usize>(
    points: &[[f64; D]],
    weights: &[f64],
    mut centroids: Vec<[f64; D]>,
    max_iter: usize,
    tolerance: f64,
) -> KMeansFit<D> {
    let k = centroids.len();
    let mut labels = vec![0; points.len()];
    let mut iterations = 0;

    for _ in 0..max_iter.max(1) {
        iterations += 1;
        assign(points, weights, &centroids, &mut labels);

        let mut sums = vec![[0.0; D]; k];
        let mut totals = vec![0.0; k];
        for ((point, weight), &label) in points.iter().zip(weights).zip(&labels) {
            totals[label] += weight;
            for (sum, value) in sums[label].iter_mut().zip(point) {
                *sum += value * weight;
            }
        }

        let mut new_centroids = centroids.clone();
        for (cluster, centroid) in new_centroids.iter_mut().enumerate() {
            if totals[cluster] > 0.0 {
                for (value, sum) in centroid.iter_mut().zip(&sums[cluster]) {
                    *value = sum / totals[cluster];
                }
            }
        }
        reseed_empty_clusters(points, weights, &labels, &totals, &mut new_centroids);

        let shift: f64 = centroids
            .iter()
            .zip(&new_centroids)
            .map(|(old, new)| squared_distance(old, new))
            .sum();
        centroids = new_centroids;
        if shift <= tolerance {
            break;
        }
    }

    let inertia = assign(points, weights, &centroids, &mut labels);
    KMeansFit {
        labels,
        centroids,
        inertia,
        iterations,
    }
}

/// Moves each empty cluster onto the point that is currently worst served.
fn reseed_empty_clusters<const D: usize>(
    points: &[[f64; D]],
    weights: &[f64],
    labels: &[usize],
    totals: &[f64],
    centroids: &mut [[f64; D]],
) {
    let mut taken = vec![false; points.len()];
    for cluster in 0..centroids.len() {
        if totals[cluster] > 0.0 {
            continue;
        }
        let farthest = points
            .iter()
            .zip(weights)
            .zip(labels)
            .enumerate()
            .filter(|(i, _)| !taken[*i])
            .map(|(i, ((point, weight), &label))| {
                (i, squared_distance(point, &centroids[label]) * weight)
            })
            .filter(|(_, cost)| *cost > 0.0)
            .fold(None::<(usize, f64)>, |best, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            });
        if let Some((index, _)) = farthest {
            taken[index] = true;
            centroids[cluster] = points[index];
        }
    }
}

/// Drops empty clusters and renumbers labels by first appearance.
fn compact_labels<const D: usize>(fit: KMeansFit<D>) -> KMeansFit<D> {
    let mut remap = vec![None; fit.centroids.len()];
    let mut centroids = Vec::new();
    let labels = fit
        .labels
        .iter()
        .map(|&label| {
            *remap[label].get_or_insert_with(|| {
                centroids.push(fit.centroids[label]);
                centroids.len() - 1
            })
        })
        .collect();
    KMeansFit {
        labels,
        centroids,
        inertia: fit.inertia,
        iterations: fit.iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<[f64; 2]> {
        let mut points = Vec::new();
        for (cx, cy) in [(0.0, 0.0), (40.0, 10.0), (-20.0, 60.0)] {
            for i in 0..5 {
                let offset = f64::from(i) * 0.1;
                points.push([cx + offset, cy - offset]);
            }
        }
        points
    }

    #[test]
    fn test_empty_input() {
        let fit = KMeans::new(3).fit::<2>(&[], &[]);
        assert!(fit.labels.is_empty());
        assert_eq!(fit.num_clusters(), 0);
    }

    #[test]
    fn test_zero_k() {
        let fit = KMeans::new(0).fit(&[[1.0, 2.0]], &[1.0]);
        assert!(fit.labels.is_empty());
    }

    #[test]
    fn test_separates_blobs() {
        let points = blobs();
        let weights = vec![1.0; points.len()];
        let fit = KMeans::new(3).fit(&points, &weights);

        assert_eq!(fit.num_clusters(), 3);
        for blob in fit.labels.chunks(5) {
            assert!(blob.iter().all(|&label| label == blob[0]));
        }
        assert_ne!(fit.labels[0], fit.labels[5]);
        assert_ne!(fit.labels[5], fit.labels[10]);
        assert_ne!(fit.labels[0], fit.labels[10]);
    }

    #[test]
    fn test_labels_numbered_by_first_appearance() {
        let points = blobs();
        let weights = vec![1.0; points.len()];
        let fit = KMeans::new(3).fit(&points, &weights);
        assert_eq!(fit.labels[0], 0);
        assert_eq!(fit.labels[5], 1);
        assert_eq!(fit.labels[10], 2);
    }

    #[test]
    fn test_same_seed_same_result() {
        let points = blobs();
        let weights = vec![1.0; points.len()];
        let a = KMeans::new(4).with_seed(7).fit(&points, &weights);
        let b = KMeans::new(4).with_seed(7).fit(&points, &weights);
        assert_eq!(a, b);
    }

    #[test]
    fn test_k_clamped_to_point_count() {
        let points = [[0.0, 0.0], [5.0, 5.0], [10.0, 0.0]];
        let fit = KMeans::new(10).fit(&points, &[1.0; 3]);
        assert_eq!(fit.num_clusters(), 3);
        let mut labels = fit.labels.clone();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2]);
        assert!(fit.inertia.abs() < 1e-12);
    }

    #[test]
    fn test_weighted_centroid() {
        let points = [[0.0, 0.0], [3.0, 0.0]];
        let fit = KMeans::new(1).fit(&points, &[2.0, 1.0]);
        assert_eq!(fit.labels, vec![0, 0]);
        assert!((fit.centroids[0][0] - 1.0).abs() < 1e-12);
        assert!(fit.centroids[0][1].abs() < 1e-12);
    }

    #[test]
    fn test_coincident_points_leave_fewer_clusters() {
        let points = [[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let fit = KMeans::new(3).fit(&points, &[1.0; 3]);
        assert_eq!(fit.labels, vec![0, 0, 0]);
        assert_eq!(fit.num_clusters(), 1);
    }

    #[test]
    fn test_labels_within_cluster_range() {
        let points: Vec<[f64; 2]> = (0..40)
            .map(|i| {
                let x = f64::from(i);
                [x.sin() * 50.0, (x * 0.7).cos() * 120.0]
            })
            .collect();
        let weights = vec![1.0; points.len()];
        let fit = KMeans::new(7).fit(&points, &weights);
        assert!(fit.num_clusters() <= 7);
        assert!(fit.labels.iter().all(|&l| l < fit.num_clusters()));
    }

    #[test]
    #[should_panic(expected = "every point needs exactly one weight")]
    fn test_weight_length_mismatch_panics() {
        let _ = KMeans::new(1).fit(&[[0.0, 0.0]], &[]);
    }
}
