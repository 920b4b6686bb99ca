//! Mode-seeking clustering for inference-time instance discovery.
//!
//! At inference there is no instance map, so groupings must be discovered
//! from the embedding geometry alone. This module implements mean-shift:
//! every point carries a working position, initialised to the point itself,
//! that is repeatedly moved to the Gaussian-kernel-weighted mean of all
//! *original* points until the largest per-point shift drops below the
//! tolerance or the iteration budget runs out. Points whose converged
//! positions coincide (within a merge radius) form one cluster.
//!
//! Within one iteration the per-point updates are independent; iterations
//! themselves are sequential because each reads the previous positions.
//!
//! The implementation is the naive O(N² · iterations) form. That is adequate
//! for the per-image, per-class point sets this crate processes (hundreds to
//! low thousands of points) and is a known scaling limit beyond that.

use ndarray::{Array2, ArrayView2};
use tracing::warn;

use crate::config::ClusteringConfig;

// ---------------------------------------------------------------------------
// MeanShiftOptions
// ---------------------------------------------------------------------------

/// Tunable parameters of the mean-shift clusterer.
#[derive(Debug, Clone)]
pub struct MeanShiftOptions {
    /// Gaussian kernel bandwidth `h`; weights are `exp(-d² / (2·h²))`.
    pub bandwidth: f64,
    /// Iteration budget. The clusterer always terminates.
    pub max_iterations: usize,
    /// Stop once the largest per-point shift in one iteration is below this.
    pub tolerance: f64,
    /// Converged positions closer than this join the same cluster.
    pub merge_tolerance: f64,
}

impl Default for MeanShiftOptions {
    fn default() -> Self {
        MeanShiftOptions::from_config(&ClusteringConfig::default())
    }
}

impl MeanShiftOptions {
    /// Extract the mean-shift parameters from a [`ClusteringConfig`].
    pub fn from_config(config: &ClusteringConfig) -> Self {
        MeanShiftOptions {
            bandwidth: config.bandwidth,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            merge_tolerance: config.merge_tolerance,
        }
    }
}

// ---------------------------------------------------------------------------
// MeanShiftOutcome
// ---------------------------------------------------------------------------

/// Result of one mean-shift run.
///
/// Cluster ids are consecutive from 0 but their order is arbitrary — it
/// depends on point visitation order, so two runs over permuted input may
/// label the same partition differently. Compare partitions, not ids.
#[derive(Debug, Clone)]
pub struct MeanShiftOutcome {
    /// Cluster id per input point.
    pub labels: Vec<usize>,
    /// Discovered cluster modes, shape `(num_clusters, D)`.
    pub modes: Array2<f32>,
    /// Number of discovered clusters.
    pub num_clusters: usize,
    /// Iterations actually executed.
    pub iterations: usize,
    /// `false` when the iteration budget ran out before the shift dropped
    /// below tolerance. The labels are still a usable best effort.
    pub converged: bool,
}

impl MeanShiftOutcome {
    fn empty(dim: usize) -> Self {
        MeanShiftOutcome {
            labels: Vec::new(),
            modes: Array2::zeros((0, dim)),
            num_clusters: 0,
            iterations: 0,
            converged: true,
        }
    }
}

// ---------------------------------------------------------------------------
// mean_shift
// ---------------------------------------------------------------------------

/// Cluster `points` (shape `(N, D)`) by Gaussian-kernel mean-shift.
///
/// Edge cases: `N == 0` returns an empty outcome; `N == 1` returns a single
/// singleton cluster. A point whose kernel weight sum underflows to zero
/// (isolated far beyond the bandwidth of every other point) keeps its
/// position and ends up as its own singleton cluster.
///
/// Non-convergence within the iteration budget is not an error: a warning
/// is logged and the best-effort positions are grouped as usual.
pub fn mean_shift(points: ArrayView2<f32>, options: &MeanShiftOptions) -> MeanShiftOutcome {
    let (n, dim) = points.dim();
    if n == 0 {
        return MeanShiftOutcome::empty(dim);
    }

    // Working positions in f64; the original points stay fixed as the
    // kernel density samples.
    let mut positions: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..dim).map(|d| points[[i, d]] as f64).collect())
        .collect();

    let two_bw_sq = 2.0 * options.bandwidth * options.bandwidth;
    let mut iterations = 0usize;
    let mut converged = false;

    while iterations < options.max_iterations {
        iterations += 1;
        let mut max_shift = 0.0f64;

        let previous = positions.clone();
        for (i, position) in positions.iter_mut().enumerate() {
            let mut weight_sum = 0.0f64;
            let mut weighted = vec![0.0f64; dim];

            for j in 0..n {
                let mut dist_sq = 0.0f64;
                for (d, p) in previous[i].iter().enumerate() {
                    let diff = p - points[[j, d]] as f64;
                    dist_sq += diff * diff;
                }
                let w = (-dist_sq / two_bw_sq).exp();
                weight_sum += w;
                for (d, acc) in weighted.iter_mut().enumerate() {
                    *acc += w * points[[j, d]] as f64;
                }
            }

            // Degenerate neighbourhood: every kernel weight underflowed.
            // The point stays put and becomes its own singleton cluster.
            if weight_sum <= f64::MIN_POSITIVE {
                continue;
            }

            let mut shift_sq = 0.0f64;
            for d in 0..dim {
                let updated = weighted[d] / weight_sum;
                let diff = updated - position[d];
                shift_sq += diff * diff;
                position[d] = updated;
            }
            max_shift = max_shift.max(shift_sq.sqrt());
        }

        if max_shift < options.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            iterations,
            max_iterations = options.max_iterations,
            "mean-shift exhausted its iteration budget; grouping best-effort positions"
        );
    }

    let (labels, modes, num_clusters) = group_modes(&positions, dim, options.merge_tolerance);

    MeanShiftOutcome {
        labels,
        modes,
        num_clusters,
        iterations,
        converged,
    }
}

/// Assign a consecutive cluster id to each converged position, merging
/// positions within `merge_tolerance` of an already discovered mode.
fn group_modes(
    positions: &[Vec<f64>],
    dim: usize,
    merge_tolerance: f64,
) -> (Vec<usize>, Array2<f32>, usize) {
    let mut modes: Vec<Vec<f64>> = Vec::new();
    let mut labels = Vec::with_capacity(positions.len());

    for position in positions {
        let found = modes.iter().position(|mode| {
            let dist_sq: f64 = mode
                .iter()
                .zip(position)
                .map(|(m, p)| (m - p) * (m - p))
                .sum();
            dist_sq.sqrt() < merge_tolerance
        });
        match found {
            Some(id) => labels.push(id),
            None => {
                labels.push(modes.len());
                modes.push(position.clone());
            }
        }
    }

    let num_clusters = modes.len();
    let mut mode_array = Array2::<f32>::zeros((num_clusters, dim));
    for (id, mode) in modes.iter().enumerate() {
        for d in 0..dim {
            mode_array[[id, d]] = mode[d] as f32;
        }
    }

    (labels, mode_array, num_clusters)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
