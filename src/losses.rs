//! Discriminative grouping loss.
//!
//! This module implements the loss that shapes the embedding space during
//! training. For a set of embeddings partitioned into target clusters it
//! combines three terms:
//!
//! - **Variance term**: a hinged pull of each point towards its own cluster
//!   centroid — points already within `delta_var` of the centroid contribute
//!   nothing.
//! - **Distance term**: a hinged repulsion between every unordered pair of
//!   cluster centroids — pairs further apart than `2·delta_dist` contribute
//!   nothing.
//! - **Regularisation term**: the mean centroid norm, keeping the embedding
//!   space at bounded magnitude.
//!
//! The three scalars are combined with configurable weights:
//!
//! ```text
//! L = w_var · L_var + w_dist · L_dist + w_reg · L_reg
//! ```
//!
//! This is the value path over [`ndarray`] data, used for evaluation,
//! monitoring, and tests. The gradient path over `tch` tensors lives in
//! [`crate::tch_loss`] (feature `tch-backend`) and computes the identical
//! quantity with autograd attached.

use ndarray::ArrayView2;
use std::collections::BTreeMap;

use crate::config::ClusteringConfig;
use crate::error::{InstanceError, InstanceResult};

// ---------------------------------------------------------------------------
// LossBreakdown
// ---------------------------------------------------------------------------

/// Scalar components produced by one loss evaluation.
///
/// `total` is the weighted combination; the three component values are
/// unweighted, for logging and calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossBreakdown {
    /// Weighted total loss.
    pub total: f64,
    /// Intra-cluster variance term (unweighted).
    pub variance: f64,
    /// Inter-cluster distance term (unweighted).
    pub distance: f64,
    /// Centroid-norm regularisation term (unweighted).
    pub regularization: f64,
    /// Number of distinct clusters scored (`K`).
    pub num_clusters: usize,
}

impl LossBreakdown {
    /// The all-zero breakdown returned for empty input.
    pub fn zero() -> Self {
        LossBreakdown {
            total: 0.0,
            variance: 0.0,
            distance: 0.0,
            regularization: 0.0,
            num_clusters: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// DiscriminativeLoss
// ---------------------------------------------------------------------------

/// Discriminative grouping loss over a set of embeddings and their target
/// cluster assignment.
///
/// Margins and weights come from [`ClusteringConfig`]; none are hardcoded.
#[derive(Debug, Clone)]
pub struct DiscriminativeLoss {
    delta_var: f64,
    delta_dist: f64,
    variance_weight: f64,
    distance_weight: f64,
    regularization_weight: f64,
}

impl DiscriminativeLoss {
    /// Create a loss function from the margins and weights in `config`.
    pub fn new(config: &ClusteringConfig) -> Self {
        DiscriminativeLoss {
            delta_var: config.delta_var,
            delta_dist: config.delta_dist,
            variance_weight: config.variance_weight,
            distance_weight: config.distance_weight,
            regularization_weight: config.regularization_weight,
        }
    }

    /// Score `embeddings` (shape `(N, D)`) against their target cluster ids.
    ///
    /// Target ids need not be dense; clusters are formed from the distinct
    /// values present, so the result is invariant under any relabeling of
    /// the targets. `N == 0` yields the all-zero breakdown. A cluster with a
    /// single member contributes zero spread to the variance term but its
    /// centroid still participates in the distance term. `K == 1` yields a
    /// zero distance term (there are no pairs).
    ///
    /// # Errors
    ///
    /// [`InstanceError::AssignmentMismatch`] when `targets.len()` differs
    /// from the number of embedding rows.
    pub fn forward(
        &self,
        embeddings: ArrayView2<f32>,
        targets: &[usize],
    ) -> InstanceResult<LossBreakdown> {
        let (n, dim) = embeddings.dim();
        if targets.len() != n {
            return Err(InstanceError::AssignmentMismatch {
                targets: targets.len(),
                points: n,
            });
        }
        if n == 0 {
            return Ok(LossBreakdown::zero());
        }

        // Partition rows by distinct target value.
        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (row, &t) in targets.iter().enumerate() {
            members.entry(t).or_default().push(row);
        }
        let k = members.len();

        // Centroids, accumulated in f64 so large groups stay accurate.
        let mut centroids = vec![vec![0.0f64; dim]; k];
        for (slot, rows) in members.values().enumerate() {
            for &row in rows {
                for d in 0..dim {
                    centroids[slot][d] += embeddings[[row, d]] as f64;
                }
            }
            let inv = 1.0 / rows.len() as f64;
            for d in 0..dim {
                centroids[slot][d] *= inv;
            }
        }

        // Variance term: hinged squared distance to the own centroid,
        // averaged per cluster, then averaged across clusters.
        let mut variance = 0.0f64;
        for (slot, rows) in members.values().enumerate() {
            let mut cluster_sum = 0.0f64;
            for &row in rows {
                let mut dist_sq = 0.0f64;
                for d in 0..dim {
                    let diff = embeddings[[row, d]] as f64 - centroids[slot][d];
                    dist_sq += diff * diff;
                }
                let hinge = (dist_sq.sqrt() - self.delta_var).max(0.0);
                cluster_sum += hinge * hinge;
            }
            variance += cluster_sum / rows.len() as f64;
        }
        variance /= k as f64;

        // Distance term: unordered centroid pairs, each counted once.
        let mut distance = 0.0f64;
        if k > 1 {
            for a in 0..k {
                for b in a + 1..k {
                    let mut dist_sq = 0.0f64;
                    for d in 0..dim {
                        let diff = centroids[a][d] - centroids[b][d];
                        dist_sq += diff * diff;
                    }
                    let hinge = (2.0 * self.delta_dist - dist_sq.sqrt()).max(0.0);
                    distance += hinge * hinge;
                }
            }
            distance /= (k * (k - 1) / 2) as f64;
        }

        // Regularisation term: mean centroid norm.
        let mut regularization = 0.0f64;
        for centroid in &centroids {
            let norm_sq: f64 = centroid.iter().map(|c| c * c).sum();
            regularization += norm_sq.sqrt();
        }
        regularization /= k as f64;

        let total = self.variance_weight * variance
            + self.distance_weight * distance
            + self.regularization_weight * regularization;

        Ok(LossBreakdown {
            total,
            variance,
            distance,
            regularization,
            num_clusters: k,
        })
    }
}

impl Default for DiscriminativeLoss {
    fn default() -> Self {
        DiscriminativeLoss::new(&ClusteringConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
