//! Differentiable discriminative loss over `tch` tensors.
//!
//! The gradient path of [`crate::losses`]: the same variance / distance /
//! regularisation combination expressed entirely in tensor operations, so
//! autograd flows from the returned scalar back into the embedding network.
//! The host training loop adds this scalar to its semantic cross-entropy
//! objective and calls `backward()` on the sum.
//!
//! Scalar component values are extracted with `double_value` for logging
//! only; they are detached copies and carry no gradient.
//!
//! Compiled only with the `tch-backend` feature, which requires libtorch at
//! build time. The ndarray path in [`crate::losses`] computes the identical
//! quantity and is the reference for numerical agreement tests.

use tch::{Kind, Tensor};

use crate::config::ClusteringConfig;
use crate::error::{InstanceError, InstanceResult};
use crate::losses::LossBreakdown;

// ---------------------------------------------------------------------------
// discriminative_loss
// ---------------------------------------------------------------------------

/// Compute the discriminative loss over `embeddings` (`[N, D]` float tensor)
/// and their target cluster ids.
///
/// Returns the differentiable scalar tensor together with a detached
/// [`LossBreakdown`] for logging. Semantics match
/// [`DiscriminativeLoss::forward`]: sparse target ids are accepted, `N == 0`
/// yields a graph-attached zero scalar, `K == 1` has no distance term.
///
/// # Errors
///
/// [`InstanceError::AssignmentMismatch`] when `targets.len()` differs from
/// the number of embedding rows.
///
/// [`DiscriminativeLoss::forward`]: crate::losses::DiscriminativeLoss::forward
pub fn discriminative_loss(
    embeddings: &Tensor,
    targets: &[i64],
    config: &ClusteringConfig,
) -> InstanceResult<(Tensor, LossBreakdown)> {
    let n = embeddings.size()[0] as usize;
    if targets.len() != n {
        return Err(InstanceError::AssignmentMismatch {
            targets: targets.len(),
            points: n,
        });
    }

    let device = embeddings.device();
    if n == 0 {
        // Zero scalar, still attached to the graph's device/dtype.
        let zero = Tensor::zeros(&[] as &[i64], (Kind::Float, device));
        return Ok((zero, LossBreakdown::zero()));
    }

    // Row indices per distinct target id, ascending.
    let mut distinct: Vec<i64> = targets.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    let k = distinct.len();

    let mut centroids: Vec<Tensor> = Vec::with_capacity(k);
    let mut variance = Tensor::zeros(&[] as &[i64], (Kind::Float, device));

    for &id in &distinct {
        let rows: Vec<i64> = targets
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == id)
            .map(|(row, _)| row as i64)
            .collect();
        let index = Tensor::from_slice(&rows).to_device(device);
        let members = embeddings.index_select(0, &index); // [n_c, D]
        let centroid = members.mean_dim(&[0i64][..], false, Kind::Float); // [D]

        // Hinged pull to the centroid: max(0, ||x - mu|| - delta_var)^2.
        let dist = (&members - centroid.unsqueeze(0))
            .pow_tensor_scalar(2)
            .sum_dim_intlist(&[1i64][..], false, Kind::Float)
            .sqrt();
        let hinged = (dist - config.delta_var).clamp_min(0.0);
        variance = variance + hinged.pow_tensor_scalar(2).mean(Kind::Float);

        centroids.push(centroid);
    }
    variance = variance / k as f64;

    // Hinged repulsion over unordered centroid pairs.
    let mut distance = Tensor::zeros(&[] as &[i64], (Kind::Float, device));
    if k > 1 {
        for a in 0..k {
            for b in a + 1..k {
                let gap = (&centroids[a] - &centroids[b])
                    .pow_tensor_scalar(2)
                    .sum(Kind::Float)
                    .sqrt();
                let hinged = (-gap + 2.0 * config.delta_dist).clamp_min(0.0);
                distance = distance + hinged.pow_tensor_scalar(2);
            }
        }
        distance = distance / (k * (k - 1) / 2) as f64;
    }

    // Mean centroid norm.
    let mut regularization = Tensor::zeros(&[] as &[i64], (Kind::Float, device));
    for centroid in &centroids {
        regularization =
            regularization + centroid.pow_tensor_scalar(2).sum(Kind::Float).sqrt();
    }
    regularization = regularization / k as f64;

    let total = &variance * config.variance_weight
        + &distance * config.distance_weight
        + &regularization * config.regularization_weight;

    let breakdown = LossBreakdown {
        total: total.double_value(&[]),
        variance: variance.double_value(&[]),
        distance: distance.double_value(&[]),
        regularization: regularization.double_value(&[]),
        num_clusters: k,
    };

    Ok((total, breakdown))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
