//! Per-image instance discovery from a predicted label map.
//!
//! The inference-side counterpart of [`crate::extract`]: with no ground
//! truth available, each semantic class of the predicted label map is masked
//! out of the embedding field and handed to mean-shift, which discovers the
//! instance grouping from the embedding geometry alone.
//!
//! Every (image, class) unit is a pure function of its own slice of the
//! inputs — there is no shared mutable state, so callers are free to run
//! classes or images on worker threads and collect the results in any order.

use ndarray::{Array2, Array3};
use tracing::debug;

use crate::error::{InstanceError, InstanceResult};
use crate::meanshift::{mean_shift, MeanShiftOptions, MeanShiftOutcome};

// ---------------------------------------------------------------------------
// ClassClusters
// ---------------------------------------------------------------------------

/// Discovered instance clusters for one semantic class of one image.
#[derive(Debug, Clone)]
pub struct ClassClusters {
    /// The semantic class whose pixels were clustered.
    pub class: i32,
    /// `(y, x)` coordinate of each clustered pixel, in scan order.
    pub pixels: Vec<(usize, usize)>,
    /// Cluster id per entry of `pixels`, consecutive from 0.
    pub labels: Vec<usize>,
    /// Number of discovered instances.
    pub num_clusters: usize,
    /// `false` when mean-shift hit its iteration budget for this class.
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// discover_instances
// ---------------------------------------------------------------------------

/// Discover the instances of every semantic class in one image.
///
/// For each class index in `[0, num_classes)`, collects the embeddings at
/// pixels the predicted label map assigns to that class and clusters them
/// with mean-shift. Classes with no predicted pixel yield `None`.
///
/// # Arguments
///
/// - `embeddings`: dense embedding field, shape `(D, H, W)`.
/// - `predicted_labels`: predicted semantic label map, shape `(H, W)`.
/// - `num_classes`: number of semantic classes to scan.
/// - `options`: mean-shift parameters.
///
/// # Errors
///
/// [`InstanceError::DimensionMismatch`] when the label map's spatial shape
/// disagrees with the embedding field.
pub fn discover_instances(
    embeddings: &Array3<f32>,
    predicted_labels: &Array2<i32>,
    num_classes: usize,
    options: &MeanShiftOptions,
) -> InstanceResult<Vec<Option<ClassClusters>>> {
    let (dim, height, width) = embeddings.dim();
    let (map_h, map_w) = predicted_labels.dim();
    if map_h != height || map_w != width {
        return Err(InstanceError::dimension_mismatch(
            vec![height, width],
            vec![map_h, map_w],
        ));
    }

    let mut per_class = Vec::with_capacity(num_classes);

    for class in 0..num_classes as i32 {
        let pixels: Vec<(usize, usize)> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (y, x)))
            .filter(|&(y, x)| predicted_labels[[y, x]] == class)
            .collect();

        if pixels.is_empty() {
            per_class.push(None);
            continue;
        }

        let mut points = Array2::<f32>::zeros((pixels.len(), dim));
        for (row, &(y, x)) in pixels.iter().enumerate() {
            for d in 0..dim {
                points[[row, d]] = embeddings[[d, y, x]];
            }
        }

        let MeanShiftOutcome {
            labels,
            num_clusters,
            converged,
            ..
        } = mean_shift(points.view(), options);

        debug!(
            class,
            pixels = pixels.len(),
            num_clusters,
            converged,
            "clustered class embeddings"
        );

        per_class.push(Some(ClassClusters {
            class,
            pixels,
            labels,
            num_clusters,
            converged,
        }));
    }

    Ok(per_class)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn mismatched_map_shape_is_rejected() {
        let embeddings = Array3::<f32>::zeros((2, 4, 4));
        let labels = Array2::<i32>::zeros((3, 4));
        let err = discover_instances(&embeddings, &labels, 2, &MeanShiftOptions::default());
        assert!(matches!(err, Err(InstanceError::DimensionMismatch { .. })));
    }

    #[test]
    fn absent_class_yields_none() {
        let embeddings = Array3::<f32>::zeros((2, 2, 2));
        let labels = Array2::<i32>::zeros((2, 2)); // only class 0 present
        let out = discover_instances(&embeddings, &labels, 3, &MeanShiftOptions::default()).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].is_some());
        assert!(out[1].is_none());
        assert!(out[2].is_none());
    }
}
