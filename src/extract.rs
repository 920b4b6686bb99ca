//! Training-time extraction of per-instance embedding groups.
//!
//! During training the ground-truth instance map tells us which pixels belong
//! together, so there is nothing to discover: this module slices the dense
//! embedding field into one labelled group per semantic class, ready for the
//! discriminative loss. At inference time the extractor is replaced by
//! mean-shift clustering (see [`crate::infer`]).
//!
//! The original formulation interleaved per-image and per-class iteration
//! through nested lazy generators; here it is a single explicit pass over
//! classes with eagerly materialised groups. Callers iterate images
//! themselves and sum the per-class losses.

use ndarray::{Array2, Array3};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{InstanceError, InstanceResult};

// ---------------------------------------------------------------------------
// ClassGroups
// ---------------------------------------------------------------------------

/// The embeddings of one semantic class, grouped by ground-truth instance.
///
/// `embeddings` holds one row per instance-labelled pixel of the class;
/// `targets[i]` is the dense cluster id of row `i`. Ids are consecutive from
/// 0 in ascending order of the original instance-map values, so the loss
/// sees targets in `[0, num_instances)`.
#[derive(Debug, Clone)]
pub struct ClassGroups {
    /// Semantic class these groups belong to.
    pub class: i32,
    /// Instance-labelled pixel embeddings, shape `(N, D)`.
    pub embeddings: Array2<f32>,
    /// Dense target cluster id per row of `embeddings`.
    pub targets: Vec<usize>,
    /// Number of distinct ground-truth instances (`K`).
    pub num_instances: usize,
}

// ---------------------------------------------------------------------------
// extract_instance_groups
// ---------------------------------------------------------------------------

/// Group the pixel embeddings of each semantic class by ground-truth instance.
///
/// For every class value present in `labels`, collects the embedding vectors
/// at pixels whose instance id is not `background_id`, renumbering instance
/// ids densely from 0. Classes without any instance-labelled pixel contribute
/// no entry at all — they must be skipped rather than scored as zero loss.
///
/// # Arguments
///
/// - `embeddings`: dense embedding field, shape `(D, H, W)`.
/// - `labels`: semantic label map, shape `(H, W)`, spatially aligned.
/// - `instances`: ground-truth instance id map, shape `(H, W)`.
/// - `background_id`: instance-map value meaning "no instance".
///
/// # Errors
///
/// [`InstanceError::DimensionMismatch`] when the spatial shape of `labels`
/// or `instances` disagrees with the embedding field.
pub fn extract_instance_groups(
    embeddings: &Array3<f32>,
    labels: &Array2<i32>,
    instances: &Array2<i32>,
    background_id: i32,
) -> InstanceResult<Vec<ClassGroups>> {
    let (dim, height, width) = embeddings.dim();
    check_spatial(height, width, labels)?;
    check_spatial(height, width, instances)?;

    // Classes in ascending order for a deterministic result.
    let classes: BTreeSet<i32> = labels.iter().copied().collect();

    let mut groups = Vec::new();

    for &class in &classes {
        // First pass: which instance ids occur inside the class mask, and
        // how many pixels carry them. Ascending id order fixes the dense
        // renumbering.
        let mut ids: BTreeSet<i32> = BTreeSet::new();
        let mut pixel_count = 0usize;

        for y in 0..height {
            for x in 0..width {
                if labels[[y, x]] != class || instances[[y, x]] == background_id {
                    continue;
                }
                ids.insert(instances[[y, x]]);
                pixel_count += 1;
            }
        }

        if ids.is_empty() {
            continue;
        }

        let id_to_dense: BTreeMap<i32, usize> =
            ids.iter().enumerate().map(|(dense, &id)| (id, dense)).collect();

        // Second pass: gather the embeddings and dense targets.
        let mut class_embeddings = Array2::<f32>::zeros((pixel_count, dim));
        let mut targets = Vec::with_capacity(pixel_count);
        let mut row = 0usize;

        for y in 0..height {
            for x in 0..width {
                if labels[[y, x]] != class || instances[[y, x]] == background_id {
                    continue;
                }
                for d in 0..dim {
                    class_embeddings[[row, d]] = embeddings[[d, y, x]];
                }
                targets.push(id_to_dense[&instances[[y, x]]]);
                row += 1;
            }
        }

        debug!(
            class,
            num_instances = id_to_dense.len(),
            pixels = pixel_count,
            "extracted instance groups"
        );

        groups.push(ClassGroups {
            class,
            embeddings: class_embeddings,
            targets,
            num_instances: id_to_dense.len(),
        });
    }

    Ok(groups)
}

fn check_spatial(height: usize, width: usize, map: &Array2<i32>) -> InstanceResult<()> {
    let (map_h, map_w) = map.dim();
    if map_h != height || map_w != width {
        return Err(InstanceError::dimension_mismatch(
            vec![height, width],
            vec![map_h, map_w],
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn mismatched_label_shape_is_rejected() {
        let embeddings = Array3::<f32>::zeros((2, 4, 4));
        let labels = Array2::<i32>::zeros((4, 5));
        let instances = Array2::<i32>::zeros((4, 4));
        let err = extract_instance_groups(&embeddings, &labels, &instances, 0);
        assert!(matches!(
            err,
            Err(InstanceError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn all_background_instances_produce_no_groups() {
        let embeddings = Array3::<f32>::zeros((2, 3, 3));
        let labels = Array2::<i32>::ones((3, 3));
        let instances = Array2::<i32>::zeros((3, 3)); // everything background
        let groups = extract_instance_groups(&embeddings, &labels, &instances, 0).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn instance_ids_are_renumbered_densely() {
        let embeddings = Array3::<f32>::zeros((2, 1, 4));
        let labels = Array2::<i32>::zeros((1, 4));
        // Sparse original ids 7 and 42 must become dense 0 and 1.
        let instances =
            Array2::from_shape_vec((1, 4), vec![7, 42, 7, 42]).unwrap();
        let groups = extract_instance_groups(&embeddings, &labels, &instances, 0).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].num_instances, 2);
        assert_eq!(groups[0].targets, vec![0, 1, 0, 1]);
    }
}
