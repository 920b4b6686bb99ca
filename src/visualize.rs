//! Raster adapters for human inspection.
//!
//! Two pure transforms: a semantic label map rendered through a fixed
//! class-colour lookup table, and discovered instance clusters rendered so
//! that every instance gets a visually distinct colour. Both produce plain
//! `(H, W, 3)` RGB byte arrays; encoding them to an image file is the
//! embedding application's job.
//!
//! Colour tables are ordinary arrays indexed by class or instance number —
//! no dispatch beyond a bounds-checked lookup.

use ndarray::{Array3, ArrayView2};

use crate::error::{InstanceError, InstanceResult};
use crate::infer::ClassClusters;

// ---------------------------------------------------------------------------
// Colour tables
// ---------------------------------------------------------------------------

/// Default class palette. Index = semantic class id.
pub const DEFAULT_CLASS_COLOURS: [[u8; 3]; 5] = [
    [0, 0, 0],       // background
    [228, 26, 28],   // red
    [55, 126, 184],  // blue
    [77, 175, 74],   // green
    [152, 78, 163],  // purple
];

/// Colour wheel cycled through when painting discovered instances.
///
/// Instances are numbered globally across classes, so neighbouring
/// instances of the same class land on different wheel entries.
pub const INSTANCE_COLOUR_WHEEL: [[u8; 3]; 10] = [
    [230, 25, 75],   // red
    [60, 180, 75],   // green
    [255, 225, 25],  // yellow
    [0, 130, 200],   // blue
    [245, 130, 48],  // orange
    [145, 30, 180],  // purple
    [70, 240, 240],  // cyan
    [240, 50, 230],  // magenta
    [210, 245, 60],  // lime
    [250, 190, 212], // pink
];

/// Colour painted wherever no instance was discovered.
pub const BACKGROUND_COLOUR: [u8; 3] = [0, 0, 0];

// ---------------------------------------------------------------------------
// render_classes
// ---------------------------------------------------------------------------

/// Render a semantic label map as an RGB raster via a class colour table.
///
/// # Errors
///
/// [`InstanceError::ClassOutOfRange`] when a label value is negative or has
/// no palette entry.
pub fn render_classes(
    labels: ArrayView2<i32>,
    palette: &[[u8; 3]],
) -> InstanceResult<Array3<u8>> {
    let (height, width) = labels.dim();
    let mut image = Array3::<u8>::zeros((height, width, 3));

    for y in 0..height {
        for x in 0..width {
            let label = labels[[y, x]];
            if label < 0 || label as usize >= palette.len() {
                return Err(InstanceError::ClassOutOfRange {
                    class: label as i64,
                    palette_len: palette.len(),
                });
            }
            let colour = palette[label as usize];
            for c in 0..3 {
                image[[y, x, c]] = colour[c];
            }
        }
    }

    Ok(image)
}

// ---------------------------------------------------------------------------
// render_instances
// ---------------------------------------------------------------------------

/// Render discovered instance clusters as an RGB raster.
///
/// Each (class, cluster) pair receives the next colour of
/// [`INSTANCE_COLOUR_WHEEL`], cycling when there are more instances than
/// wheel entries; pixels belonging to no instance keep `background`.
///
/// # Errors
///
/// [`InstanceError::AssignmentMismatch`] when a [`ClassClusters`] carries
/// fewer labels than pixels, and [`InstanceError::DimensionMismatch`] when
/// a pixel coordinate falls outside `(height, width)`.
pub fn render_instances(
    per_class: &[Option<ClassClusters>],
    height: usize,
    width: usize,
    background: [u8; 3],
) -> InstanceResult<Array3<u8>> {
    let mut image = Array3::<u8>::zeros((height, width, 3));
    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                image[[y, x, c]] = background[c];
            }
        }
    }

    // Global instance counter so colours differ across classes too.
    let mut next_instance = 0usize;

    for clusters in per_class.iter().flatten() {
        if clusters.labels.len() != clusters.pixels.len() {
            return Err(InstanceError::AssignmentMismatch {
                targets: clusters.labels.len(),
                points: clusters.pixels.len(),
            });
        }

        let base = next_instance;
        next_instance += clusters.num_clusters;

        for (&(y, x), &label) in clusters.pixels.iter().zip(&clusters.labels) {
            if y >= height || x >= width {
                return Err(InstanceError::dimension_mismatch(
                    vec![height, width],
                    vec![y + 1, x + 1],
                ));
            }
            let colour =
                INSTANCE_COLOUR_WHEEL[(base + label) % INSTANCE_COLOUR_WHEEL.len()];
            for c in 0..3 {
                image[[y, x, c]] = colour[c];
            }
        }
    }

    Ok(image)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn class_raster_uses_palette_colours() {
        let labels = Array2::from_shape_vec((1, 2), vec![0, 1]).unwrap();
        let image = render_classes(labels.view(), &DEFAULT_CLASS_COLOURS).unwrap();
        assert_eq!(image.dim(), (1, 2, 3));
        assert_eq!(
            [image[[0, 0, 0]], image[[0, 0, 1]], image[[0, 0, 2]]],
            DEFAULT_CLASS_COLOURS[0]
        );
        assert_eq!(
            [image[[0, 1, 0]], image[[0, 1, 1]], image[[0, 1, 2]]],
            DEFAULT_CLASS_COLOURS[1]
        );
    }

    #[test]
    fn out_of_palette_class_is_rejected() {
        let labels = Array2::from_shape_vec((1, 1), vec![7]).unwrap();
        let err = render_classes(labels.view(), &DEFAULT_CLASS_COLOURS);
        assert!(matches!(
            err,
            Err(InstanceError::ClassOutOfRange { class: 7, .. })
        ));
    }

    #[test]
    fn negative_class_is_rejected() {
        let labels = Array2::from_shape_vec((1, 1), vec![-1]).unwrap();
        let err = render_classes(labels.view(), &DEFAULT_CLASS_COLOURS);
        assert!(matches!(
            err,
            Err(InstanceError::ClassOutOfRange { class: -1, .. })
        ));
    }

    #[test]
    fn instances_get_distinct_colours_and_background_is_kept() {
        let clusters = ClassClusters {
            class: 1,
            pixels: vec![(0, 0), (0, 1)],
            labels: vec![0, 1],
            num_clusters: 2,
            converged: true,
        };
        let image =
            render_instances(&[Some(clusters)], 2, 2, BACKGROUND_COLOUR).unwrap();

        let pixel = |y: usize, x: usize| {
            [image[[y, x, 0]], image[[y, x, 1]], image[[y, x, 2]]]
        };
        assert_eq!(pixel(0, 0), INSTANCE_COLOUR_WHEEL[0]);
        assert_eq!(pixel(0, 1), INSTANCE_COLOUR_WHEEL[1]);
        assert_eq!(pixel(1, 0), BACKGROUND_COLOUR);
        assert_eq!(pixel(1, 1), BACKGROUND_COLOUR);
    }

    #[test]
    fn out_of_bounds_pixel_is_rejected() {
        let clusters = ClassClusters {
            class: 0,
            pixels: vec![(5, 0)],
            labels: vec![0],
            num_clusters: 1,
            converged: true,
        };
        let err = render_instances(&[Some(clusters)], 2, 2, BACKGROUND_COLOUR);
        assert!(matches!(err, Err(InstanceError::DimensionMismatch { .. })));
    }
}
