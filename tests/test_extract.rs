//! Integration tests for [`instance_clustering::extract`].
//!
//! All inputs are constructed from fixed, deterministic data — no `rand`
//! crate, no OS entropy.

use instance_clustering::extract::extract_instance_groups;
use ndarray::{Array2, Array3};

/// Encode a pixel position into a unique embedding value so gathered rows
/// can be traced back to their source pixel.
fn positional_field(dim: usize, height: usize, width: usize) -> Array3<f32> {
    Array3::from_shape_fn((dim, height, width), |(d, y, x)| {
        (d * height * width + y * width + x) as f32
    })
}

#[test]
fn one_group_per_distinct_instance_id() {
    let height = 8;
    let width = 8;
    let embeddings = positional_field(4, height, width);

    // Class 1 occupies the top half with three instances side by side;
    // the bottom half is class 0 without instances.
    let mut labels = Array2::<i32>::zeros((height, width));
    let mut instances = Array2::<i32>::zeros((height, width));
    for y in 0..4 {
        for x in 0..width {
            labels[[y, x]] = 1;
            instances[[y, x]] = 1 + (x / 3) as i32; // ids 1, 2, 3
        }
    }

    let groups = extract_instance_groups(&embeddings, &labels, &instances, 0).unwrap();

    assert_eq!(groups.len(), 1, "only class 1 carries instances");
    let group = &groups[0];
    assert_eq!(group.class, 1);
    assert_eq!(group.num_instances, 3);

    // Union of the groups covers every instance-labelled pixel of the class.
    assert_eq!(group.embeddings.nrows(), 4 * width);
    assert_eq!(group.targets.len(), 4 * width);

    // Dense ids 0..K, each non-empty.
    for k in 0..3 {
        let members = group.targets.iter().filter(|&&t| t == k).count();
        assert!(members > 0, "instance {k} must keep its pixels");
    }
    assert!(group.targets.iter().all(|&t| t < 3));
}

#[test]
fn group_sizes_match_instance_pixel_counts() {
    let embeddings = positional_field(2, 4, 4);
    let mut labels = Array2::<i32>::zeros((4, 4));
    let mut instances = Array2::<i32>::zeros((4, 4));

    // Class 2: 5 pixels of instance 4, 3 pixels of instance 9.
    let five = [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1)];
    let three = [(2, 2), (2, 3), (3, 3)];
    for &(y, x) in &five {
        labels[[y, x]] = 2;
        instances[[y, x]] = 4;
    }
    for &(y, x) in &three {
        labels[[y, x]] = 2;
        instances[[y, x]] = 9;
    }

    let groups = extract_instance_groups(&embeddings, &labels, &instances, 0).unwrap();
    assert_eq!(groups.len(), 1);
    let group = &groups[0];

    // Ascending original ids fix the dense numbering: 4 -> 0, 9 -> 1.
    let zeros = group.targets.iter().filter(|&&t| t == 0).count();
    let ones = group.targets.iter().filter(|&&t| t == 1).count();
    assert_eq!(zeros, five.len());
    assert_eq!(ones, three.len());
}

#[test]
fn gathered_rows_carry_the_right_pixel_embeddings() {
    let embeddings = positional_field(3, 4, 4);
    let mut labels = Array2::<i32>::zeros((4, 4));
    let mut instances = Array2::<i32>::zeros((4, 4));
    labels[[2, 1]] = 1;
    instances[[2, 1]] = 5;

    let groups = extract_instance_groups(&embeddings, &labels, &instances, 0).unwrap();
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.embeddings.nrows(), 1);

    for d in 0..3 {
        assert_eq!(group.embeddings[[0, d]], embeddings[[d, 2, 1]]);
    }
}

#[test]
fn custom_background_id_is_respected() {
    let embeddings = positional_field(2, 2, 2);
    let labels = Array2::<i32>::zeros((2, 2));
    // With background id -1, instance id 0 is a real instance.
    let instances = Array2::from_shape_vec((2, 2), vec![0, 0, -1, -1]).unwrap();

    let groups = extract_instance_groups(&embeddings, &labels, &instances, -1).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].num_instances, 1);
    assert_eq!(groups[0].embeddings.nrows(), 2);
}

#[test]
fn classes_without_instances_are_skipped_not_scored() {
    let embeddings = positional_field(2, 2, 4);
    // Two classes present, instances only inside class 3.
    let labels = Array2::from_shape_vec((2, 4), vec![0, 0, 3, 3, 0, 0, 3, 3]).unwrap();
    let instances =
        Array2::from_shape_vec((2, 4), vec![0, 0, 1, 1, 0, 0, 2, 2]).unwrap();

    let groups = extract_instance_groups(&embeddings, &labels, &instances, 0).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].class, 3);
    assert_eq!(groups[0].num_instances, 2);
}
