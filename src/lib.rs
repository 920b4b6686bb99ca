//! # Instance-embedding clustering
//!
//! Joint semantic-segmentation models can be trained to emit, alongside the
//! class logits, a dense per-pixel embedding field in which pixels of the
//! same object instance land close together and different instances land
//! far apart. This crate is the clustering subsystem around such a field:
//!
//! - during **training**, [`extract`] groups the embeddings by ground-truth
//!   instance and [`losses`] (or [`tch_loss`] with autograd) scores them
//!   with the discriminative grouping loss that shapes the space;
//! - during **inference**, [`meanshift`] discovers the instances from the
//!   embedding geometry alone and [`infer`] drives it per class;
//! - [`visualize`] turns label maps and discovered clusters into RGB
//!   rasters for inspection.
//!
//! The network itself, dataset loading, the epoch loop, and file I/O are
//! external collaborators: every public function here is a pure transform
//! of in-memory arrays.
//!
//! ## Data flow
//!
//! ```text
//! training:   (embeddings, labels, instances)
//!                └─ extract ──► ClassGroups ──► DiscriminativeLoss ──► scalar
//! inference:  (embeddings, predicted labels)
//!                └─ infer ──► mean_shift ──► ClassClusters ──► visualize
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use instance_clustering::config::ClusteringConfig;
//! use instance_clustering::extract::extract_instance_groups;
//! use instance_clustering::losses::DiscriminativeLoss;
//! use ndarray::{Array2, Array3};
//!
//! let cfg = ClusteringConfig::default();
//! cfg.validate().expect("config is valid");
//!
//! let embeddings = Array3::<f32>::zeros((cfg.embedding_dim, 8, 8));
//! let labels = Array2::<i32>::zeros((8, 8));
//! let instances = Array2::<i32>::ones((8, 8));
//!
//! let loss = DiscriminativeLoss::new(&cfg);
//! let groups =
//!     extract_instance_groups(&embeddings, &labels, &instances, cfg.background_instance_id)
//!         .expect("aligned shapes");
//! for group in &groups {
//!     let breakdown = loss.forward(group.embeddings.view(), &group.targets).unwrap();
//!     assert!(breakdown.total.is_finite());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod extract;
pub mod infer;
pub mod losses;
pub mod meanshift;
#[cfg(feature = "tch-backend")]
pub mod tch_loss;
pub mod visualize;

// Convenient re-exports at the crate root.
pub use config::ClusteringConfig;
pub use error::{ConfigError, InstanceError, InstanceResult};
pub use extract::{extract_instance_groups, ClassGroups};
pub use infer::{discover_instances, ClassClusters};
pub use losses::{DiscriminativeLoss, LossBreakdown};
pub use meanshift::{mean_shift, MeanShiftOptions, MeanShiftOutcome};
pub use visualize::{render_classes, render_instances};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
