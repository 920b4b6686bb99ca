//! Clustering configuration.
//!
//! [`ClusteringConfig`] is the single source of truth for all hyper-parameters
//! of the discriminative loss and the mean-shift clusterer. It is serializable
//! via [`serde`] so it can be stored to / restored from JSON files alongside
//! model checkpoints.
//!
//! # Example
//!
//! ```rust
//! use instance_clustering::config::ClusteringConfig;
//!
//! let cfg = ClusteringConfig::default();
//! cfg.validate().expect("default config is valid");
//!
//! assert_eq!(cfg.num_classes, 5);
//! assert!((cfg.delta_dist - 1.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// ClusteringConfig
// ---------------------------------------------------------------------------

/// Complete configuration for instance-embedding clustering.
///
/// The margin, weight, and bandwidth defaults are the empirically calibrated
/// values the embedding network was trained with; treat them as a starting
/// point, not ground truth, when targeting a different embedding space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    // -----------------------------------------------------------------------
    // Label maps
    // -----------------------------------------------------------------------
    /// Number of semantic classes in the label maps. Default: **5**.
    pub num_classes: usize,

    /// Dimensionality of the per-pixel embedding vectors. Default: **32**.
    pub embedding_dim: usize,

    /// Instance-map value reserved for "no instance" / background.
    /// Default: **0**.
    pub background_instance_id: i32,

    // -----------------------------------------------------------------------
    // Discriminative loss
    // -----------------------------------------------------------------------
    /// Variance-term hinge margin δ_v: a point closer than this to its own
    /// centroid contributes nothing. Default: **0.5**.
    pub delta_var: f64,

    /// Distance-term separation margin δ_d: a centroid pair further apart
    /// than `2·δ_d` contributes nothing. Default: **1.5**.
    pub delta_dist: f64,

    /// Weight of the intra-cluster variance term. Default: **1.0**.
    pub variance_weight: f64,

    /// Weight of the inter-cluster distance term. Default: **1.0**.
    pub distance_weight: f64,

    /// Weight of the centroid-norm regularisation term. Default: **0.001**.
    pub regularization_weight: f64,

    // -----------------------------------------------------------------------
    // Mean-shift
    // -----------------------------------------------------------------------
    /// Gaussian kernel bandwidth used at inference time. Default: **1.0**.
    pub bandwidth: f64,

    /// Mean-shift iteration budget; the clusterer always terminates after
    /// this many iterations even without convergence. Default: **100**.
    pub max_iterations: usize,

    /// Convergence tolerance: iteration stops once the largest per-point
    /// shift falls below this. Default: **1e-3**.
    pub tolerance: f64,

    /// Converged positions closer than this are merged into one cluster.
    /// Default: **0.5** (half the bandwidth).
    pub merge_tolerance: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        ClusteringConfig {
            // Label maps
            num_classes: 5,
            embedding_dim: 32,
            background_instance_id: 0,
            // Loss
            delta_var: 0.5,
            delta_dist: 1.5,
            variance_weight: 1.0,
            distance_weight: 1.0,
            regularization_weight: 0.001,
            // Mean-shift
            bandwidth: 1.0,
            max_iterations: 100,
            tolerance: 1e-3,
            merge_tolerance: 0.5,
        }
    }
}

impl ClusteringConfig {
    /// Load a [`ClusteringConfig`] from a JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be opened,
    /// [`ConfigError::ParseError`] if the JSON is malformed, and any
    /// [`ConfigError::InvalidValue`] produced by [`validate`].
    ///
    /// [`validate`]: ClusteringConfig::validate
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: ClusteringConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize this configuration to pretty-printed JSON and write it to
    /// `path`, creating parent directories if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the directory cannot be created
    /// or the file cannot be written.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Validate all fields and return an error describing the first problem
    /// found, or `Ok(())` if the configuration is coherent.
    ///
    /// # Validated invariants
    ///
    /// - `num_classes` and `embedding_dim` must be at least 1.
    /// - Margins `delta_var` / `delta_dist` must be strictly positive.
    /// - Loss weights must be non-negative and sum to a positive value.
    /// - `bandwidth` must be strictly positive.
    /// - `max_iterations` must be at least 1.
    /// - `tolerance` must be strictly positive.
    /// - `merge_tolerance` must be at least `tolerance` (otherwise converged
    ///   positions of one mode would fail to merge).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_classes == 0 {
            return Err(ConfigError::invalid_value("num_classes", "must be > 0"));
        }
        if self.embedding_dim == 0 {
            return Err(ConfigError::invalid_value("embedding_dim", "must be > 0"));
        }

        // Margins
        if self.delta_var <= 0.0 {
            return Err(ConfigError::invalid_value("delta_var", "must be > 0.0"));
        }
        if self.delta_dist <= 0.0 {
            return Err(ConfigError::invalid_value("delta_dist", "must be > 0.0"));
        }

        // Weights
        if self.variance_weight < 0.0 {
            return Err(ConfigError::invalid_value("variance_weight", "must be >= 0.0"));
        }
        if self.distance_weight < 0.0 {
            return Err(ConfigError::invalid_value("distance_weight", "must be >= 0.0"));
        }
        if self.regularization_weight < 0.0 {
            return Err(ConfigError::invalid_value(
                "regularization_weight",
                "must be >= 0.0",
            ));
        }
        let total_weight = self.variance_weight + self.distance_weight + self.regularization_weight;
        if total_weight <= 0.0 {
            return Err(ConfigError::invalid_value(
                "variance_weight / distance_weight / regularization_weight",
                "at least one loss weight must be > 0.0",
            ));
        }

        // Mean-shift
        if self.bandwidth <= 0.0 {
            return Err(ConfigError::invalid_value("bandwidth", "must be > 0.0"));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid_value("max_iterations", "must be > 0"));
        }
        if self.tolerance <= 0.0 {
            return Err(ConfigError::invalid_value("tolerance", "must be > 0.0"));
        }
        if self.merge_tolerance < self.tolerance {
            return Err(ConfigError::invalid_value(
                "merge_tolerance",
                "must be >= tolerance",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
