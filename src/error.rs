//! Error types for the instance-clustering crate.
//!
//! This module is the single source of truth for all error types. Every
//! module that produces an error imports its error type from here rather
//! than defining it inline, keeping the error hierarchy centralised.
//!
//! ## Hierarchy
//!
//! ```text
//! InstanceError (top-level)
//! └── ConfigError   (config validation / file loading)
//! ```
//!
//! Empty inputs (zero points to cluster, zero groups to score) are
//! well-defined results and never surface here; mean-shift non-convergence
//! is reported through [`MeanShiftOutcome::converged`] plus a log warning,
//! not an error.
//!
//! [`MeanShiftOutcome::converged`]: crate::meanshift::MeanShiftOutcome

use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// InstanceResult
// ---------------------------------------------------------------------------

/// Convenient `Result` alias used throughout the crate.
pub type InstanceResult<T> = Result<T, InstanceError>;

// ---------------------------------------------------------------------------
// InstanceError — top-level aggregator
// ---------------------------------------------------------------------------

/// Top-level error type for the instance-clustering crate.
///
/// Lower-level configuration failures ([`ConfigError`]) are automatically
/// coerced into `InstanceError` via [`From`].
#[derive(Debug, Error)]
pub enum InstanceError {
    /// A configuration validation or loading error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The spatial shapes of the embedding field and a label / instance map
    /// disagree. Fail fast; there is no recovery.
    #[error("Dimension mismatch: expected spatial shape {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Expected spatial shape.
        expected: Vec<usize>,
        /// Actual spatial shape.
        actual: Vec<usize>,
    },

    /// A class label cannot be rendered: negative, or beyond the palette.
    #[error("Class label {class} is out of range for a palette of {palette_len} colours")]
    ClassOutOfRange {
        /// The offending class label.
        class: i64,
        /// Number of colours available.
        palette_len: usize,
    },

    /// The number of cluster labels does not match the number of points they
    /// describe.
    #[error("Assignment length mismatch: {targets} target ids for {points} points")]
    AssignmentMismatch {
        /// Number of target / cluster ids supplied.
        targets: usize,
        /// Number of embedding points supplied.
        points: usize,
    },
}

impl InstanceError {
    /// Construct an [`InstanceError::DimensionMismatch`].
    pub fn dimension_mismatch(expected: Vec<usize>, actual: Vec<usize>) -> Self {
        InstanceError::DimensionMismatch { expected, actual }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced when loading or validating a [`ClusteringConfig`].
///
/// [`ClusteringConfig`]: crate::config::ClusteringConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A configuration file could not be read from disk.
    #[error("Cannot read config file {path:?}: {source}")]
    FileRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file contains malformed JSON.
    #[error("Cannot parse config file {path:?}: {source}")]
    ParseError {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue { field, reason: reason.into() }
    }
}
