//! Error types for retarget-kinematics crate.

use retarget_types::ConfigError;
use thiserror::Error;

/// Errors that can occur while building or evaluating kinematics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KinematicsError {
    /// Configuration does not match the kinematic model.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The kinematic tree description is inconsistent.
    #[error("invalid kinematic tree: {0}")]
    InvalidTree(String),

    /// A movable joint has no position limits.
    #[error("joint {0} has no position limits")]
    MissingLimit(String),

    /// Joint vector has the wrong length.
    #[error("joint vector length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Kinematic model file could not be read.
    #[error("IO error: {0}")]
    Io(String),
}

impl KinematicsError {
    /// Creates an invalid tree error.
    #[must_use]
    pub fn invalid_tree(reason: impl Into<String>) -> Self {
        Self::InvalidTree(reason.into())
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

impl From<std::io::Error> for KinematicsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for KinematicsError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidTree(err.to_string())
    }
}

/// Result type for kinematics operations.
pub type Result<T> = std::result::Result<T, KinematicsError>;
