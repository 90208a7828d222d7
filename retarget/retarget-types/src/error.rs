//! Error types for retarget-types crate.

use thiserror::Error;

/// Errors raised while validating or resolving a robot hand configuration.
///
/// All of these are fatal at setup time: no dataset generation or training
/// run is started with a configuration that fails validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Clip ratio outside `[0, 1]` or not strictly increasing.
    #[error("invalid clip ratio ({low}, {high}) for joint {joint}: need 0 <= low < high <= 1")]
    InvalidClipRatio {
        /// Joint the ratio was configured for.
        joint: String,
        /// Lower ratio.
        low: f64,
        /// Upper ratio.
        high: f64,
    },

    /// Joint range collapsed or inverted.
    #[error("empty joint range for {joint}: lower {lower} >= upper {upper}")]
    EmptyJointRange {
        /// Joint name.
        joint: String,
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },

    /// A joint name referenced by the configuration is unknown.
    #[error("unknown joint: {0}")]
    UnknownJoint(String),

    /// A link name referenced by the configuration is unknown.
    #[error("unknown link: {0}")]
    UnknownLink(String),

    /// The same joint appears twice where uniqueness is required.
    #[error("duplicate joint: {0}")]
    DuplicateJoint(String),

    /// Two fingertip descriptors claim the same joint.
    #[error("joint {joint} is driven by both {first} and {second}")]
    OverlappingFingers {
        /// Shared joint.
        joint: String,
        /// First fingertip name.
        first: String,
        /// Second fingertip name.
        second: String,
    },

    /// Human skeleton index outside the 21-point hand.
    #[error("human keypoint id {id} for fingertip {finger} is out of range (0..{max})")]
    HumanIdOutOfRange {
        /// Fingertip name.
        finger: String,
        /// Offending id.
        id: usize,
        /// Exclusive upper bound.
        max: usize,
    },

    /// Index list does not describe a bijection.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    /// Length of a vector does not match the joint count.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Required field missing or structurally invalid.
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// Configuration file could not be read or written.
    #[error("IO error: {0}")]
    Io(String),
}

impl ConfigError {
    /// Creates an invalid clip ratio error.
    #[must_use]
    pub fn invalid_clip_ratio(joint: impl Into<String>, low: f64, high: f64) -> Self {
        Self::InvalidClipRatio {
            joint: joint.into(),
            low,
            high,
        }
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates a malformed configuration error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
