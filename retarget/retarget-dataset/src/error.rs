//! Error types for retarget-dataset crate.

use retarget_kinematics::KinematicsError;
use thiserror::Error;

/// Errors that can occur while building, caching or reading datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Dataset cache file does not exist.
    #[error("dataset cache not found: {0}")]
    CacheNotFound(String),

    /// Cache file does not start with the expected magic bytes.
    #[error("invalid dataset magic: {0:?}")]
    InvalidMagic([u8; 4]),

    /// Cache file was written by an unsupported format version.
    #[error("unsupported dataset version: {0}")]
    UnsupportedVersion(u32),

    /// Cache payload could not be encoded or decoded.
    #[error("corrupt dataset: {0}")]
    Corrupt(String),

    /// Array has an unexpected shape.
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// What was being checked.
        what: String,
        /// Expected shape.
        expected: String,
        /// Actual shape.
        actual: String,
    },

    /// A finger has no points to resample.
    #[error("finger {0} has no points")]
    EmptyPointCloud(usize),

    /// Batch size of zero or dataset with no samples.
    #[error("empty batch: {0}")]
    EmptyBatch(String),

    /// Keypoint name not present in the dataset.
    #[error("unknown keypoint: {0}")]
    UnknownKeypoint(String),

    /// Kinematics evaluation failed.
    #[error("kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    /// Reading a `.npy` file failed.
    #[error("npy error: {0}")]
    Npy(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl DatasetError {
    /// Creates a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an empty batch error.
    #[must_use]
    pub fn empty_batch(reason: impl Into<String>) -> Self {
        Self::EmptyBatch(reason.into())
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<bincode::Error> for DatasetError {
    fn from(err: bincode::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mismatch_message() {
        let err = DatasetError::shape_mismatch("human motion", "[T, 21, 3]", "[10, 20, 3]");
        let msg = err.to_string();
        assert!(msg.contains("human motion"));
        assert!(msg.contains("[10, 20, 3]"));
    }

    #[test]
    fn io_error_converts() {
        let err: DatasetError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
