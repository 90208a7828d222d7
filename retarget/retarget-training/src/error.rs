//! Error types for retarget-training crate.

use retarget_dataset::DatasetError;
use retarget_kinematics::KinematicsError;
use retarget_models::ModelError;
use retarget_types::ConfigError;
use thiserror::Error;

/// Errors that can occur during training.
///
/// Configuration and shape problems surface before the first optimizer
/// step; nothing inside the batch loop is raised for numeric reasons.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Invalid training configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid robot configuration.
    #[error("robot configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Kinematics adapter error.
    #[error("kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),

    /// Dataset error.
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Model construction or persistence error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Checkpoint directory error.
    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    /// Loss terms could not be composed.
    #[error("loss error: {0}")]
    Loss(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl TrainingError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a checkpoint error.
    #[must_use]
    pub fn checkpoint(reason: impl Into<String>) -> Self {
        Self::Checkpoint(reason.into())
    }

    /// Creates a loss error.
    #[must_use]
    pub fn loss(reason: impl Into<String>) -> Self {
        Self::Loss(reason.into())
    }
}

impl From<std::io::Error> for TrainingError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for training operations.
pub type Result<T> = std::result::Result<T, TrainingError>;
