//! Error types for retarget-inference crate.

use retarget_dataset::DatasetError;
use retarget_models::ModelError;
use retarget_training::TrainingError;
use retarget_types::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading or running a retargeting model.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Invalid or incomplete configuration snapshot.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Human input does not match the model.
    #[error("data error: {0}")]
    Data(#[from] DatasetError),

    /// Checkpoint, configuration or run directory could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Model output could not be read back.
    #[error("invalid model output: {0}")]
    Output(String),
}

impl InferenceError {
    /// Creates a model load error.
    #[must_use]
    pub fn model_load(reason: impl Into<String>) -> Self {
        Self::ModelLoad(reason.into())
    }
}

impl From<ModelError> for InferenceError {
    fn from(err: ModelError) -> Self {
        Self::ModelLoad(err.to_string())
    }
}

impl From<TrainingError> for InferenceError {
    fn from(err: TrainingError) -> Self {
        Self::ModelLoad(err.to_string())
    }
}

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
