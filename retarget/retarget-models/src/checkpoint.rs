//! Checkpoint persistence for model weights.
//!
//! Weights are recorded to a hidden staging file next to the target and
//! renamed into place, so a reader never sees a partially written file.

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{BinFileRecorder, FullPrecisionSettings, PrettyJsonFileRecorder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ModelError, Result};

/// Supported checkpoint file formats.
///
/// # Example
///
/// ```
/// use retarget_models::CheckpointFormat;
///
/// assert_eq!(CheckpointFormat::from_extension("bin"), Some(CheckpointFormat::Binary));
/// assert_eq!(CheckpointFormat::from_extension("pth"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckpointFormat {
    /// Burn `BinFileRecorder` with full precision.
    #[default]
    Binary,

    /// Burn `PrettyJsonFileRecorder`, for inspection.
    Json,
}

impl CheckpointFormat {
    /// Determines format from file extension.
    ///
    /// - `.bin`, `.burn` -> Binary
    /// - `.json` -> Json
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "bin" | "burn" => Some(Self::Binary),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Determines format from file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Default file extension.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "bin",
            Self::Json => "json",
        }
    }

    /// Format name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for CheckpointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Path of checkpoint `stem` in `dir`.
#[must_use]
pub fn checkpoint_path(dir: &Path, stem: &str, format: CheckpointFormat) -> PathBuf {
    dir.join(format!("{stem}.{}", format.extension()))
}

/// Saves a model as `dir/<stem>.<ext>`, replacing any previous file.
///
/// Returns the final path.
///
/// # Errors
///
/// Returns [`ModelError::SaveCheckpoint`] if recording fails and
/// [`ModelError::Io`] if the directory cannot be created or the rename
/// fails.
pub fn save_checkpoint<B, M>(
    model: &M,
    dir: &Path,
    stem: &str,
    format: CheckpointFormat,
) -> Result<PathBuf>
where
    B: Backend,
    M: Module<B>,
{
    fs::create_dir_all(dir)?;
    let target = checkpoint_path(dir, stem, format);
    let staging = checkpoint_path(dir, &format!(".{stem}"), format);

    let recorded = match format {
        CheckpointFormat::Binary => model
            .clone()
            .save_file(staging.clone(), &BinFileRecorder::<FullPrecisionSettings>::new()),
        CheckpointFormat::Json => model
            .clone()
            .save_file(staging.clone(), &PrettyJsonFileRecorder::<FullPrecisionSettings>::new()),
    };
    recorded.map_err(|e| ModelError::save_checkpoint(target.display().to_string(), e.to_string()))?;

    fs::rename(&staging, &target)?;
    debug!(path = %target.display(), %format, "Checkpoint written");
    Ok(target)
}

/// Loads weights from a checkpoint file into `model`.
///
/// # Errors
///
/// - [`ModelError::CheckpointNotFound`] if the file does not exist
/// - [`ModelError::UnsupportedFormat`] for an unknown extension
/// - [`ModelError::LoadCheckpoint`] if the record does not match the model
pub fn load_checkpoint<B, M>(model: M, path: &Path, device: &B::Device) -> Result<M>
where
    B: Backend,
    M: Module<B>,
{
    let shown = path.display().to_string();
    if !path.exists() {
        return Err(ModelError::checkpoint_not_found(shown));
    }
    let format =
        CheckpointFormat::from_path(path).ok_or_else(|| ModelError::unsupported_format(&shown))?;

    let loaded = match format {
        CheckpointFormat::Binary => model.load_file(
            path.to_path_buf(),
            &BinFileRecorder::<FullPrecisionSettings>::new(),
            device,
        ),
        CheckpointFormat::Json => model.load_file(
            path.to_path_buf(),
            &PrettyJsonFileRecorder::<FullPrecisionSettings>::new(),
            device,
        ),
    };
    let model = loaded.map_err(|e| ModelError::load_checkpoint(&shown, e.to_string()))?;
    debug!(path = %shown, %format, "Checkpoint loaded");
    Ok(model)
}
