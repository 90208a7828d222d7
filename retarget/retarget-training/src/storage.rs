//! Checkpoint and dataset layout under an explicit storage root.
//!
//! ```text
//! <root>/
//!   data/<robot>.rkd
//!   checkpoint/
//!     fk_model_<robot>.bin
//!     <robot>_<YYYY-MM-DD_HH-MM-SS>[_<tag>]/{config.json, epoch_<N>.bin, last.bin}
//!     <robot>_last/{config.json, epoch_<N>.bin, last.bin}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::prelude::Backend;
use chrono::{DateTime, TimeZone};
use retarget_models::{CheckpointFormat, checkpoint_path, save_checkpoint};
use retarget_types::RobotConfig;
use tracing::debug;

use crate::error::{Result, TrainingError};

/// Name of the run snapshot of the robot configuration.
pub const CONFIG_FILE: &str = "config.json";

/// Stem of the rolling latest checkpoint.
pub const LAST_STEM: &str = "last";

/// Timestamp format of run directory names.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Stem of the per-epoch checkpoint.
#[must_use]
pub fn epoch_stem(epoch: usize) -> String {
    format!("epoch_{epoch}")
}

/// Root of all persisted training artefacts.
///
/// # Example
///
/// ```
/// use retarget_training::CheckpointStore;
/// use std::path::Path;
///
/// let store = CheckpointStore::new("/srv/retarget");
/// assert_eq!(store.dataset_path("allegro"), Path::new("/srv/retarget/data/allegro.rkd"));
/// assert_eq!(
///     store.forward_model_path("allegro"),
///     Path::new("/srv/retarget/checkpoint/fk_model_allegro.bin"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointStore {
    root: PathBuf,
    format: CheckpointFormat,
}

impl CheckpointStore {
    /// Creates a store rooted at `root`; nothing is created on disk yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            format: CheckpointFormat::Binary,
        }
    }

    /// Sets the weight file format.
    #[must_use]
    pub const fn with_format(mut self, format: CheckpointFormat) -> Self {
        self.format = format;
        self
    }

    /// Storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Weight file format.
    #[must_use]
    pub const fn format(&self) -> CheckpointFormat {
        self.format
    }

    /// Directory of dataset caches.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Directory of weights and run directories.
    #[must_use]
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.root.join("checkpoint")
    }

    /// Kinematics dataset cache of a robot.
    #[must_use]
    pub fn dataset_path(&self, robot: &str) -> PathBuf {
        self.data_dir().join(format!("{robot}.rkd"))
    }

    /// Stem of the forward surrogate checkpoint of a robot.
    #[must_use]
    pub fn forward_model_stem(robot: &str) -> String {
        format!("fk_model_{robot}")
    }

    /// Forward surrogate checkpoint of a robot.
    #[must_use]
    pub fn forward_model_path(&self, robot: &str) -> PathBuf {
        checkpoint_path(
            &self.checkpoint_dir(),
            &Self::forward_model_stem(robot),
            self.format,
        )
    }

    /// Creates the timestamped run directory and the rolling `_last`
    /// directory for a new inverse fit.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Io`] if a directory cannot be created.
    pub fn create_run<Tz>(&self, robot: &str, tag: &str, started: &DateTime<Tz>) -> Result<RunDirs>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut name = format!("{robot}_{}", started.format(RUN_TIMESTAMP_FORMAT));
        if !tag.is_empty() {
            name.push('_');
            name.push_str(tag);
        }
        let run = self.checkpoint_dir().join(name);
        let last = self.checkpoint_dir().join(format!("{robot}_last"));
        fs::create_dir_all(&run)?;
        fs::create_dir_all(&last)?;
        debug!(run = %run.display(), last = %last.display(), "Created run directories");
        Ok(RunDirs {
            run,
            last,
            format: self.format,
        })
    }

    /// First run directory, in descending name order, whose name contains
    /// `tag`.
    ///
    /// Descending order puts `<robot>_last` ahead of timestamped runs and
    /// newer runs ahead of older ones.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Checkpoint`] if no directory matches and
    /// [`TrainingError::Io`] if the checkpoint directory cannot be read.
    pub fn find_run(&self, tag: &str) -> Result<PathBuf> {
        let dir = self.checkpoint_dir();
        let mut names: Vec<String> = fs::read_dir(&dir)?
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name.contains(tag))
            .collect();
        names.sort_unstable_by(|a, b| b.cmp(a));
        names
            .into_iter()
            .next()
            .map(|name| dir.join(name))
            .ok_or_else(|| {
                TrainingError::checkpoint(format!("no run in {} matches {tag:?}", dir.display()))
            })
    }

    /// Weight file of a run: `epoch_<N>` when `epoch > 0`, otherwise `last`.
    #[must_use]
    pub fn run_model_path(&self, run: &Path, epoch: usize) -> PathBuf {
        let stem = if epoch > 0 {
            epoch_stem(epoch)
        } else {
            LAST_STEM.to_string()
        };
        checkpoint_path(run, &stem, self.format)
    }
}

/// Directories written by one inverse fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirs {
    run: PathBuf,
    last: PathBuf,
    format: CheckpointFormat,
}

impl RunDirs {
    /// Timestamped run directory.
    #[must_use]
    pub fn run(&self) -> &Path {
        &self.run
    }

    /// Rolling `_last` directory.
    #[must_use]
    pub fn last(&self) -> &Path {
        &self.last
    }

    /// Writes `config.json` into both directories.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Config`] if serialization or writing fails.
    pub fn write_config(&self, config: &RobotConfig) -> Result<()> {
        for dir in [&self.run, &self.last] {
            config.save(dir.join(CONFIG_FILE))?;
        }
        Ok(())
    }

    /// Writes `epoch_<N>` and `last` into both directories.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Model`] if a checkpoint cannot be written.
    pub fn save_epoch<B, M>(&self, model: &M, epoch: usize) -> Result<()>
    where
        B: Backend,
        M: Module<B>,
    {
        for dir in [&self.run, &self.last] {
            save_checkpoint::<B, M>(model, dir, &epoch_stem(epoch), self.format)?;
            save_checkpoint::<B, M>(model, dir, LAST_STEM, self.format)?;
        }
        Ok(())
    }
}
