//! Two-phase training of learned hand retargeting.
//!
//! The forward surrogate is fitted first, by regression on a synthetic
//! kinematics dataset. The inverse solver is then fitted to human fingertip
//! points through the frozen surrogate, under a weighted sum of geometric
//! losses.
//!
//! # Training
//!
//! - [`RetargetTrainer`] - Phase state machine, dataset caching, both fits
//! - [`TrainerConfig`] - Dataset size, per-phase fit settings, loss weights
//! - [`FrozenSurrogate`] - Forward model with no parameter gradients
//!
//! # Losses
//!
//! - [`LossComposition`] - Ordered, weighted, individually switchable terms
//! - [`chamfer_loss`], [`direction_loss`], [`curvature_loss`],
//!   [`pinch_loss`], [`collision_loss`], [`joint_limit_loss`]
//!
//! # Persistence
//!
//! - [`CheckpointStore`] - Dataset cache, surrogate weights, run directories
//! - [`TrainingMetrics`] - Per-epoch losses and timings
//!
//! # Layer 1 Crate
//!
//! Depends on the kinematics adapter, dataset and model crates. Training
//! runs on any Burn `AutodiffBackend`; tests use `Autodiff<NdArray>`.
//!
//! # Example
//!
//! ```ignore
//! use burn::backend::Autodiff;
//! use burn_ndarray::NdArray;
//! use retarget_training::prelude::*;
//!
//! let mut trainer = RetargetTrainer::<Autodiff<NdArray<f32>>, _>::new(
//!     adapter,
//!     CheckpointStore::new("/srv/retarget"),
//!     TrainerConfig::default(),
//!     Default::default(),
//! )?;
//! let outcome = trainer.train(&motion, "")?;
//! assert_eq!(trainer.phase(), TrainingPhase::Ready);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

mod config;
mod error;
mod loss;
mod metrics;
mod storage;
mod surrogate;
mod trainer;

pub use config::{
    DatasetConfig, ForwardFitConfig, InverseFitConfig, OptimizerConfig, OptimizerType,
    TrainerConfig,
};
pub use error::{Result, TrainingError};
pub use loss::{
    CURVATURE_SCALE, DIRECTION_SCALE_MIN, DIRECTION_SCALE_RANGE, LossComposition, LossKind,
    LossTerm, LossWeights, PINCH_THRESHOLD, chamfer_distance, chamfer_loss, collision_loss,
    curvature_loss, direction_loss, format_loss, joint_limit_loss, pinch_loss,
};
pub use metrics::{EpochMetrics, LossBreakdown, TrainingMetrics};
pub use storage::{CONFIG_FILE, CheckpointStore, LAST_STEM, RUN_TIMESTAMP_FORMAT, RunDirs, epoch_stem};
pub use surrogate::FrozenSurrogate;
pub use trainer::{RetargetTrainer, TrainingOutcome, TrainingPhase};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        CheckpointStore, ForwardFitConfig, InverseFitConfig, LossComposition, LossKind,
        LossWeights, OptimizerConfig, RetargetTrainer, TrainerConfig, TrainingError,
        TrainingMetrics, TrainingOutcome, TrainingPhase,
    };
}
