//! Serving-time retargeting from trained checkpoints.
//!
//! A [`RetargetingModel`] pairs the trained inverse solver with the
//! configuration snapshot written next to it: resolved joint limits for
//! unnormalization and the human skeleton index of every fingertip.
//!
//! - [`RetargetingModel::load`] - Explicit weight and `config.json` paths
//! - [`load_model`] - Newest run matching a tag under a [`CheckpointStore`]
//!
//! # Layer 1 Crate
//!
//! Runs on any Burn backend; no autodiff required.
//!
//! [`CheckpointStore`]: retarget_training::CheckpointStore

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod model;

pub use error::{InferenceError, Result};
pub use model::{RetargetingModel, load_model, load_model_with_network};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{InferenceError, RetargetingModel, load_model};
}
