//! Burn networks for learned hand retargeting.
//!
//! Both directions are finger-decomposed: one small network per fingertip,
//! composed into full-hand mappings by gathering (forward) or scattering
//! (inverse) joint columns.
//!
//! # Networks
//!
//! - [`FingerFk`] / [`FingerIk`] - Per-finger sub-networks over a shared [`FingerMlp`] body
//! - [`FkModel`] - Forward surrogate, `[batch, dof] -> [batch, fingers, 3]`
//! - [`IkModel`] - Inverse solver, `[batch, fingers, 3] -> [batch, dof]` in `[-1, 1]`
//! - [`HandTopology`] - Finger-to-joint assignment
//!
//! # Checkpoint Persistence
//!
//! - [`save_checkpoint`] / [`load_checkpoint`] - Burn recorders, atomic replace
//! - [`CheckpointFormat`] - Binary (default) or pretty JSON
//!
//! # Layer 0 Crate
//!
//! Models are generic over Burn backends. Tests run on `burn-ndarray`;
//! training wraps it in `Autodiff`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod checkpoint;
mod error;
mod finger;
mod hand;
mod topology;

pub use checkpoint::{CheckpointFormat, checkpoint_path, load_checkpoint, save_checkpoint};
pub use error::{ModelError, Result};
pub use finger::{FingerFk, FingerIk, FingerMlp, FingerNetConfig};
pub use hand::{FkModel, IkModel};
pub use topology::HandTopology;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        CheckpointFormat, FingerNetConfig, FkModel, HandTopology, IkModel, ModelError,
        load_checkpoint, save_checkpoint,
    };
}
