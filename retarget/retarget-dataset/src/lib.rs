//! Training data for learned hand retargeting.
//!
//! # Robot Side
//!
//! - [`RobotKinematicsDataset`] - Uniformly sampled `(qpos, keypoints)` pairs, cached as `RKD1`
//!
//! # Human Side
//!
//! - [`HumanMotion`] - Canonical 21-point skeleton sequences (`.npy` or in memory)
//! - [`HumanPointCloud`] / [`PointBatch`] - Per-finger point clouds of fixed size
//! - [`voxel_downsample`] / [`upsample`] / [`resample`] - Density-bias removal
//! - [`NumericWarning`] / [`check_unit_scale`] - Unit-scale sanity check
//!
//! # Layer 0 Crate
//!
//! No tensor backend; batches are flat `f32` buffers ready to be wrapped by
//! the training crate.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod human;
mod pointcloud;
mod resample;
mod robot;

pub use error::{DatasetError, Result};
pub use human::{
    HumanFrame, HumanMotion, NumericWarning, UNIT_SPAN_LIMIT, check_unit_scale, point_span,
};
pub use pointcloud::{HumanPointCloud, PointBatch};
pub use resample::{resample, upsample, voxel_downsample};
pub use robot::{RKD_HEADER_SIZE, RKD_MAGIC, RKD_VERSION, RobotKinematicsDataset};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        DatasetError, HumanMotion, HumanPointCloud, NumericWarning, PointBatch,
        RobotKinematicsDataset,
    };
}
