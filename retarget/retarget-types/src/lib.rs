//! Data model for learned hand retargeting.
//!
//! This crate holds the types shared by every stage of the retargeting
//! pipeline:
//!
//! # Robot Description
//!
//! - [`RobotConfig`] - Hand configuration (joint order, fingertips, clip ratios)
//! - [`FingertipDescriptor`] / [`KeypointInfo`] - Fingertips with resolved joint indices
//! - [`JointPermutation`] - User-order / engine-order joint bijection
//!
//! # Joint Ranges
//!
//! - [`JointLimit`] / [`JointLimits`] - Per-joint position ranges
//! - [`ClipRatio`] - Fractional shrinkage of a native range
//! - [`HandFormatter`] - Linear rescale between physical units and `[-1, 1]`
//!
//! # Keypoints
//!
//! - [`KeypointSample`] - 3D point in the robot base frame
//! - [`HumanKeypoint`] - Landmarks of the 21-point human hand
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies** and no tensor
//! backend. It can be used in:
//! - Training pipelines
//! - Inference servers
//! - Configuration tooling
//!
//! # Quality Standards
//!
//! - Zero clippy/doc warnings
//! - Zero `unwrap`/`expect` in library code

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod formatter;
mod joint;
mod keypoint;
mod permutation;

pub use config::{
    FingertipConfig, FingertipDescriptor, KeypointInfo, ResolvedJointLimits, RobotConfig,
};
pub use error::{ConfigError, Result};
pub use formatter::HandFormatter;
pub use joint::{ClipRatio, JointLimit, JointLimits, TARGET_MARGIN};
pub use keypoint::{HUMAN_KEYPOINT_COUNT, HumanKeypoint, KeypointSample, squared_distance};
pub use permutation::JointPermutation;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ClipRatio, ConfigError, FingertipDescriptor, HandFormatter, HumanKeypoint, JointLimit,
        JointLimits, JointPermutation, KeypointInfo, KeypointSample, RobotConfig,
    };
}
