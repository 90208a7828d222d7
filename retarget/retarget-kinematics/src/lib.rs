//! Robot hand kinematics for retargeting.
//!
//! This crate provides:
//!
//! - [`KinematicsEngine`] - Contract for any forward-kinematics provider
//! - [`KinematicTree`] - Pure-Rust tree engine (fixed / revolute / prismatic joints)
//! - [`KinematicsAdapter`] - User-order joints, clipped limits, base-frame fingertip keypoints
//! - [`ActuationSink`] / [`RecordingSink`] - Drive target output
//!
//! # Example
//!
//! ```
//! use nalgebra::Vector3;
//! use retarget_kinematics::{KinematicTree, KinematicsAdapter, Origin, TreeDescription, TreeJoint};
//! use retarget_types::{FingertipConfig, JointLimit, RobotConfig};
//!
//! let tree = KinematicTree::new(TreeDescription {
//!     name: "one".into(),
//!     root: "palm".into(),
//!     links: vec!["palm".into(), "tip".into()],
//!     joints: vec![TreeJoint::revolute(
//!         "j0", "palm", "tip", Origin::from_xyz(0.0, 0.0, 0.1), Vector3::x(),
//!         JointLimit::new(0.0, 1.5),
//!     )],
//! })
//! .unwrap();
//!
//! let config = RobotConfig {
//!     name: "one".into(),
//!     urdf_path: String::new(),
//!     base_link: "palm".into(),
//!     joint_order: vec!["j0".into()],
//!     fingertips: vec![FingertipConfig {
//!         name: "tip".into(),
//!         link: "tip".into(),
//!         joints: vec!["j0".into()],
//!         center_offset: [0.0, 0.0, 0.05],
//!         human_hand_id: 8,
//!     }],
//!     joint_range_clip_ratio: Default::default(),
//!     joint: None,
//!     hidden: None,
//! };
//!
//! let adapter = KinematicsAdapter::new(config, tree).unwrap();
//! let points = adapter.keypoints(&[0.0]).unwrap();
//! assert!((points["tip"][2] - 0.15).abs() < 1e-6);
//! ```
//!
//! # Layer 0 Crate
//!
//! No simulator, renderer or tensor backend. URDF parsing is left to the
//! caller; any parser can populate a [`TreeDescription`] or implement
//! [`KinematicsEngine`] directly.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod adapter;
mod engine;
mod error;
mod tree;

pub use adapter::{ActuationSink, KinematicsAdapter, RecordingSink};
pub use engine::KinematicsEngine;
pub use error::{KinematicsError, Result};
pub use tree::{JointKind, KinematicTree, Origin, TreeDescription, TreeJoint};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ActuationSink, KinematicTree, KinematicsAdapter, KinematicsEngine, KinematicsError,
        RecordingSink, TreeDescription, TreeJoint,
    };
}
