//! Kinematics engine contract.
//!
//! The adapter only depends on this trait, so any simulator or kinematics
//! library can back it. [`KinematicTree`](crate::KinematicTree) is the
//! in-crate implementation.

use nalgebra::Isometry3;
use retarget_types::JointLimit;

use crate::error::Result;

/// A forward-kinematics provider working in its own native joint order.
pub trait KinematicsEngine {
    /// Names of the active (movable) joints, in engine order.
    fn active_joint_names(&self) -> Vec<String>;

    /// Native position limits of each active joint, in engine order.
    fn native_limits(&self) -> Vec<JointLimit>;

    /// Index of a link by name.
    fn link_index(&self, name: &str) -> Option<usize>;

    /// Engine-order indices of the active joints between the root and a link.
    fn link_joints(&self, link: usize) -> Vec<usize>;

    /// World poses of every link, indexed by link index.
    ///
    /// # Errors
    ///
    /// Returns an error if `q` does not have one entry per active joint.
    fn link_poses(&self, q: &[f64]) -> Result<Vec<Isometry3<f64>>>;

    /// Number of active joints.
    fn active_joint_count(&self) -> usize {
        self.active_joint_names().len()
    }
}
