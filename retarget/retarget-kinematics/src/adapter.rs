//! Kinematics adapter.
//!
//! Bridges the user-facing joint order of a [`RobotConfig`] to a
//! [`KinematicsEngine`]: resolves the joint permutation, applies clip
//! ratios to the native limits, extracts fingertip keypoints in the base
//! frame and forwards clamped drive targets to an [`ActuationSink`].

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};
use retarget_types::{
    ConfigError, HandFormatter, JointLimit, JointLimits, JointPermutation, KeypointInfo,
    KeypointSample, RobotConfig, TARGET_MARGIN,
};
use tracing::{debug, info, warn};

use crate::engine::KinematicsEngine;
use crate::error::{KinematicsError, Result};

// ============================================================================
// Actuation
// ============================================================================

/// Receiver of joint drive targets in engine order.
pub trait ActuationSink {
    /// Commands new drive targets.
    fn set_drive_targets(&mut self, targets: &[f64]);
}

/// Sink that keeps every command it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    commands: Vec<Vec<f64>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All received commands, oldest first.
    #[must_use]
    pub fn commands(&self) -> &[Vec<f64>] {
        &self.commands
    }

    /// Most recent command.
    #[must_use]
    pub fn last(&self) -> Option<&[f64]> {
        self.commands.last().map(Vec::as_slice)
    }
}

impl ActuationSink for RecordingSink {
    fn set_drive_targets(&mut self, targets: &[f64]) {
        self.commands.push(targets.to_vec());
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Robot hand kinematics in user joint order.
#[derive(Debug, Clone)]
pub struct KinematicsAdapter<E> {
    engine: E,
    config: RobotConfig,
    info: KeypointInfo,
    permutation: JointPermutation,
    native: JointLimits,
    limits: JointLimits,
    base_link: usize,
    fingertip_links: Vec<usize>,
    target: Vec<f64>,
}

impl<E: KinematicsEngine> KinematicsAdapter<E> {
    /// Binds a robot configuration to an engine.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::Config`] if the configuration is invalid,
    /// names a joint or link the engine does not have, or clips a joint to
    /// an empty range.
    pub fn new(config: RobotConfig, engine: E) -> Result<Self> {
        let info = config.keypoint_info()?;

        let engine_names = engine.active_joint_names();
        let permutation = JointPermutation::from_names(&config.joint_order, &engine_names)?;
        debug!(
            user_to_engine = ?permutation.user_to_engine(),
            engine_to_user = ?permutation.engine_to_user(),
            "Resolved joint permutation"
        );

        let base_link = engine
            .link_index(&config.base_link)
            .ok_or_else(|| ConfigError::UnknownLink(config.base_link.clone()))?;
        let fingertip_links = info
            .descriptors
            .iter()
            .map(|d| {
                engine
                    .link_index(&d.link)
                    .ok_or_else(|| KinematicsError::Config(ConfigError::UnknownLink(d.link.clone())))
            })
            .collect::<Result<Vec<_>>>()?;

        for (descriptor, &link) in info.descriptors.iter().zip(&fingertip_links) {
            let chain: Vec<usize> = engine
                .link_joints(link)
                .into_iter()
                .map(|slot| permutation.engine_to_user()[slot])
                .collect();
            for &joint in &descriptor.joints {
                if !chain.contains(&joint) {
                    warn!(
                        finger = %descriptor.name,
                        joint = %config.joint_order[joint],
                        "Joint does not move its fingertip link"
                    );
                }
            }
        }

        let native_engine = engine.native_limits();
        if native_engine.len() != permutation.len() {
            return Err(KinematicsError::dimension_mismatch(
                permutation.len(),
                native_engine.len(),
            ));
        }
        let native = JointLimits::new(permutation.to_user(&native_engine));

        let mut clipped = Vec::with_capacity(native.len());
        for (name, limit) in config.joint_order.iter().zip(native.iter()) {
            limit.validate(name)?;
            let resolved = match config.clip_ratio(name)? {
                Some(ratio) => {
                    let c = limit.clipped(ratio);
                    c.validate(name)?;
                    info!(
                        joint = %name,
                        native_lower = limit.lower,
                        native_upper = limit.upper,
                        lower = c.lower,
                        upper = c.upper,
                        "Clipped joint range"
                    );
                    c
                }
                None => *limit,
            };
            clipped.push(resolved);
        }
        let limits = JointLimits::new(clipped);
        let target = limits.midpoints();

        Ok(Self {
            engine,
            config,
            info,
            permutation,
            native,
            limits,
            base_link,
            fingertip_links,
            target,
        })
    }

    /// Number of controllable joints.
    #[must_use]
    pub fn dof(&self) -> usize {
        self.config.dof()
    }

    /// Joint limits after clip-ratio shrinkage, in user order.
    #[must_use]
    pub const fn joint_limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Native engine limits, in user order.
    #[must_use]
    pub const fn native_limits(&self) -> &JointLimits {
        &self.native
    }

    /// Normalizer over the clipped limits.
    #[must_use]
    pub fn formatter(&self) -> HandFormatter {
        HandFormatter::new(&self.limits)
    }

    /// The robot configuration.
    #[must_use]
    pub const fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Configuration snapshot carrying the resolved limits.
    #[must_use]
    pub fn resolved_config(&self) -> RobotConfig {
        self.config.with_resolved_limits(&self.limits)
    }

    /// Fingertip descriptors with user-order joint indices.
    #[must_use]
    pub const fn keypoint_info(&self) -> &KeypointInfo {
        &self.info
    }

    /// Fingertip names in descriptor order.
    #[must_use]
    pub fn keypoint_names(&self) -> Vec<String> {
        self.info.descriptors.iter().map(|d| d.name.clone()).collect()
    }

    /// User/engine joint permutation.
    #[must_use]
    pub const fn permutation(&self) -> &JointPermutation {
        &self.permutation
    }

    /// The underlying engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Current drive target in user order.
    #[must_use]
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Fingertip positions in the base frame, in descriptor order.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DimensionMismatch`] if `q` does not have
    /// one entry per joint.
    #[allow(clippy::cast_possible_truncation)]
    pub fn keypoint_vector(&self, q: &[f64]) -> Result<Vec<KeypointSample>> {
        if q.len() != self.dof() {
            return Err(KinematicsError::dimension_mismatch(self.dof(), q.len()));
        }
        let poses = self.engine.link_poses(&self.permutation.to_engine(q))?;
        let base_inv = poses[self.base_link].inverse();
        Ok(self
            .info
            .descriptors
            .iter()
            .zip(&self.fingertip_links)
            .map(|(d, &link)| {
                let world = poses[link] * Point3::from(Vector3::from(d.offset));
                let p = base_inv * world;
                [p.x as f32, p.y as f32, p.z as f32]
            })
            .collect())
    }

    /// Fingertip positions keyed by fingertip name.
    ///
    /// # Errors
    ///
    /// As [`Self::keypoint_vector`].
    pub fn keypoints(&self, q: &[f64]) -> Result<BTreeMap<String, KeypointSample>> {
        let points = self.keypoint_vector(q)?;
        Ok(self
            .info
            .descriptors
            .iter()
            .map(|d| d.name.clone())
            .zip(points)
            .collect())
    }

    /// Exact forward kinematics of a batch of configurations.
    ///
    /// # Errors
    ///
    /// As [`Self::keypoint_vector`], for the first failing row.
    pub fn keypoints_batch(&self, qs: &[Vec<f64>]) -> Result<Vec<Vec<KeypointSample>>> {
        qs.iter().map(|q| self.keypoint_vector(q)).collect()
    }

    /// Clamps `q` strictly inside the limits and forwards it to the sink.
    ///
    /// Returns the clamped target in user order.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::DimensionMismatch`] for a wrong-length `q`.
    pub fn set_target<S: ActuationSink + ?Sized>(
        &mut self,
        q: &[f64],
        sink: &mut S,
    ) -> Result<Vec<f64>> {
        if q.len() != self.dof() {
            return Err(KinematicsError::dimension_mismatch(self.dof(), q.len()));
        }
        self.target = self.limits.clamp_inside(q, TARGET_MARGIN);
        sink.set_drive_targets(&self.permutation.to_engine(&self.target));
        Ok(self.target.clone())
    }

    /// Sends the mid-range target to the sink.
    pub fn reset<S: ActuationSink + ?Sized>(&mut self, sink: &mut S) {
        self.target = self.limits.midpoints();
        sink.set_drive_targets(&self.permutation.to_engine(&self.target));
    }

    /// Clipped limit of a joint by name.
    #[must_use]
    pub fn joint_limit(&self, name: &str) -> Option<JointLimit> {
        self.config
            .joint_index(name)
            .and_then(|i| self.limits.get(i).copied())
    }
}
