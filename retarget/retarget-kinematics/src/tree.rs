//! Pure-Rust kinematic tree engine.
//!
//! A tree of named links connected by fixed, revolute or prismatic joints.
//! Joint origins use the URDF convention: translation `xyz` followed by a
//! fixed-axis roll-pitch-yaw rotation, then the joint motion about `axis`.

use std::path::Path;

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use retarget_types::JointLimit;
use serde::{Deserialize, Serialize};

use crate::engine::KinematicsEngine;
use crate::error::{KinematicsError, Result};

// ============================================================================
// Description types
// ============================================================================

/// Joint motion type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    /// Rigid connection.
    Fixed,
    /// Rotation about the joint axis (radians).
    Revolute,
    /// Translation along the joint axis (meters).
    Prismatic,
}

impl JointKind {
    /// Returns true for joints that carry a degree of freedom.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Fixed)
    }
}

/// Placement of a joint frame relative to its parent link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// Translation in meters.
    pub xyz: Vector3<f64>,
    /// Fixed-axis roll, pitch, yaw in radians.
    pub rpy: Vector3<f64>,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            xyz: Vector3::zeros(),
            rpy: Vector3::zeros(),
        }
    }
}

impl Origin {
    /// Origin at a position with identity rotation.
    #[must_use]
    pub fn from_xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            xyz: Vector3::new(x, y, z),
            rpy: Vector3::zeros(),
        }
    }

    /// Origin from position and roll-pitch-yaw.
    #[must_use]
    pub const fn new(xyz: Vector3<f64>, rpy: Vector3<f64>) -> Self {
        Self { xyz, rpy }
    }

    /// Rigid transform of this origin.
    #[must_use]
    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.xyz),
            UnitQuaternion::from_euler_angles(self.rpy.x, self.rpy.y, self.rpy.z),
        )
    }
}

fn default_axis() -> Vector3<f64> {
    Vector3::z()
}

/// A joint connecting a parent link to a child link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeJoint {
    /// Joint name.
    pub name: String,
    /// Motion type.
    pub kind: JointKind,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Joint frame relative to the parent link.
    #[serde(default)]
    pub origin: Origin,
    /// Motion axis in the joint frame.
    #[serde(default = "default_axis")]
    pub axis: Vector3<f64>,
    /// Position limits, required for active joints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<JointLimit>,
}

impl TreeJoint {
    /// Creates a fixed joint.
    #[must_use]
    pub fn fixed(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
        origin: Origin,
    ) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Fixed,
            parent: parent.into(),
            child: child.into(),
            origin,
            axis: default_axis(),
            limit: None,
        }
    }

    /// Creates a revolute joint.
    #[must_use]
    pub fn revolute(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
        origin: Origin,
        axis: Vector3<f64>,
        limit: JointLimit,
    ) -> Self {
        Self {
            name: name.into(),
            kind: JointKind::Revolute,
            parent: parent.into(),
            child: child.into(),
            origin,
            axis,
            limit: Some(limit),
        }
    }

    /// Creates a prismatic joint.
    #[must_use]
    pub fn prismatic(
        name: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
        origin: Origin,
        axis: Vector3<f64>,
        limit: JointLimit,
    ) -> Self {
        Self {
            kind: JointKind::Prismatic,
            ..Self::revolute(name, parent, child, origin, axis, limit)
        }
    }

    fn motion(&self, position: f64) -> Isometry3<f64> {
        match self.kind {
            JointKind::Fixed => Isometry3::identity(),
            JointKind::Revolute => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.axis), position),
            ),
            JointKind::Prismatic => Isometry3::from_parts(
                Translation3::from(self.axis * position),
                UnitQuaternion::identity(),
            ),
        }
    }
}

/// Serializable description of a kinematic tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeDescription {
    /// Model name.
    pub name: String,
    /// Root link name.
    pub root: String,
    /// All link names.
    pub links: Vec<String>,
    /// All joints.
    pub joints: Vec<TreeJoint>,
}

// ============================================================================
// Engine
// ============================================================================

/// Validated kinematic tree implementing [`KinematicsEngine`].
///
/// Active joints are ordered by their declaration order in the description.
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use retarget_kinematics::{KinematicTree, KinematicsEngine, Origin, TreeDescription, TreeJoint};
/// use retarget_types::JointLimit;
///
/// let tree = KinematicTree::new(TreeDescription {
///     name: "arm".into(),
///     root: "base".into(),
///     links: vec!["base".into(), "tip".into()],
///     joints: vec![TreeJoint::revolute(
///         "j0", "base", "tip", Origin::default(), Vector3::z(), JointLimit::new(-1.0, 1.0),
///     )],
/// })
/// .unwrap();
///
/// assert_eq!(tree.active_joint_names(), vec!["j0".to_string()]);
/// let poses = tree.link_poses(&[0.5]).unwrap();
/// assert_eq!(poses.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct KinematicTree {
    description: TreeDescription,
    /// Joint whose child is each link (`None` for the root).
    parent_joint: Vec<Option<usize>>,
    /// Parent link index of each joint.
    joint_parent: Vec<usize>,
    /// Engine slot of each joint (`None` for fixed joints).
    joint_slot: Vec<Option<usize>>,
    /// Active joint indices in engine order.
    active: Vec<usize>,
    /// Links ordered so every parent precedes its children.
    order: Vec<usize>,
}

impl KinematicTree {
    /// Validates a description and builds the engine.
    ///
    /// # Errors
    ///
    /// - [`KinematicsError::InvalidTree`] for duplicate or unknown links, a
    ///   link with two parents, a zero motion axis, or links unreachable from
    ///   the root
    /// - [`KinematicsError::MissingLimit`] for an active joint without limits
    /// - [`KinematicsError::Config`] for an empty limit range
    pub fn new(mut description: TreeDescription) -> Result<Self> {
        let links = &description.links;
        for (i, name) in links.iter().enumerate() {
            if links[..i].contains(name) {
                return Err(KinematicsError::invalid_tree(format!("duplicate link {name}")));
            }
        }
        let find = |name: &str| -> Result<usize> {
            links
                .iter()
                .position(|l| l == name)
                .ok_or_else(|| KinematicsError::invalid_tree(format!("unknown link {name}")))
        };
        let root = find(&description.root)?;

        let mut parent_joint = vec![None; links.len()];
        let mut joint_parent = Vec::with_capacity(description.joints.len());
        let mut joint_slot = Vec::with_capacity(description.joints.len());
        let mut active = Vec::new();

        for (j, joint) in description.joints.iter().enumerate() {
            let parent = find(&joint.parent)?;
            let child = find(&joint.child)?;
            if child == root {
                return Err(KinematicsError::invalid_tree(format!(
                    "joint {} targets the root link",
                    joint.name
                )));
            }
            if parent_joint[child].is_some() {
                return Err(KinematicsError::invalid_tree(format!(
                    "link {} has more than one parent joint",
                    joint.child
                )));
            }
            parent_joint[child] = Some(j);
            joint_parent.push(parent);

            if joint.kind.is_active() {
                let limit = joint
                    .limit
                    .ok_or_else(|| KinematicsError::MissingLimit(joint.name.clone()))?;
                limit.validate(&joint.name)?;
                if joint.axis.norm() < 1e-10 {
                    return Err(KinematicsError::invalid_tree(format!(
                        "joint {} has a zero axis",
                        joint.name
                    )));
                }
                joint_slot.push(Some(active.len()));
                active.push(j);
            } else {
                joint_slot.push(None);
            }
        }

        for joint in &mut description.joints {
            if joint.kind.is_active() {
                joint.axis = joint.axis.normalize();
            }
        }

        // Breadth-first from the root; parents always precede children.
        let mut order = vec![root];
        let mut head = 0;
        while head < order.len() {
            let link = order[head];
            head += 1;
            for (j, &parent) in joint_parent.iter().enumerate() {
                if parent == link {
                    let child = find(&description.joints[j].child)?;
                    if !order.contains(&child) {
                        order.push(child);
                    }
                }
            }
        }
        if order.len() != description.links.len() {
            return Err(KinematicsError::invalid_tree(format!(
                "{} of {} links are unreachable from root {}",
                description.links.len() - order.len(),
                description.links.len(),
                description.root
            )));
        }

        Ok(Self {
            description,
            parent_joint,
            joint_parent,
            joint_slot,
            active,
            order,
        })
    }

    /// Parses and validates a JSON description.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::InvalidTree`] for malformed JSON, otherwise
    /// as [`Self::new`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Loads a JSON description from disk.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::Io`] if the file cannot be read, otherwise
    /// as [`Self::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// Link names.
    #[must_use]
    pub fn link_names(&self) -> &[String] {
        &self.description.links
    }

    /// The validated description.
    #[must_use]
    pub const fn description(&self) -> &TreeDescription {
        &self.description
    }
}

impl KinematicsEngine for KinematicTree {
    fn active_joint_names(&self) -> Vec<String> {
        self.active
            .iter()
            .map(|&j| self.description.joints[j].name.clone())
            .collect()
    }

    fn native_limits(&self) -> Vec<JointLimit> {
        self.active
            .iter()
            .filter_map(|&j| self.description.joints[j].limit)
            .collect()
    }

    fn link_index(&self, name: &str) -> Option<usize> {
        self.description.links.iter().position(|l| l == name)
    }

    fn link_joints(&self, link: usize) -> Vec<usize> {
        let mut slots = Vec::new();
        let mut current = link;
        while let Some(j) = self.parent_joint.get(current).copied().flatten() {
            if let Some(slot) = self.joint_slot[j] {
                slots.push(slot);
            }
            current = self.joint_parent[j];
        }
        slots.reverse();
        slots
    }

    fn link_poses(&self, q: &[f64]) -> Result<Vec<Isometry3<f64>>> {
        if q.len() != self.active.len() {
            return Err(KinematicsError::dimension_mismatch(self.active.len(), q.len()));
        }
        let mut poses = vec![Isometry3::identity(); self.description.links.len()];
        for &link in &self.order {
            let Some(j) = self.parent_joint[link] else {
                continue;
            };
            let joint = &self.description.joints[j];
            let position = self.joint_slot[j].map_or(0.0, |slot| q[slot]);
            poses[link] =
                poses[self.joint_parent[j]] * joint.origin.isometry() * joint.motion(position);
        }
        Ok(poses)
    }

    fn active_joint_count(&self) -> usize {
        self.active.len()
    }
}
