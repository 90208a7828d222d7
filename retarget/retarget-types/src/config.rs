//! Robot hand configuration.
//!
//! The JSON layout matches the hand configuration files used by the
//! retargeting tools, e.g.
//!
//! ```json
//! {
//!     "name": "allegro_right",
//!     "urdf_path": "./assets/allegro_right/allegro_hand_right.urdf",
//!     "base_link": "base_link",
//!     "joint_order": ["joint_0.0", "joint_1.0"],
//!     "fingertip_link": [
//!         {
//!             "name": "index",
//!             "link": "link_3.0_tip",
//!             "joint": ["joint_0.0", "joint_1.0"],
//!             "center_offset": [0.0, 0.0, -0.005],
//!             "human_hand_id": 8
//!         }
//!     ],
//!     "joint_range_clip_ratio": { "joint_0.0": [0.1, 0.9] }
//! }
//! ```
//!
//! Checkpoint snapshots additionally carry the resolved limits under
//! `"joint": {"lower": [...], "upper": [...]}` and the hidden width of the
//! trained network under `"hidden"`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::joint::{ClipRatio, JointLimits};
use crate::keypoint::HUMAN_KEYPOINT_COUNT;

/// One fingertip entry as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingertipConfig {
    /// Display name (`index`, `thumb`, ...).
    pub name: String,
    /// Kinematic link the keypoint is attached to.
    pub link: String,
    /// Names of the joints driving this fingertip.
    #[serde(rename = "joint")]
    pub joints: Vec<String>,
    /// Offset of the keypoint in the link frame.
    pub center_offset: [f64; 3],
    /// Corresponding index in the 21-point human skeleton.
    pub human_hand_id: usize,
}

/// Resolved joint limits embedded in checkpoint snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedJointLimits {
    /// Lower bounds in user order.
    pub lower: Vec<f64>,
    /// Upper bounds in user order.
    pub upper: Vec<f64>,
}

/// A fingertip with its joint names resolved to user-order indices.
///
/// The descriptors of a hand partition its joints into disjoint groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingertipDescriptor {
    /// Display name.
    pub name: String,
    /// Kinematic link name.
    pub link: String,
    /// User-order indices of the driving joints.
    pub joints: Vec<usize>,
    /// Offset in the link frame.
    pub offset: [f64; 3],
    /// Index into the human skeleton.
    pub human_id: usize,
}

/// Resolved per-fingertip information for a hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointInfo {
    /// Descriptors in configuration order.
    pub descriptors: Vec<FingertipDescriptor>,
    /// Total number of joints (D).
    pub dof: usize,
}

impl KeypointInfo {
    /// Number of fingertips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no fingertips are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Link names in descriptor order.
    #[must_use]
    pub fn links(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.link.clone()).collect()
    }

    /// Joint index groups in descriptor order.
    #[must_use]
    pub fn joint_groups(&self) -> Vec<Vec<usize>> {
        self.descriptors.iter().map(|d| d.joints.clone()).collect()
    }

    /// Human skeleton ids in descriptor order.
    #[must_use]
    pub fn human_ids(&self) -> Vec<usize> {
        self.descriptors.iter().map(|d| d.human_id).collect()
    }
}

/// Robot hand configuration.
///
/// # Example
///
/// ```
/// use retarget_types::RobotConfig;
///
/// let json = r#"{
///     "name": "toy",
///     "urdf_path": "toy.urdf",
///     "base_link": "palm",
///     "joint_order": ["a", "b"],
///     "fingertip_link": [
///         {"name": "f", "link": "tip", "joint": ["b", "a"],
///          "center_offset": [0.0, 0.0, 0.0], "human_hand_id": 8}
///     ]
/// }"#;
/// let config = RobotConfig::from_json_str(json).unwrap();
/// let info = config.keypoint_info().unwrap();
/// assert_eq!(info.joint_groups(), vec![vec![1, 0]]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Hand name, used to key caches and checkpoints.
    pub name: String,
    /// Path of the kinematic model description.
    pub urdf_path: String,
    /// Link whose frame all keypoints are expressed in.
    pub base_link: String,
    /// Controllable joints in user order.
    pub joint_order: Vec<String>,
    /// Fingertip descriptors.
    #[serde(rename = "fingertip_link")]
    pub fingertips: Vec<FingertipConfig>,
    /// Optional per-joint `[low, high]` clip ratios.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub joint_range_clip_ratio: BTreeMap<String, [f64; 2]>,
    /// Resolved limits (checkpoint snapshots only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint: Option<ResolvedJointLimits>,
    /// Hidden width of the trained network (checkpoint snapshots only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<usize>,
}

impl RobotConfig {
    /// Parses a configuration from JSON text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] on JSON errors and any validation
    /// error from [`Self::validate`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::Io(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Writes the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Number of controllable joints (D).
    #[must_use]
    pub fn dof(&self) -> usize {
        self.joint_order.len()
    }

    /// User-order index of a joint.
    #[must_use]
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joint_order.iter().position(|j| j == name)
    }

    /// Validated clip ratio for a joint, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidClipRatio`] for an invalid ratio.
    pub fn clip_ratio(&self, joint: &str) -> Result<Option<ClipRatio>> {
        self.joint_range_clip_ratio
            .get(joint)
            .map(|&[low, high]| ClipRatio::new(joint, low, high))
            .transpose()
    }

    /// Checks structural consistency.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Malformed`] for an empty joint order or no fingertips
    /// - [`ConfigError::DuplicateJoint`] for repeated names in `joint_order`
    /// - [`ConfigError::UnknownJoint`] for a finger or clip-ratio joint not in
    ///   `joint_order`
    /// - [`ConfigError::OverlappingFingers`] if two fingertips share a joint
    /// - [`ConfigError::HumanIdOutOfRange`] for a human id `>= 21`
    /// - [`ConfigError::InvalidClipRatio`] for a bad ratio
    /// - [`ConfigError::DimensionMismatch`] if resolved limits have the wrong
    ///   length
    /// - [`ConfigError::Malformed`] for a zero hidden width
    pub fn validate(&self) -> Result<()> {
        if self.joint_order.is_empty() {
            return Err(ConfigError::malformed("joint_order is empty"));
        }
        if self.fingertips.is_empty() {
            return Err(ConfigError::malformed("fingertip_link is empty"));
        }
        for (i, name) in self.joint_order.iter().enumerate() {
            if self.joint_order[..i].contains(name) {
                return Err(ConfigError::DuplicateJoint(name.clone()));
            }
        }

        let mut owner: Vec<Option<&str>> = vec![None; self.dof()];
        for tip in &self.fingertips {
            if tip.joints.is_empty() {
                return Err(ConfigError::malformed(format!(
                    "fingertip {} has no joints",
                    tip.name
                )));
            }
            if tip.human_hand_id >= HUMAN_KEYPOINT_COUNT {
                return Err(ConfigError::HumanIdOutOfRange {
                    finger: tip.name.clone(),
                    id: tip.human_hand_id,
                    max: HUMAN_KEYPOINT_COUNT,
                });
            }
            for joint in &tip.joints {
                let idx = self
                    .joint_index(joint)
                    .ok_or_else(|| ConfigError::UnknownJoint(joint.clone()))?;
                if let Some(first) = owner[idx] {
                    return Err(ConfigError::OverlappingFingers {
                        joint: joint.clone(),
                        first: first.to_string(),
                        second: tip.name.clone(),
                    });
                }
                owner[idx] = Some(tip.name.as_str());
            }
        }

        for joint in self.joint_range_clip_ratio.keys() {
            if self.joint_index(joint).is_none() {
                return Err(ConfigError::UnknownJoint(joint.clone()));
            }
            self.clip_ratio(joint)?;
        }

        if let Some(resolved) = &self.joint {
            for list in [&resolved.lower, &resolved.upper] {
                if list.len() != self.dof() {
                    return Err(ConfigError::dimension_mismatch(self.dof(), list.len()));
                }
            }
        }
        if self.hidden == Some(0) {
            return Err(ConfigError::malformed("hidden width is zero"));
        }
        Ok(())
    }

    /// Resolves fingertip joint names to user-order indices.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::validate`].
    pub fn keypoint_info(&self) -> Result<KeypointInfo> {
        self.validate()?;
        let descriptors = self
            .fingertips
            .iter()
            .map(|tip| {
                let joints = tip
                    .joints
                    .iter()
                    .map(|j| {
                        self.joint_index(j)
                            .ok_or_else(|| ConfigError::UnknownJoint(j.clone()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(FingertipDescriptor {
                    name: tip.name.clone(),
                    link: tip.link.clone(),
                    joints,
                    offset: tip.center_offset,
                    human_id: tip.human_hand_id,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(KeypointInfo {
            descriptors,
            dof: self.dof(),
        })
    }

    /// Returns a copy carrying the resolved joint limits.
    #[must_use]
    pub fn with_resolved_limits(&self, limits: &JointLimits) -> Self {
        let mut out = self.clone();
        out.joint = Some(ResolvedJointLimits {
            lower: limits.lowers(),
            upper: limits.uppers(),
        });
        out
    }

    /// Resolved limits stored in a checkpoint snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] if the snapshot carries no limits.
    pub fn resolved_limits(&self) -> Result<JointLimits> {
        let resolved = self
            .joint
            .as_ref()
            .ok_or_else(|| ConfigError::malformed("configuration has no resolved joint limits"))?;
        JointLimits::from_bounds(&resolved.lower, &resolved.upper)
    }

    /// Returns a copy recording the hidden width of the trained network.
    #[must_use]
    pub fn with_hidden_width(&self, hidden: usize) -> Self {
        Self {
            hidden: Some(hidden),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::JointLimit;

    fn sample() -> RobotConfig {
        RobotConfig {
            name: "toy".to_string(),
            urdf_path: "toy.urdf".to_string(),
            base_link: "palm".to_string(),
            joint_order: vec!["j0".into(), "j1".into(), "j2".into(), "j3".into()],
            fingertips: vec![
                FingertipConfig {
                    name: "index".into(),
                    link: "index_tip".into(),
                    joints: vec!["j0".into(), "j1".into()],
                    center_offset: [0.0, 0.0, -0.005],
                    human_hand_id: 8,
                },
                FingertipConfig {
                    name: "thumb".into(),
                    link: "thumb_tip".into(),
                    joints: vec!["j3".into(), "j2".into()],
                    center_offset: [0.0, 0.0, -0.005],
                    human_hand_id: 4,
                },
            ],
            joint_range_clip_ratio: BTreeMap::new(),
            joint: None,
            hidden: None,
        }
    }

    #[test]
    fn valid_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn keypoint_info_resolves_indices() {
        let info = sample().keypoint_info().unwrap();
        assert_eq!(info.len(), 2);
        assert_eq!(info.dof, 4);
        assert_eq!(info.joint_groups(), vec![vec![0, 1], vec![3, 2]]);
        assert_eq!(info.human_ids(), vec![8, 4]);
        assert_eq!(info.links(), vec!["index_tip", "thumb_tip"]);
    }

    #[test]
    fn unknown_finger_joint() {
        let mut config = sample();
        config.fingertips[0].joints.push("missing".into());
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownJoint("missing".into()))
        );
    }

    #[test]
    fn overlapping_fingers() {
        let mut config = sample();
        config.fingertips[1].joints.push("j1".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OverlappingFingers { .. })
        ));
    }

    #[test]
    fn duplicate_joint_order() {
        let mut config = sample();
        config.joint_order.push("j0".into());
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateJoint("j0".into()))
        );
    }

    #[test]
    fn human_id_out_of_range() {
        let mut config = sample();
        config.fingertips[0].human_hand_id = 21;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HumanIdOutOfRange { id: 21, .. })
        ));
    }

    #[test]
    fn invalid_clip_ratio_rejected() {
        let mut config = sample();
        config
            .joint_range_clip_ratio
            .insert("j0".into(), [0.8, 0.2]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidClipRatio { .. })
        ));
    }

    #[test]
    fn clip_ratio_on_unknown_joint() {
        let mut config = sample();
        config.joint_range_clip_ratio.insert("zz".into(), [0.1, 0.2]);
        assert_eq!(config.validate(), Err(ConfigError::UnknownJoint("zz".into())));
    }

    #[test]
    fn json_round_trip_keeps_field_names() {
        let mut config = sample();
        config.joint_range_clip_ratio.insert("j0".into(), [0.1, 0.9]);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("fingertip_link"));
        assert!(json.contains("human_hand_id"));
        assert!(json.contains("\"joint\":[\"j0\",\"j1\"]"));
        let parsed = RobotConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn resolved_limits_snapshot() {
        let limits = JointLimits::new(vec![JointLimit::new(-1.0, 1.0); 4]);
        let snapshot = sample().with_resolved_limits(&limits);
        assert!(snapshot.validate().is_ok());
        assert_eq!(snapshot.resolved_limits().unwrap(), limits);
        assert!(sample().resolved_limits().is_err());
    }

    #[test]
    fn hidden_width_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let snapshot = sample().with_hidden_width(32);
        snapshot.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"hidden\": 32"));
        assert_eq!(RobotConfig::load(&path).unwrap().hidden, Some(32));

        let plain = serde_json::to_string(&sample()).unwrap();
        assert!(!plain.contains("hidden"));
        assert!(sample().with_hidden_width(0).validate().is_err());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        sample().save(&path).unwrap();
        assert_eq!(RobotConfig::load(&path).unwrap(), sample());
    }

    #[test]
    fn load_missing_file() {
        assert!(matches!(
            RobotConfig::load("/nonexistent/toy.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
