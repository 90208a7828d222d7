//! Keypoint samples and the 21-point human hand skeleton.

use serde::{Deserialize, Serialize};

/// A 3D point in the robot base frame (or the canonical human hand frame).
pub type KeypointSample = [f32; 3];

/// Number of keypoints in the human hand skeleton.
pub const HUMAN_KEYPOINT_COUNT: usize = 21;

/// Landmarks of the 21-point human hand skeleton.
///
/// Indices follow the common wrist-first layout: four joints per finger from
/// thumb to pinky, tips at 4, 8, 12, 16, 20.
///
/// # Example
///
/// ```
/// use retarget_types::HumanKeypoint;
///
/// assert_eq!(HumanKeypoint::IndexTip.index(), 8);
/// assert_eq!(HumanKeypoint::from_index(4), Some(HumanKeypoint::ThumbTip));
/// assert!(HumanKeypoint::ThumbTip.is_fingertip());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum HumanKeypoint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HumanKeypoint {
    /// All landmarks in skeleton order.
    pub const ALL: [Self; HUMAN_KEYPOINT_COUNT] = [
        Self::Wrist,
        Self::ThumbCmc,
        Self::ThumbMcp,
        Self::ThumbIp,
        Self::ThumbTip,
        Self::IndexMcp,
        Self::IndexPip,
        Self::IndexDip,
        Self::IndexTip,
        Self::MiddleMcp,
        Self::MiddlePip,
        Self::MiddleDip,
        Self::MiddleTip,
        Self::RingMcp,
        Self::RingPip,
        Self::RingDip,
        Self::RingTip,
        Self::PinkyMcp,
        Self::PinkyPip,
        Self::PinkyDip,
        Self::PinkyTip,
    ];

    /// Skeleton index of this landmark.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Landmark at a skeleton index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns true for the five fingertip landmarks.
    #[must_use]
    pub const fn is_fingertip(self) -> bool {
        matches!(
            self,
            Self::ThumbTip | Self::IndexTip | Self::MiddleTip | Self::RingTip | Self::PinkyTip
        )
    }
}

/// Squared Euclidean distance between two samples.
#[must_use]
pub fn squared_distance(a: &KeypointSample, b: &KeypointSample) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
