//! Recorded human hand motion.
//!
//! Frames are 21-point skeletons already expressed in the canonical,
//! wrist-centred hand frame.

use std::fmt;
use std::path::Path;

use ndarray::{Array3, ArrayView3};
use ndarray_npy::read_npy;
use retarget_types::{HUMAN_KEYPOINT_COUNT, KeypointSample};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DatasetError, Result};

/// Point span above which input is assumed to be in millimetres.
pub const UNIT_SPAN_LIMIT: f32 = 3.0;

/// One 21-point skeleton.
pub type HumanFrame = [KeypointSample; HUMAN_KEYPOINT_COUNT];

/// Non-fatal numeric anomaly found in input data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumericWarning {
    /// Largest axis-aligned extent exceeds [`UNIT_SPAN_LIMIT`].
    SuspectedMillimetres {
        /// Observed span.
        span: f32,
    },
}

impl fmt::Display for NumericWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuspectedMillimetres { span } => write!(
                f,
                "point span {span:.3} exceeds {UNIT_SPAN_LIMIT}, input may be in millimetres"
            ),
        }
    }
}

/// Largest per-axis extent of a point set.
#[must_use]
pub fn point_span(points: &[KeypointSample]) -> f32 {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in points {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (0..3)
        .map(|axis| max[axis] - min[axis])
        .filter(|s| s.is_finite())
        .fold(0.0, f32::max)
}

/// Checks whether a point set looks like it is in millimetres.
///
/// Logs and returns a warning instead of failing.
#[must_use]
pub fn check_unit_scale(points: &[KeypointSample]) -> Option<NumericWarning> {
    let span = point_span(points);
    if span > UNIT_SPAN_LIMIT {
        let warning = NumericWarning::SuspectedMillimetres { span };
        warn!(span, limit = UNIT_SPAN_LIMIT, "{warning}");
        Some(warning)
    } else {
        None
    }
}

/// A sequence of canonical human hand skeletons.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HumanMotion {
    frames: Vec<HumanFrame>,
}

impl HumanMotion {
    /// Wraps in-memory frames.
    #[must_use]
    pub const fn from_frames(frames: Vec<HumanFrame>) -> Self {
        Self { frames }
    }

    /// Builds motion from a `[T, 21, C]` array, keeping the first three
    /// channels of each keypoint.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ShapeMismatch`] unless there are 21
    /// keypoints with at least three channels.
    pub fn from_array(array: ArrayView3<'_, f32>) -> Result<Self> {
        let shape = array.shape();
        if shape[1] != HUMAN_KEYPOINT_COUNT || shape[2] < 3 {
            return Err(DatasetError::shape_mismatch(
                "human motion",
                format!("[T, {HUMAN_KEYPOINT_COUNT}, >=3]"),
                format!("{shape:?}"),
            ));
        }
        let frames = array
            .outer_iter()
            .map(|frame| {
                let mut out = [[0.0f32; 3]; HUMAN_KEYPOINT_COUNT];
                for (k, row) in frame.outer_iter().enumerate() {
                    out[k] = [row[0], row[1], row[2]];
                }
                out
            })
            .collect();
        Ok(Self { frames })
    }

    /// Loads a `[T, 21, C]` `.npy` file of `f32` or `f64` values, `C >= 3`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Npy`] if the file cannot be read as a 3D
    /// float array and [`DatasetError::ShapeMismatch`] for a wrong shape.
    #[allow(clippy::cast_possible_truncation)]
    pub fn load_npy(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let array: Array3<f32> = match read_npy::<_, Array3<f32>>(path) {
            Ok(a) => a,
            Err(first) => read_npy::<_, Array3<f64>>(path)
                .map(|a| a.mapv(|v| v as f32))
                .map_err(|_| DatasetError::Npy(format!("{}: {first}", path.display())))?,
        };
        let motion = Self::from_array(array.view())?;
        info!(path = %path.display(), frames = motion.len(), "Loaded human motion");
        Ok(motion)
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if there are no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// All frames.
    #[must_use]
    pub fn frames(&self) -> &[HumanFrame] {
        &self.frames
    }

    /// Per-finger trajectories for the given skeleton ids, shape `[ids][T]`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ShapeMismatch`] for an id outside the
    /// skeleton.
    pub fn finger_points(&self, human_ids: &[usize]) -> Result<Vec<Vec<KeypointSample>>> {
        if let Some(&bad) = human_ids.iter().find(|&&id| id >= HUMAN_KEYPOINT_COUNT) {
            return Err(DatasetError::shape_mismatch(
                "human keypoint id",
                format!("< {HUMAN_KEYPOINT_COUNT}"),
                bad.to_string(),
            ));
        }
        Ok(human_ids
            .iter()
            .map(|&id| self.frames.iter().map(|f| f[id]).collect())
            .collect())
    }

    /// Unit-scale check over every point of every frame.
    #[must_use]
    pub fn check_unit_scale(&self) -> Option<NumericWarning> {
        let flat: Vec<KeypointSample> = self.frames.iter().flatten().copied().collect();
        check_unit_scale(&flat)
    }
}
