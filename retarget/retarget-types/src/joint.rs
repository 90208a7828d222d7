//! Joint limit types.
//!
//! Limits are stored in user order (the order of `joint_order` in the robot
//! configuration). Native limits come from the kinematic model and may be
//! shrunk by a per-joint [`ClipRatio`].

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Margin kept between a commanded target and either joint bound.
pub const TARGET_MARGIN: f64 = 1e-3;

/// Fractional sub-range `(low, high)` of a joint's native range.
///
/// # Example
///
/// ```
/// use retarget_types::ClipRatio;
///
/// let ratio = ClipRatio::new("joint_0.0", 0.1, 0.9).unwrap();
/// assert!((ratio.low() - 0.1).abs() < 1e-12);
/// assert!(ClipRatio::new("joint_0.0", 0.9, 0.1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRatio {
    low: f64,
    high: f64,
}

impl ClipRatio {
    /// Creates a clip ratio, validating `0 <= low < high <= 1`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidClipRatio`] otherwise.
    pub fn new(joint: &str, low: f64, high: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&low) && (0.0..=1.0).contains(&high) && low < high {
            Ok(Self { low, high })
        } else {
            Err(ConfigError::invalid_clip_ratio(joint, low, high))
        }
    }

    /// Lower ratio.
    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    /// Upper ratio.
    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }
}

/// Position range of a single joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    /// Minimum position.
    pub lower: f64,
    /// Maximum position.
    pub upper: f64,
}

impl JointLimit {
    /// Creates a joint limit.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Width of the range.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Mid-point of the range.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }

    /// Check if a position is within limits (inclusive).
    #[must_use]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.lower && position <= self.upper
    }

    /// Shrinks the range to `[lower + a*span, lower + b*span]`.
    #[must_use]
    pub fn clipped(&self, ratio: ClipRatio) -> Self {
        let span = self.span();
        Self {
            lower: self.lower + ratio.low * span,
            upper: self.lower + ratio.high * span,
        }
    }

    /// Clamps a position into `[lower + margin, upper - margin]`.
    ///
    /// Falls back to the midpoint when the range is narrower than twice the
    /// margin.
    #[must_use]
    pub fn clamp_inside(&self, position: f64, margin: f64) -> f64 {
        let lo = self.lower + margin;
        let hi = self.upper - margin;
        if lo > hi {
            return self.midpoint();
        }
        position.clamp(lo, hi)
    }

    /// Returns an error if the range is empty or not finite.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyJointRange`].
    pub fn validate(&self, joint: &str) -> Result<()> {
        if self.lower.is_finite() && self.upper.is_finite() && self.lower < self.upper {
            Ok(())
        } else {
            Err(ConfigError::EmptyJointRange {
                joint: joint.to_string(),
                lower: self.lower,
                upper: self.upper,
            })
        }
    }
}

/// Per-joint limits for a whole hand, in user order.
///
/// # Example
///
/// ```
/// use retarget_types::{JointLimit, JointLimits};
///
/// let limits = JointLimits::new(vec![JointLimit::new(-1.0, 1.0), JointLimit::new(0.0, 2.0)]);
/// assert_eq!(limits.len(), 2);
/// assert_eq!(limits.lowers(), vec![-1.0, 0.0]);
/// assert_eq!(limits.midpoints(), vec![0.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointLimits {
    limits: Vec<JointLimit>,
}

impl JointLimits {
    /// Wraps a list of limits.
    #[must_use]
    pub const fn new(limits: Vec<JointLimit>) -> Self {
        Self { limits }
    }

    /// Builds limits from parallel lower/upper lists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DimensionMismatch`] when the lists differ in
    /// length.
    pub fn from_bounds(lower: &[f64], upper: &[f64]) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(ConfigError::dimension_mismatch(lower.len(), upper.len()));
        }
        Ok(Self {
            limits: lower
                .iter()
                .zip(upper)
                .map(|(&lo, &hi)| JointLimit::new(lo, hi))
                .collect(),
        })
    }

    /// Number of joints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    /// Returns true if there are no joints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Limit of joint `i`.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&JointLimit> {
        self.limits.get(i)
    }

    /// Iterates over the limits.
    pub fn iter(&self) -> impl Iterator<Item = &JointLimit> {
        self.limits.iter()
    }

    /// Lower bounds.
    #[must_use]
    pub fn lowers(&self) -> Vec<f64> {
        self.limits.iter().map(|l| l.lower).collect()
    }

    /// Upper bounds.
    #[must_use]
    pub fn uppers(&self) -> Vec<f64> {
        self.limits.iter().map(|l| l.upper).collect()
    }

    /// Range mid-points.
    #[must_use]
    pub fn midpoints(&self) -> Vec<f64> {
        self.limits.iter().map(JointLimit::midpoint).collect()
    }

    /// Returns true if every entry of `q` is inside its range.
    #[must_use]
    pub fn contains(&self, q: &[f64]) -> bool {
        q.len() == self.limits.len() && self.limits.iter().zip(q).all(|(l, &x)| l.contains(x))
    }

    /// Clamps `q` into the closed ranges.
    #[must_use]
    pub fn clamp(&self, q: &[f64]) -> Vec<f64> {
        self.limits
            .iter()
            .zip(q)
            .map(|(l, &x)| x.clamp(l.lower, l.upper))
            .collect()
    }

    /// Clamps `q` strictly inside the ranges, keeping `margin` from each bound.
    #[must_use]
    pub fn clamp_inside(&self, q: &[f64], margin: f64) -> Vec<f64> {
        self.limits
            .iter()
            .zip(q)
            .map(|(l, &x)| l.clamp_inside(x, margin))
            .collect()
    }
}

impl std::ops::Index<usize> for JointLimits {
    type Output = JointLimit;

    fn index(&self, index: usize) -> &Self::Output {
        &self.limits[index]
    }
}
