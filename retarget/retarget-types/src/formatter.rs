//! Joint position normalizer.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::joint::JointLimits;

/// Linear rescale between physical joint positions and `[-1, 1]`.
///
/// `normalize(q) = ((q - lower) / (upper - lower) - 0.5) * 2`
///
/// # Example
///
/// ```
/// use retarget_types::{HandFormatter, JointLimits};
///
/// let limits = JointLimits::from_bounds(&[0.0, -2.0], &[1.0, 2.0]).unwrap();
/// let formatter = HandFormatter::new(&limits);
///
/// let n = formatter.normalize(&[0.5, 2.0]);
/// assert!((n[0] - 0.0).abs() < 1e-12);
/// assert!((n[1] - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandFormatter {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl HandFormatter {
    /// Creates a formatter from resolved joint limits.
    #[must_use]
    pub fn new(limits: &JointLimits) -> Self {
        Self {
            lower: limits.lowers(),
            upper: limits.uppers(),
        }
    }

    /// Creates a formatter from raw lower/upper lists.
    ///
    /// # Errors
    ///
    /// Returns an error when the lists differ in length.
    pub fn from_bounds(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(ConfigError::dimension_mismatch(lower.len(), upper.len()));
        }
        Ok(Self { lower, upper })
    }

    /// Number of joints handled.
    #[must_use]
    pub fn dof(&self) -> usize {
        self.lower.len()
    }

    /// Lower bounds.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Maps physical positions to `[-1, 1]`.
    #[must_use]
    pub fn normalize(&self, q: &[f64]) -> Vec<f64> {
        q.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(&x, (&lo, &hi))| ((x - lo) / (hi - lo) - 0.5) * 2.0)
            .collect()
    }

    /// Maps `[-1, 1]` values back to physical positions.
    #[must_use]
    pub fn unnormalize(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(&v, (&lo, &hi))| (v / 2.0 + 0.5) * (hi - lo) + lo)
            .collect()
    }

    /// Single-precision variant of [`Self::normalize`], used for tensor input.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn normalize_f32(&self, q: &[f64]) -> Vec<f32> {
        self.normalize(q).into_iter().map(|v| v as f32).collect()
    }

    /// Single-precision input variant of [`Self::unnormalize`].
    #[must_use]
    pub fn unnormalize_f32(&self, x: &[f32]) -> Vec<f64> {
        let wide: Vec<f64> = x.iter().map(|&v| f64::from(v)).collect();
        self.unnormalize(&wide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn formatter() -> HandFormatter {
        let limits =
            JointLimits::from_bounds(&[-0.47, -0.196, -0.174, 0.263], &[0.47, 1.61, 1.709, 1.396])
                .unwrap();
        HandFormatter::new(&limits)
    }

    #[test]
    fn bounds_map_to_unit_interval() {
        let f = formatter();
        let lo = f.normalize(&f.lower().to_vec());
        let hi = f.normalize(&f.upper().to_vec());
        for (a, b) in lo.iter().zip(&hi) {
            assert_relative_eq!(*a, -1.0, epsilon = 1e-12);
            assert_relative_eq!(*b, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn round_trip_reconstructs_input() {
        let f = formatter();
        let samples = [
            vec![0.0, 0.5, 0.2, 0.9],
            vec![-0.47, -0.196, -0.174, 0.263],
            vec![0.47, 1.61, 1.709, 1.396],
            vec![0.123, 1.0, 1.5, 0.3],
        ];
        for q in &samples {
            let back = f.unnormalize(&f.normalize(q));
            for (a, b) in q.iter().zip(&back) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn f32_round_trip_within_tolerance() {
        let f = formatter();
        let q = [0.1, 0.7, 0.9, 1.2];
        let back = f.unnormalize_f32(&f.normalize_f32(&q));
        for (a, b) in q.iter().zip(&back) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn from_bounds_rejects_mismatch() {
        assert!(HandFormatter::from_bounds(vec![0.0], vec![]).is_err());
    }
}
