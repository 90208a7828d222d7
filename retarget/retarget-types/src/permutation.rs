//! User-order / engine-order joint permutation.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Bijection between the configured joint order and a kinematics engine's
/// native active-joint order.
///
/// `user_to_engine[i]` is the engine index of user joint `i`.
///
/// # Example
///
/// ```
/// use retarget_types::JointPermutation;
///
/// let perm = JointPermutation::new(vec![2, 0, 1]).unwrap();
/// let engine = perm.to_engine(&[10.0, 20.0, 30.0]);
/// assert_eq!(engine, vec![20.0, 30.0, 10.0]);
/// assert_eq!(perm.to_user(&engine), vec![10.0, 20.0, 30.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointPermutation {
    user_to_engine: Vec<usize>,
    engine_to_user: Vec<usize>,
}

impl JointPermutation {
    /// Builds a permutation from the engine index of each user joint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPermutation`] if the indices are not a
    /// bijection over `0..len`.
    pub fn new(user_to_engine: Vec<usize>) -> Result<Self> {
        let n = user_to_engine.len();
        let mut engine_to_user = vec![usize::MAX; n];
        for (user, &engine) in user_to_engine.iter().enumerate() {
            if engine >= n {
                return Err(ConfigError::InvalidPermutation(format!(
                    "engine index {engine} out of range for {n} joints"
                )));
            }
            if engine_to_user[engine] != usize::MAX {
                return Err(ConfigError::InvalidPermutation(format!(
                    "engine index {engine} assigned twice"
                )));
            }
            engine_to_user[engine] = user;
        }
        Ok(Self {
            user_to_engine,
            engine_to_user,
        })
    }

    /// Identity permutation of length `n`.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            user_to_engine: (0..n).collect(),
            engine_to_user: (0..n).collect(),
        }
    }

    /// Resolves a permutation by looking user joint names up in the engine's
    /// native name list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownJoint`] for a name the engine does not
    /// expose, [`ConfigError::DimensionMismatch`] if the engine exposes a
    /// different number of active joints, and
    /// [`ConfigError::InvalidPermutation`] if a name repeats.
    pub fn from_names<S: AsRef<str>>(user_names: &[S], engine_names: &[S]) -> Result<Self> {
        if user_names.len() != engine_names.len() {
            return Err(ConfigError::dimension_mismatch(
                engine_names.len(),
                user_names.len(),
            ));
        }
        let indices = user_names
            .iter()
            .map(|name| {
                engine_names
                    .iter()
                    .position(|e| e.as_ref() == name.as_ref())
                    .ok_or_else(|| ConfigError::UnknownJoint(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(indices)
    }

    /// Number of joints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.user_to_engine.len()
    }

    /// Returns true for the empty permutation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_to_engine.is_empty()
    }

    /// Engine index of each user joint.
    #[must_use]
    pub fn user_to_engine(&self) -> &[usize] {
        &self.user_to_engine
    }

    /// User index of each engine joint.
    #[must_use]
    pub fn engine_to_user(&self) -> &[usize] {
        &self.engine_to_user
    }

    /// Reorders a user-order vector into engine order.
    #[must_use]
    pub fn to_engine<T: Copy>(&self, user: &[T]) -> Vec<T> {
        self.engine_to_user.iter().map(|&u| user[u]).collect()
    }

    /// Reorders an engine-order vector into user order.
    #[must_use]
    pub fn to_user<T: Copy>(&self, engine: &[T]) -> Vec<T> {
        self.user_to_engine.iter().map(|&e| engine[e]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![Vec::new()];
        }
        let mut out = Vec::new();
        for p in permutations(n - 1) {
            for pos in 0..=p.len() {
                let mut q = p.clone();
                q.insert(pos, n - 1);
                out.push(q);
            }
        }
        out
    }

    #[test]
    fn round_trip_for_all_permutations() {
        for n in 0..=5 {
            let values: Vec<f64> = (0..n).map(|i| i as f64 * 1.5 - 2.0).collect();
            for p in permutations(n) {
                let perm = JointPermutation::new(p).unwrap();
                let engine = perm.to_engine(&values);
                assert_eq!(perm.to_user(&engine), values);
                let user = perm.to_user(&values);
                assert_eq!(perm.to_engine(&user), values);
            }
        }
    }

    #[test]
    fn rejects_duplicate_index() {
        assert!(JointPermutation::new(vec![0, 0, 1]).is_err());
    }

    #[test]
    fn rejects_out_of_range_index() {
        assert!(JointPermutation::new(vec![0, 3, 1]).is_err());
    }

    #[test]
    fn from_names_resolves_order() {
        let user = ["b", "c", "a"];
        let engine = ["a", "b", "c"];
        let perm = JointPermutation::from_names(&user, &engine).unwrap();
        assert_eq!(perm.user_to_engine(), &[1, 2, 0]);
        assert_eq!(perm.to_engine(&[1.0, 2.0, 0.0]), vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn from_names_unknown_joint() {
        let err = JointPermutation::from_names(&["a", "x"], &["a", "b"]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownJoint("x".to_string()));
    }

    #[test]
    fn identity_is_noop() {
        let perm = JointPermutation::identity(4);
        assert_eq!(perm.to_engine(&[1, 2, 3, 4]), vec![1, 2, 3, 4]);
    }
}
