//! Finger-to-joint assignment shared by the forward and inverse models.

use retarget_types::KeypointInfo;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Which user-order joints drive each finger.
///
/// Groups are pairwise disjoint; joints in no group are left at zero by
/// the inverse model.
///
/// # Example
///
/// ```
/// use retarget_models::HandTopology;
///
/// let topology = HandTopology::new(vec![vec![0, 1], vec![3]], 4).unwrap();
/// assert_eq!(topology.num_fingers(), 2);
/// assert_eq!(topology.owner(2), None);
/// assert_eq!(topology.owner(3), Some((1, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandTopology {
    groups: Vec<Vec<usize>>,
    dof: usize,
}

impl HandTopology {
    /// Creates a topology from joint index groups.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfig`] for no fingers, an empty group,
    /// an index `>= dof`, or a joint shared by two groups.
    pub fn new(groups: Vec<Vec<usize>>, dof: usize) -> Result<Self> {
        if groups.is_empty() {
            return Err(ModelError::invalid_config("no fingers"));
        }
        let mut seen = vec![false; dof];
        for (finger, group) in groups.iter().enumerate() {
            if group.is_empty() {
                return Err(ModelError::invalid_config(format!("finger {finger} has no joints")));
            }
            for &j in group {
                if j >= dof {
                    return Err(ModelError::invalid_config(format!(
                        "finger {finger} joint {j} out of range for {dof} joints"
                    )));
                }
                if seen[j] {
                    return Err(ModelError::invalid_config(format!(
                        "joint {j} assigned to more than one finger"
                    )));
                }
                seen[j] = true;
            }
        }
        Ok(Self { groups, dof })
    }

    /// Topology of a resolved robot configuration.
    ///
    /// # Errors
    ///
    /// As [`Self::new`].
    pub fn from_info(info: &KeypointInfo) -> Result<Self> {
        Self::new(info.joint_groups(), info.dof)
    }

    /// Joint groups in finger order.
    #[must_use]
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    /// Number of fingers.
    #[must_use]
    pub fn num_fingers(&self) -> usize {
        self.groups.len()
    }

    /// Total joint count.
    #[must_use]
    pub const fn dof(&self) -> usize {
        self.dof
    }

    /// `(finger, position within group)` of a joint.
    #[must_use]
    pub fn owner(&self, joint: usize) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(f, group)| {
            group.iter().position(|&j| j == joint).map(|k| (f, k))
        })
    }

    /// For each joint, its column in the concatenated finger outputs; joints
    /// without a finger point at the trailing zero column.
    #[must_use]
    pub fn scatter_columns(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.groups.len());
        let mut total = 0;
        for group in &self.groups {
            offsets.push(total);
            total += group.len();
        }
        (0..self.dof)
            .map(|j| self.owner(j).map_or(total, |(f, k)| offsets[f] + k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap() {
        assert!(HandTopology::new(vec![vec![0, 1], vec![1, 2]], 3).is_err());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(HandTopology::new(vec![vec![0, 5]], 3).is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(HandTopology::new(Vec::new(), 3).is_err());
        assert!(HandTopology::new(vec![Vec::new()], 3).is_err());
    }

    #[test]
    fn scatter_columns_handles_gaps_and_order() {
        let topology = HandTopology::new(vec![vec![3, 0], vec![4]], 6).unwrap();
        // concat layout: [f0:j3, f0:j0, f1:j4, zero]
        assert_eq!(topology.scatter_columns(), vec![1, 3, 3, 0, 2, 3]);
    }
}
