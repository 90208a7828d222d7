//! Full-hand composition of the per-finger networks.
//!
//! The forward model gathers each finger's joints from the full joint
//! vector and stacks the finger outputs; the inverse model concatenates the
//! finger outputs and scatters them back into joint order.

use burn::module::{Ignored, Module};
use burn::prelude::Backend;
use burn::tensor::{Int, Tensor, TensorData};

use crate::finger::{FingerFk, FingerIk, FingerNetConfig};
use crate::topology::HandTopology;

#[allow(clippy::cast_possible_wrap)]
fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    Tensor::from_data(TensorData::new(data, [indices.len()]), device)
}

/// Forward-kinematics surrogate: normalized joints to fingertip points.
///
/// # Example
///
/// ```ignore
/// let topology = HandTopology::new(vec![vec![0, 1], vec![2, 3]], 4)?;
/// let fk = FkModel::<MyBackend>::new(topology, FingerNetConfig::default(), &device);
/// let points = fk.forward(Tensor::zeros([8, 4], &device));
/// assert_eq!(points.dims(), [8, 2, 3]);
/// ```
#[derive(Debug, Module)]
pub struct FkModel<B: Backend> {
    fingers: Vec<FingerFk<B>>,
    topology: Ignored<HandTopology>,
}

impl<B: Backend> FkModel<B> {
    /// Creates one forward sub-network per finger.
    #[must_use]
    pub fn new(topology: HandTopology, config: FingerNetConfig, device: &B::Device) -> Self {
        let fingers = topology
            .groups()
            .iter()
            .map(|g| FingerFk::new(g.len(), config, device))
            .collect();
        Self {
            fingers,
            topology: Ignored(topology),
        }
    }

    /// Finger topology.
    #[must_use]
    pub fn topology(&self) -> &HandTopology {
        &self.topology.0
    }

    /// Maps `[batch, dof]` normalized joints to `[batch, fingers, 3]`.
    pub fn forward(&self, q: Tensor<B, 2>) -> Tensor<B, 3> {
        let device = q.device();
        let outputs = self
            .fingers
            .iter()
            .zip(self.topology.0.groups())
            .map(|(net, group)| net.forward(q.clone().select(1, index_tensor::<B>(group, &device))))
            .collect();
        Tensor::stack::<3>(outputs, 1)
    }
}

/// Inverse solver: fingertip points to normalized joints in `[-1, 1]`.
#[derive(Debug, Module)]
pub struct IkModel<B: Backend> {
    fingers: Vec<FingerIk<B>>,
    topology: Ignored<HandTopology>,
}

impl<B: Backend> IkModel<B> {
    /// Creates one inverse sub-network per finger.
    #[must_use]
    pub fn new(topology: HandTopology, config: FingerNetConfig, device: &B::Device) -> Self {
        let fingers = topology
            .groups()
            .iter()
            .map(|g| FingerIk::new(g.len(), config, device))
            .collect();
        Self {
            fingers,
            topology: Ignored(topology),
        }
    }

    /// Finger topology.
    #[must_use]
    pub fn topology(&self) -> &HandTopology {
        &self.topology.0
    }

    /// Maps `[batch, fingers, 3]` points to `[batch, dof]` normalized joints.
    ///
    /// Joints not driven by any finger are zero.
    pub fn forward(&self, points: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, _, _] = points.dims();
        let device = points.device();
        let mut columns: Vec<Tensor<B, 2>> = self
            .fingers
            .iter()
            .enumerate()
            .map(|(f, net)| {
                let p = points.clone().slice([0..batch, f..f + 1, 0..3]).reshape([batch, 3]);
                net.forward(p)
            })
            .collect();
        columns.push(Tensor::zeros([batch, 1], &device));
        let scatter = index_tensor::<B>(&self.topology.0.scatter_columns(), &device);
        Tensor::cat(columns, 1).select(1, scatter)
    }
}
