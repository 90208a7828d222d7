//! Per-finger sub-networks.

use burn::module::Module;
use burn::nn;
use burn::prelude::Backend;
use burn::tensor::Tensor;
use burn::tensor::activation::{leaky_relu, tanh};
use serde::{Deserialize, Serialize};

/// Negative slope of the hidden activations.
const LEAKY_SLOPE: f64 = 0.01;

/// Configuration shared by every finger sub-network.
///
/// # Example
///
/// ```
/// use retarget_models::FingerNetConfig;
///
/// let config = FingerNetConfig::default();
/// assert_eq!(config.hidden, 128);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerNetConfig {
    /// Width of both hidden layers.
    pub hidden: usize,
}

impl Default for FingerNetConfig {
    fn default() -> Self {
        Self { hidden: 128 }
    }
}

impl FingerNetConfig {
    /// Creates a configuration with the given hidden width.
    #[must_use]
    pub const fn new(hidden: usize) -> Self {
        Self { hidden }
    }

    /// Returns `true` if the hidden width is positive.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.hidden > 0
    }
}

/// Three-layer perceptron body.
///
/// Architecture: Linear -> `LeakyReLU` -> `LayerNorm` -> Linear -> `LeakyReLU`
/// -> `LayerNorm` -> Linear
#[derive(Debug, Module)]
pub struct FingerMlp<B: Backend> {
    linear1: nn::Linear<B>,
    norm1: nn::LayerNorm<B>,
    linear2: nn::Linear<B>,
    norm2: nn::LayerNorm<B>,
    linear3: nn::Linear<B>,
}

impl<B: Backend> FingerMlp<B> {
    /// Creates the body for `input -> output` features.
    #[must_use]
    pub fn new(input: usize, output: usize, config: FingerNetConfig, device: &B::Device) -> Self {
        let h = config.hidden;
        Self {
            linear1: nn::LinearConfig::new(input, h).init(device),
            norm1: nn::LayerNormConfig::new(h).init(device),
            linear2: nn::LinearConfig::new(h, h).init(device),
            norm2: nn::LayerNormConfig::new(h).init(device),
            linear3: nn::LinearConfig::new(h, output).init(device),
        }
    }

    /// Runs the body on `[batch, input]`, returning `[batch, output]`.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.norm1.forward(leaky_relu(self.linear1.forward(x), LEAKY_SLOPE));
        let x = self.norm2.forward(leaky_relu(self.linear2.forward(x), LEAKY_SLOPE));
        self.linear3.forward(x)
    }
}

/// Forward sub-network: normalized finger joints to a 3D fingertip point.
#[derive(Debug, Module)]
pub struct FingerFk<B: Backend> {
    body: FingerMlp<B>,
}

impl<B: Backend> FingerFk<B> {
    /// Creates a forward network for a finger with `joints` joints.
    #[must_use]
    pub fn new(joints: usize, config: FingerNetConfig, device: &B::Device) -> Self {
        Self {
            body: FingerMlp::new(joints, 3, config, device),
        }
    }

    /// Maps `[batch, joints]` to `[batch, 3]`.
    pub fn forward(&self, q: Tensor<B, 2>) -> Tensor<B, 2> {
        self.body.forward(q)
    }
}

/// Inverse sub-network: a 3D fingertip point to normalized finger joints.
///
/// The output passes through `tanh`, so every joint lies in `[-1, 1]`.
#[derive(Debug, Module)]
pub struct FingerIk<B: Backend> {
    body: FingerMlp<B>,
}

impl<B: Backend> FingerIk<B> {
    /// Creates an inverse network for a finger with `joints` joints.
    #[must_use]
    pub fn new(joints: usize, config: FingerNetConfig, device: &B::Device) -> Self {
        Self {
            body: FingerMlp::new(3, joints, config, device),
        }
    }

    /// Maps `[batch, 3]` to `[batch, joints]`.
    pub fn forward(&self, point: Tensor<B, 2>) -> Tensor<B, 2> {
        tanh(self.body.forward(point))
    }
}
