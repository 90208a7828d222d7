//! Training configuration.

use burn::optim::decay::WeightDecayConfig;
use burn::optim::momentum::MomentumConfig;
use burn::optim::{AdamConfig, AdamWConfig, SgdConfig};
use retarget_models::FingerNetConfig;
use serde::{Deserialize, Serialize};

use crate::loss::LossWeights;

/// Optimizer configuration.
///
/// # Example
///
/// ```
/// use retarget_training::OptimizerConfig;
///
/// let adam = OptimizerConfig::adam(5e-4);
/// assert_eq!(adam.learning_rate, 5e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Base learning rate.
    pub learning_rate: f32,

    /// Weight decay (decoupled for `AdamW`).
    pub weight_decay: f32,

    /// Optimizer type.
    pub optimizer_type: OptimizerType,

    /// Momentum (for SGD).
    pub momentum: f32,

    /// Beta1 (for Adam).
    pub beta1: f32,

    /// Beta2 (for Adam).
    pub beta2: f32,

    /// Epsilon for numerical stability.
    pub epsilon: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::adam(1e-3)
    }
}

impl OptimizerConfig {
    /// Creates an Adam optimizer config.
    #[must_use]
    pub const fn adam(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            weight_decay: 0.0,
            optimizer_type: OptimizerType::Adam,
            momentum: 0.0,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    /// Creates an `AdamW` optimizer config with weight decay 0.01.
    #[must_use]
    pub const fn adamw(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            weight_decay: 0.01,
            optimizer_type: OptimizerType::AdamW,
            momentum: 0.0,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
        }
    }

    /// Creates an SGD optimizer config.
    #[must_use]
    pub const fn sgd(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            weight_decay: 0.0,
            optimizer_type: OptimizerType::Sgd,
            momentum: 0.0,
            beta1: 0.0,
            beta2: 0.0,
            epsilon: 1e-8,
        }
    }

    /// Creates an SGD with momentum optimizer config.
    #[must_use]
    pub const fn sgd_momentum(learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            weight_decay: 0.0,
            optimizer_type: OptimizerType::SgdMomentum,
            momentum,
            beta1: 0.0,
            beta2: 0.0,
            epsilon: 1e-8,
        }
    }

    /// Sets weight decay.
    #[must_use]
    pub const fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.learning_rate > 0.0
            && self.weight_decay >= 0.0
            && self.momentum >= 0.0
            && self.momentum <= 1.0
            && self.beta1 >= 0.0
            && self.beta1 < 1.0
            && self.beta2 >= 0.0
            && self.beta2 < 1.0
            && self.epsilon > 0.0
    }

    /// Learning rate in the precision Burn optimizers expect.
    #[must_use]
    pub fn learning_rate_f64(&self) -> f64 {
        f64::from(self.learning_rate)
    }

    fn weight_decay_config(&self) -> Option<WeightDecayConfig> {
        (self.weight_decay > 0.0).then(|| WeightDecayConfig::new(self.weight_decay))
    }

    /// Burn Adam configuration.
    #[must_use]
    pub fn adam_config(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta1)
            .with_beta_2(self.beta2)
            .with_epsilon(self.epsilon)
            .with_weight_decay(self.weight_decay_config())
    }

    /// Burn `AdamW` configuration.
    #[must_use]
    pub fn adamw_config(&self) -> AdamWConfig {
        AdamWConfig::new()
            .with_beta_1(self.beta1)
            .with_beta_2(self.beta2)
            .with_epsilon(self.epsilon)
            .with_weight_decay(self.weight_decay)
    }

    /// Burn SGD configuration; momentum applies to [`OptimizerType::SgdMomentum`].
    #[must_use]
    pub fn sgd_config(&self) -> SgdConfig {
        let momentum = (self.optimizer_type == OptimizerType::SgdMomentum)
            .then(|| MomentumConfig::new().with_momentum(f64::from(self.momentum)));
        SgdConfig::new()
            .with_weight_decay(self.weight_decay_config())
            .with_momentum(momentum)
    }
}

/// Type of optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizerType {
    /// Stochastic Gradient Descent.
    Sgd,
    /// SGD with momentum.
    SgdMomentum,
    /// Adam optimizer.
    Adam,
    /// `AdamW` optimizer (Adam with decoupled weight decay).
    AdamW,
}

/// Supervised fit of the forward surrogate.
///
/// # Example
///
/// ```
/// use retarget_training::ForwardFitConfig;
///
/// let config = ForwardFitConfig::default();
/// assert_eq!(config.epochs, 200);
/// assert_eq!(config.batch_size, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardFitConfig {
    /// Number of full passes over the kinematics dataset.
    pub epochs: usize,

    /// Batch size.
    pub batch_size: usize,

    /// Optimizer configuration.
    pub optimizer: OptimizerConfig,

    /// Whether to shuffle samples each epoch.
    pub shuffle: bool,
}

impl Default for ForwardFitConfig {
    fn default() -> Self {
        Self::new(200)
    }
}

impl ForwardFitConfig {
    /// Creates a config with the given epoch budget.
    #[must_use]
    pub const fn new(epochs: usize) -> Self {
        Self {
            epochs,
            batch_size: 256,
            optimizer: OptimizerConfig::adam(5e-4),
            shuffle: true,
        }
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the optimizer.
    #[must_use]
    pub const fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Disables shuffling.
    #[must_use]
    pub const fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.epochs > 0 && self.batch_size > 0 && self.optimizer.is_valid()
    }
}

/// Geometric fit of the inverse solver against human points.
///
/// # Example
///
/// ```
/// use retarget_training::InverseFitConfig;
///
/// let config = InverseFitConfig::default().with_epochs(20).with_point_cloud_size(4096);
/// assert_eq!(config.batch_size, 2048);
/// assert!(config.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverseFitConfig {
    /// Number of epochs; each epoch checkpoints the inverse model.
    pub epochs: usize,

    /// Batch size.
    pub batch_size: usize,

    /// Optimizer configuration.
    pub optimizer: OptimizerConfig,

    /// Whether to shuffle samples each epoch.
    pub shuffle: bool,

    /// Robot keypoints drawn per batch as the chamfer target.
    pub chamfer_samples: usize,

    /// Points per finger after resampling.
    pub point_cloud_size: usize,

    /// Voxel edge length for downsampling human points.
    pub voxel_size: f32,

    /// Batches between loss log lines.
    pub log_every: usize,
}

impl Default for InverseFitConfig {
    fn default() -> Self {
        Self {
            epochs: 200,
            batch_size: 2048,
            optimizer: OptimizerConfig::adamw(1e-4),
            shuffle: true,
            chamfer_samples: 2048,
            point_cloud_size: 50_000,
            voxel_size: 0.001,
            log_every: 50,
        }
    }
}

impl InverseFitConfig {
    /// Sets the epoch budget.
    #[must_use]
    pub const fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the optimizer.
    #[must_use]
    pub const fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Sets the chamfer target size.
    #[must_use]
    pub const fn with_chamfer_samples(mut self, samples: usize) -> Self {
        self.chamfer_samples = samples;
        self
    }

    /// Sets the resampled point count per finger.
    #[must_use]
    pub const fn with_point_cloud_size(mut self, k: usize) -> Self {
        self.point_cloud_size = k;
        self
    }

    /// Sets the voxel edge length.
    #[must_use]
    pub const fn with_voxel_size(mut self, voxel: f32) -> Self {
        self.voxel_size = voxel;
        self
    }

    /// Sets the logging interval in batches.
    #[must_use]
    pub const fn with_log_every(mut self, batches: usize) -> Self {
        self.log_every = batches;
        self
    }

    /// Validates the configuration.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.epochs > 0
            && self.batch_size > 0
            && self.chamfer_samples > 0
            && self.point_cloud_size > 0
            && self.voxel_size >= 0.0
            && self.log_every > 0
            && self.optimizer.is_valid()
    }
}

/// Synthetic kinematics dataset size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Joint configurations to sample when the cache is absent.
    pub n_samples: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self { n_samples: 100_000 }
    }
}

impl DatasetConfig {
    /// Creates a dataset config.
    #[must_use]
    pub const fn new(n_samples: usize) -> Self {
        Self { n_samples }
    }

    /// Validates the configuration.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.n_samples > 0
    }
}

/// Everything the trainer needs besides the robot and the storage root.
///
/// # Example
///
/// ```
/// use retarget_training::{ForwardFitConfig, TrainerConfig};
///
/// let config = TrainerConfig::default()
///     .with_forward(ForwardFitConfig::new(10))
///     .with_seed(7);
/// assert_eq!(config.forward.epochs, 10);
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrainerConfig {
    /// Kinematics dataset.
    pub dataset: DatasetConfig,

    /// Forward surrogate fit.
    pub forward: ForwardFitConfig,

    /// Inverse solver fit.
    pub inverse: InverseFitConfig,

    /// Loss term weights.
    pub weights: LossWeights,

    /// Per-finger network width.
    pub network: FingerNetConfig,

    /// Random seed for sampling, shuffling and perturbations.
    pub seed: Option<u64>,
}

impl TrainerConfig {
    /// Sets the dataset config.
    #[must_use]
    pub const fn with_dataset(mut self, dataset: DatasetConfig) -> Self {
        self.dataset = dataset;
        self
    }

    /// Sets the forward fit config.
    #[must_use]
    pub fn with_forward(mut self, forward: ForwardFitConfig) -> Self {
        self.forward = forward;
        self
    }

    /// Sets the inverse fit config.
    #[must_use]
    pub fn with_inverse(mut self, inverse: InverseFitConfig) -> Self {
        self.inverse = inverse;
        self
    }

    /// Sets the loss weights.
    #[must_use]
    pub const fn with_weights(mut self, weights: LossWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the network width.
    #[must_use]
    pub const fn with_network(mut self, network: FingerNetConfig) -> Self {
        self.network = network;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates every section.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.dataset.is_valid()
            && self.forward.is_valid()
            && self.inverse.is_valid()
            && self.weights.is_valid()
            && self.network.is_valid()
    }
}
