//! Two-phase retargeting trainer.
//!
//! Phase one fits the forward surrogate to the synthetic kinematics dataset
//! by regression. Phase two freezes it and fits the inverse solver to human
//! fingertip points through the composite geometric objective.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::Backend;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor, TensorData};
use chrono::Local;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use retarget_dataset::{
    DatasetError, HumanMotion, HumanPointCloud, NumericWarning, PointBatch, RobotKinematicsDataset,
};
use retarget_kinematics::{KinematicsAdapter, KinematicsEngine};
use retarget_models::{FkModel, HandTopology, IkModel, load_checkpoint, save_checkpoint};
use retarget_types::{HandFormatter, KeypointSample};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{InverseFitConfig, OptimizerType, TrainerConfig};
use crate::error::{Result, TrainingError};
use crate::loss::{
    CURVATURE_SCALE, DIRECTION_SCALE_MIN, DIRECTION_SCALE_RANGE, LossComposition, LossKind,
    LossTerm, chamfer_loss, collision_loss, curvature_loss, direction_loss, joint_limit_loss,
    normalize_rows, pinch_loss,
};
use crate::metrics::{EpochMetrics, LossBreakdown, TrainingMetrics};
use crate::storage::{CheckpointStore, RunDirs};
use crate::surrogate::FrozenSurrogate;

/// Margin past a physical joint bound before the joint-limit term applies.
const JOINT_LIMIT_MARGIN: f32 = 1e-5;

/// Norm floor for random unit directions.
const UNIT_EPS: f32 = 1e-12;

/// Progress of a trainer through its two phases.
///
/// `Untrained -> ForwardFit -> InverseFit -> Ready`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainingPhase {
    /// Nothing fitted or loaded.
    Untrained,
    /// Forward surrogate being fitted or loaded.
    ForwardFit,
    /// Inverse solver being fitted against a frozen surrogate.
    InverseFit,
    /// Inverse fit finished and checkpointed.
    Ready,
}

impl fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Untrained => "untrained",
            Self::ForwardFit => "forward-fit",
            Self::InverseFit => "inverse-fit",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Result of a completed inverse fit.
#[derive(Debug)]
pub struct TrainingOutcome<B: Backend> {
    /// Trained inverse solver.
    pub model: IkModel<B>,
    /// Per-epoch metrics of the inverse fit.
    pub metrics: TrainingMetrics,
    /// Timestamped run directory.
    pub run_dir: PathBuf,
    /// Rolling `_last` directory.
    pub last_dir: PathBuf,
    /// Unit-scale warning raised on the human input, if any.
    pub warning: Option<NumericWarning>,
}

/// Trains the forward surrogate and the inverse solver of one robot hand.
///
/// # Example
///
/// ```ignore
/// use burn::backend::Autodiff;
/// use burn_ndarray::NdArray;
///
/// let mut trainer = RetargetTrainer::<Autodiff<NdArray<f32>>, _>::new(
///     adapter,
///     CheckpointStore::new("/srv/retarget"),
///     TrainerConfig::default().with_seed(0),
///     Default::default(),
/// )?;
/// let outcome = trainer.train(&HumanMotion::load_npy("human.npy")?, "demo")?;
/// println!("{}", outcome.metrics.summary());
/// ```
pub struct RetargetTrainer<B: AutodiffBackend, E: KinematicsEngine> {
    adapter: KinematicsAdapter<E>,
    store: CheckpointStore,
    config: TrainerConfig,
    composition: LossComposition,
    topology: HandTopology,
    formatter: HandFormatter,
    device: B::Device,
    rng: ChaCha8Rng,
    phase: TrainingPhase,
}

impl<B: AutodiffBackend, E: KinematicsEngine> RetargetTrainer<B, E> {
    /// Creates a trainer; nothing is read from or written to the store yet.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] for an invalid config and
    /// [`TrainingError::Model`] if the fingertips do not form a valid
    /// finger topology.
    pub fn new(
        adapter: KinematicsAdapter<E>,
        store: CheckpointStore,
        config: TrainerConfig,
        device: B::Device,
    ) -> Result<Self> {
        if !config.is_valid() {
            return Err(TrainingError::invalid_config(format!("{config:?}")));
        }
        let topology = HandTopology::from_info(adapter.keypoint_info())?;
        let formatter = adapter.formatter();
        let rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        let composition = LossComposition::from_weights(&config.weights);
        Ok(Self {
            adapter,
            store,
            config,
            composition,
            topology,
            formatter,
            device,
            rng,
            phase: TrainingPhase::Untrained,
        })
    }

    /// Replaces the loss composition of the inverse fit.
    #[must_use]
    pub fn with_composition(mut self, composition: LossComposition) -> Self {
        self.composition = composition;
        self
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> TrainingPhase {
        self.phase
    }

    /// Kinematics adapter.
    #[must_use]
    pub const fn adapter(&self) -> &KinematicsAdapter<E> {
        &self.adapter
    }

    /// Storage root.
    #[must_use]
    pub const fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Training configuration.
    #[must_use]
    pub const fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Inverse-fit loss composition.
    #[must_use]
    pub const fn composition(&self) -> &LossComposition {
        &self.composition
    }

    /// Finger topology shared by both models.
    #[must_use]
    pub const fn topology(&self) -> &HandTopology {
        &self.topology
    }

    /// Joint normalizer.
    #[must_use]
    pub const fn formatter(&self) -> &HandFormatter {
        &self.formatter
    }

    fn robot(&self) -> &str {
        &self.adapter.config().name
    }

    // ========================================================================
    // Data
    // ========================================================================

    /// Loads the cached kinematics dataset, generating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Dataset`] if the cache is unreadable or
    /// does not match the robot.
    pub fn kinematics_dataset(&mut self) -> Result<RobotKinematicsDataset> {
        let path = self.store.dataset_path(self.robot());
        Ok(RobotKinematicsDataset::load_or_generate(
            path,
            &self.adapter,
            self.config.dataset.n_samples,
            &mut self.rng,
        )?)
    }

    /// Robot fingertip points from the kinematics dataset, `[fingers][N]`.
    ///
    /// # Errors
    ///
    /// As [`Self::kinematics_dataset`].
    pub fn robot_pointcloud(&mut self) -> Result<Vec<Vec<KeypointSample>>> {
        let dataset = self.kinematics_dataset()?;
        Ok(dataset.export_robot_pointcloud(&self.adapter.keypoint_names())?)
    }

    // ========================================================================
    // Phase one: forward surrogate
    // ========================================================================

    /// Returns the forward surrogate, loading its checkpoint when present
    /// and `force_retrain` is false, otherwise fitting and saving it.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Model`] if the checkpoint cannot be read or
    /// written, or any error from [`Self::fit_forward`].
    pub fn forward_model(&mut self, force_retrain: bool) -> Result<FkModel<B>> {
        self.phase = TrainingPhase::ForwardFit;
        let path = self.store.forward_model_path(self.robot());
        if path.exists() && !force_retrain {
            info!(path = %path.display(), "Loading forward surrogate");
            let model = FkModel::new(self.topology.clone(), self.config.network, &self.device);
            return Ok(load_checkpoint::<B, FkModel<B>>(model, &path, &self.device)?);
        }

        info!(robot = %self.robot(), "Training forward surrogate from scratch");
        let dataset = self.kinematics_dataset()?;
        let (model, metrics) = self.fit_forward(&dataset)?;
        info!(
            epochs = metrics.epochs_completed(),
            final_loss = metrics.final_loss(),
            "Forward surrogate trained"
        );
        save_checkpoint::<B, FkModel<B>>(
            &model,
            &self.store.checkpoint_dir(),
            &CheckpointStore::forward_model_stem(self.robot()),
            self.store.format(),
        )?;
        Ok(model)
    }

    /// Fits a fresh forward surrogate to `dataset` by mean-squared error.
    ///
    /// Joint inputs are normalized to `[-1, 1]` with the adapter's limits.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Dataset`] if the dataset is empty or does
    /// not match the robot.
    pub fn fit_forward(
        &mut self,
        dataset: &RobotKinematicsDataset,
    ) -> Result<(FkModel<B>, TrainingMetrics)> {
        let columns = self.dataset_columns(dataset)?;
        self.phase = TrainingPhase::ForwardFit;
        let model = FkModel::new(self.topology.clone(), self.config.network, &self.device);
        let optimizer = self.config.forward.optimizer;
        match optimizer.optimizer_type {
            OptimizerType::Adam => {
                let optim = optimizer.adam_config().init::<B, FkModel<B>>();
                self.run_forward(model, dataset, &columns, optim)
            }
            OptimizerType::AdamW => {
                let optim = optimizer.adamw_config().init::<B, FkModel<B>>();
                self.run_forward(model, dataset, &columns, optim)
            }
            OptimizerType::Sgd | OptimizerType::SgdMomentum => {
                let optim = optimizer.sgd_config().init::<B, FkModel<B>>();
                self.run_forward(model, dataset, &columns, optim)
            }
        }
    }

    /// Mean-squared keypoint error of `model` over `dataset`.
    ///
    /// # Errors
    ///
    /// As [`Self::fit_forward`].
    pub fn evaluate_forward_error(
        &self,
        model: &FkModel<B>,
        dataset: &RobotKinematicsDataset,
    ) -> Result<f32> {
        let columns = self.dataset_columns(dataset)?;
        let indices: Vec<usize> = (0..dataset.len()).collect();
        let mut weighted = 0.0f64;
        for chunk in indices.chunks(self.config.forward.batch_size) {
            let (q, target) =
                forward_batch::<B>(dataset, &self.formatter, &columns, chunk, &self.device);
            let mse = scalar(&(model.forward(q) - target).powf_scalar(2.0).mean());
            #[allow(clippy::cast_precision_loss)]
            let rows = chunk.len() as f64;
            weighted += f64::from(mse) * rows;
        }
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let mse = (weighted / dataset.len() as f64) as f32;
        Ok(mse)
    }

    fn dataset_columns(&self, dataset: &RobotKinematicsDataset) -> Result<Vec<usize>> {
        if dataset.is_empty() {
            return Err(DatasetError::empty_batch("kinematics dataset has no samples").into());
        }
        if dataset.dof() != self.topology.dof() {
            return Err(DatasetError::shape_mismatch(
                "dataset joints",
                self.topology.dof().to_string(),
                dataset.dof().to_string(),
            )
            .into());
        }
        Ok(dataset.keypoint_columns(&self.adapter.keypoint_names())?)
    }

    fn run_forward<O: Optimizer<FkModel<B>, B>>(
        &mut self,
        mut model: FkModel<B>,
        dataset: &RobotKinematicsDataset,
        columns: &[usize],
        mut optim: O,
    ) -> Result<(FkModel<B>, TrainingMetrics)> {
        let config = self.config.forward.clone();
        let lr = config.optimizer.learning_rate_f64();
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        let mut metrics = TrainingMetrics::new();

        for epoch in 0..config.epochs {
            let started = Instant::now();
            if config.shuffle {
                order.shuffle(&mut self.rng);
            }
            let mut total = 0.0f32;
            let mut batches = 0usize;
            for chunk in order.chunks(config.batch_size) {
                let (q, target) =
                    forward_batch::<B>(dataset, &self.formatter, columns, chunk, &self.device);
                let loss = (model.forward(q) - target).powf_scalar(2.0).mean();
                total += scalar(&loss);
                batches += 1;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);
            }

            #[allow(clippy::cast_precision_loss)]
            let avg = total / batches.max(1) as f32;
            info!(epoch, loss = avg, "Forward fit epoch");
            metrics.add_epoch(
                EpochMetrics::new(epoch, avg)
                    .with_learning_rate(config.optimizer.learning_rate)
                    .with_train_time(started.elapsed().as_secs_f32())
                    .with_samples(dataset.len()),
            );
        }
        Ok((model, metrics))
    }

    // ========================================================================
    // Phase two: inverse solver
    // ========================================================================

    /// Runs both phases against recorded human motion.
    ///
    /// Fingertip trajectories are taken at each descriptor's human id and
    /// resampled to the configured point-cloud size.
    ///
    /// # Errors
    ///
    /// Any error from [`HumanPointCloud::from_motion`] or
    /// [`Self::train_on_points`].
    pub fn train(&mut self, motion: &HumanMotion, tag: &str) -> Result<TrainingOutcome<B>> {
        let warning = motion.check_unit_scale();
        let ids = self.adapter.keypoint_info().human_ids();
        let inverse = &self.config.inverse;
        let cloud = HumanPointCloud::from_motion(
            motion,
            &ids,
            inverse.point_cloud_size,
            inverse.voxel_size,
            &mut self.rng,
        )?;
        let mut outcome = self.train_on_points(&cloud, tag)?;
        outcome.warning = warning;
        Ok(outcome)
    }

    /// Runs both phases against an already resampled human point cloud.
    ///
    /// The forward surrogate is loaded or fitted first, then frozen. Each
    /// epoch writes `epoch_<N>` and `last` checkpoints into a new run
    /// directory and into the robot's `_last` directory.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] if the cloud's finger count
    /// differs from the robot's, [`TrainingError::Loss`] if the chamfer
    /// target cannot be built, and storage errors from checkpointing.
    pub fn train_on_points(
        &mut self,
        cloud: &HumanPointCloud,
        tag: &str,
    ) -> Result<TrainingOutcome<B>> {
        let fingers = self.topology.num_fingers();
        if cloud.num_fingers() != fingers {
            return Err(TrainingError::invalid_config(format!(
                "human point cloud has {} fingers, robot has {fingers} keypoints",
                cloud.num_fingers()
            )));
        }
        if cloud.is_empty() {
            return Err(DatasetError::empty_batch("human point cloud has no samples").into());
        }

        let surrogate = FrozenSurrogate::freeze(self.forward_model(false)?);
        let robot_points = self.robot_pointcloud()?;
        if robot_points.len() != fingers || robot_points.iter().any(Vec::is_empty) {
            return Err(TrainingError::loss(format!(
                "chamfer target has {} fingers, expected {fingers}",
                robot_points.len()
            )));
        }

        self.phase = TrainingPhase::InverseFit;
        let dirs = self.store.create_run(self.robot(), tag, &Local::now())?;
        dirs.write_config(
            &self
                .adapter
                .resolved_config()
                .with_hidden_width(self.config.network.hidden),
        )?;
        for descriptor in &self.adapter.keypoint_info().descriptors {
            info!(
                robot_keypoint = %descriptor.name,
                human_id = descriptor.human_id,
                "Keypoint correspondence"
            );
        }

        let model = IkModel::new(self.topology.clone(), self.config.network, &self.device);
        let optimizer = self.config.inverse.optimizer;
        let (model, metrics) = match optimizer.optimizer_type {
            OptimizerType::Adam => {
                let optim = optimizer.adam_config().init::<B, IkModel<B>>();
                self.run_inverse(model, &surrogate, cloud, &robot_points, &dirs, optim)?
            }
            OptimizerType::AdamW => {
                let optim = optimizer.adamw_config().init::<B, IkModel<B>>();
                self.run_inverse(model, &surrogate, cloud, &robot_points, &dirs, optim)?
            }
            OptimizerType::Sgd | OptimizerType::SgdMomentum => {
                let optim = optimizer.sgd_config().init::<B, IkModel<B>>();
                self.run_inverse(model, &surrogate, cloud, &robot_points, &dirs, optim)?
            }
        };

        self.phase = TrainingPhase::Ready;
        Ok(TrainingOutcome {
            model,
            metrics,
            run_dir: dirs.run().to_path_buf(),
            last_dir: dirs.last().to_path_buf(),
            warning: None,
        })
    }

    fn run_inverse<O: Optimizer<IkModel<B>, B>>(
        &mut self,
        mut model: IkModel<B>,
        surrogate: &FrozenSurrogate<B>,
        cloud: &HumanPointCloud,
        robot_points: &[Vec<KeypointSample>],
        dirs: &RunDirs,
        mut optim: O,
    ) -> Result<(IkModel<B>, TrainingMetrics)> {
        let config = self.config.inverse.clone();
        let lr = config.optimizer.learning_rate_f64();
        let terms: Vec<LossTerm> = self.composition.active().copied().collect();
        let mut metrics = TrainingMetrics::new();

        for epoch in 0..config.epochs {
            let started = Instant::now();
            let batches = cloud.batches(config.batch_size, config.shuffle, &mut self.rng)?;
            let mut total = 0.0f32;
            let mut sum = LossBreakdown::default();

            for (batch_idx, batch) in batches.iter().enumerate() {
                let points = point_tensor::<B>(batch, &self.device);
                let (loss, losses) =
                    self.inverse_loss(&model, surrogate, points, robot_points, &terms, &config);
                total += scalar(&loss);
                sum.accumulate(&losses);

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);

                if batch_idx % config.log_every == 0 {
                    info!(epoch, batch = batch_idx, "Epoch {epoch} | Losses - {losses}");
                }
            }

            dirs.save_epoch::<B, IkModel<B>>(&model, epoch)?;
            debug!(epoch, run = %dirs.run().display(), "Inverse checkpoint written");

            #[allow(clippy::cast_precision_loss)]
            let n = batches.len().max(1) as f32;
            metrics.add_epoch(
                EpochMetrics::new(epoch, total / n)
                    .with_learning_rate(config.optimizer.learning_rate)
                    .with_train_time(started.elapsed().as_secs_f32())
                    .with_samples(cloud.len())
                    .with_losses(sum.scaled(1.0 / n)),
            );
        }
        Ok((model, metrics))
    }

    /// Weighted sum of the active terms for one batch, and their raw values.
    fn inverse_loss(
        &mut self,
        model: &IkModel<B>,
        surrogate: &FrozenSurrogate<B>,
        points: Tensor<B, 3>,
        robot_points: &[Vec<KeypointSample>],
        terms: &[LossTerm],
        config: &InverseFitConfig,
    ) -> (Tensor<B, 1>, LossBreakdown) {
        let [batch, fingers, _] = points.dims();
        let joints = model.forward(points.clone());
        let decoded = surrogate.decode(joints.clone());
        let roundtrip = |p: Tensor<B, 3>| surrogate.decode(model.forward(p));

        let mut total = Tensor::zeros([1], &self.device);
        let mut losses = LossBreakdown::default();
        for term in terms {
            let value = match term.kind {
                LossKind::Direction => {
                    let scale = self.direction_scales(batch);
                    let moved = points.clone() + self.random_directions(batch, fingers) * scale;
                    let decoded_moved = roundtrip(moved.clone());
                    direction_loss(points.clone(), moved, decoded.clone(), decoded_moved)
                }
                LossKind::Chamfer => {
                    let targets = self.chamfer_targets(robot_points, config.chamfer_samples);
                    chamfer_loss(&decoded, &targets)
                }
                LossKind::Curvature => {
                    let delta = self
                        .random_directions(batch, fingers)
                        .mul_scalar(CURVATURE_SCALE);
                    let plus = roundtrip(points.clone() + delta.clone());
                    let minus = roundtrip(points.clone() - delta);
                    curvature_loss(decoded.clone(), plus, minus)
                }
                LossKind::Collision => collision_loss(&self.device),
                LossKind::Pinch => pinch_loss(&points, &decoded),
                LossKind::JointLimit => {
                    let (lower, upper) = self.physical_bounds();
                    let physical = (joints.clone().add_scalar(1.0).mul_scalar(0.5)
                        * (upper.clone() - lower.clone()))
                        + lower.clone();
                    joint_limit_loss(physical, lower, upper, JOINT_LIMIT_MARGIN)
                }
            };
            losses.set(term.kind, scalar(&value));
            total = total + value.mul_scalar(term.weight);
        }
        (total, losses)
    }

    /// Unit vectors `[batch, fingers, 3]` from an isotropic normal.
    fn random_directions(&mut self, batch: usize, fingers: usize) -> Tensor<B, 3> {
        let n = batch * fingers;
        let data: Vec<f32> = (0..n * 3)
            .map(|_| self.rng.sample::<f32, _>(StandardNormal))
            .collect();
        let raw = Tensor::<B, 2>::from_data(TensorData::new(data, [n, 3]), &self.device);
        normalize_rows(raw, UNIT_EPS).reshape([batch, fingers, 3])
    }

    /// Per-sample direction perturbation magnitudes `[batch, 1, 1]`.
    fn direction_scales(&mut self, batch: usize) -> Tensor<B, 3> {
        let data: Vec<f32> = (0..batch)
            .map(|_| DIRECTION_SCALE_MIN + self.rng.gen::<f32>() * DIRECTION_SCALE_RANGE)
            .collect();
        Tensor::from_data(TensorData::new(data, [batch, 1, 1]), &self.device)
    }

    /// Robot keypoints at shared random dataset indices, one `[samples, 3]`
    /// tensor per finger.
    fn chamfer_targets(
        &mut self,
        robot_points: &[Vec<KeypointSample>],
        samples: usize,
    ) -> Vec<Tensor<B, 2>> {
        let n = robot_points.first().map_or(0, Vec::len);
        let indices: Vec<usize> = (0..samples).map(|_| self.rng.gen_range(0..n)).collect();
        robot_points
            .iter()
            .map(|finger| {
                let data: Vec<f32> = indices.iter().flat_map(|&i| finger[i]).collect();
                Tensor::from_data(TensorData::new(data, [samples, 3]), &self.device)
            })
            .collect()
    }

    /// Clipped joint limits as `[1, dof]` tensors.
    #[allow(clippy::cast_possible_truncation)]
    fn physical_bounds(&self) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let limits = self.adapter.joint_limits();
        let dof = limits.len();
        let to_tensor = |values: Vec<f64>| {
            let data: Vec<f32> = values.into_iter().map(|v| v as f32).collect();
            Tensor::from_data(TensorData::new(data, [1, dof]), &self.device)
        };
        (to_tensor(limits.lowers()), to_tensor(limits.uppers()))
    }
}

impl<B: AutodiffBackend, E: KinematicsEngine> fmt::Debug for RetargetTrainer<B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetargetTrainer")
            .field("robot", &self.robot())
            .field("phase", &self.phase)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

fn scalar<B: Backend>(t: &Tensor<B, 1>) -> f32 {
    t.clone().into_scalar().elem()
}

fn point_tensor<B: Backend>(batch: &PointBatch, device: &B::Device) -> Tensor<B, 3> {
    let shape = [batch.len(), batch.fingers(), 3];
    Tensor::from_data(TensorData::new(batch.data().to_vec(), shape), device)
}

/// Normalized joints `[b, dof]` and keypoints `[b, fingers, 3]` of the
/// given dataset rows.
fn forward_batch<B: Backend>(
    dataset: &RobotKinematicsDataset,
    formatter: &HandFormatter,
    columns: &[usize],
    indices: &[usize],
    device: &B::Device,
) -> (Tensor<B, 2>, Tensor<B, 3>) {
    let dof = dataset.dof();
    let mut q = Vec::with_capacity(indices.len() * dof);
    let mut kp = Vec::with_capacity(indices.len() * columns.len() * 3);
    for &i in indices {
        q.extend(formatter.normalize_f32(&dataset.qpos()[i]));
        let row = &dataset.keypoints()[i];
        for &c in columns {
            kp.extend_from_slice(&row[c]);
        }
    }
    let b = indices.len();
    (
        Tensor::from_data(TensorData::new(q, [b, dof]), device),
        Tensor::from_data(TensorData::new(kp, [b, columns.len(), 3]), device),
    )
}
