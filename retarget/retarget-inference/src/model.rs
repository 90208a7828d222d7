//! Trained inverse solver bundled with its joint normalizer.

use std::path::Path;

use burn::prelude::Backend;
use burn::tensor::{Tensor, TensorData};
use retarget_dataset::DatasetError;
use retarget_models::{FingerNetConfig, HandTopology, IkModel, load_checkpoint};
use retarget_training::{CONFIG_FILE, CheckpointStore};
use retarget_types::{HandFormatter, JointLimits, KeypointSample, RobotConfig};
use tracing::{debug, info};

use crate::error::{InferenceError, Result};

/// Maps 21-point human hand skeletons to robot joint positions.
///
/// # Example
///
/// ```ignore
/// use burn_ndarray::NdArray;
///
/// let model = RetargetingModel::<NdArray<f32>>::load(
///     "checkpoint/allegro_last/last.bin",
///     "checkpoint/allegro_last/config.json",
///     &Default::default(),
/// )?;
/// let q = model.forward_clamped(&skeleton)?;
/// assert_eq!(q.len(), model.dof());
/// ```
#[derive(Debug)]
pub struct RetargetingModel<B: Backend> {
    model: IkModel<B>,
    config: RobotConfig,
    limits: JointLimits,
    formatter: HandFormatter,
    human_ids: Vec<usize>,
    device: B::Device,
}

impl<B: Backend> RetargetingModel<B> {
    /// Loads weights and their configuration snapshot.
    ///
    /// The network width comes from the snapshot's `hidden` entry, or the
    /// default width when the snapshot predates it.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::ModelLoad`] if either file is missing or
    /// the weights do not fit the configured hand, and
    /// [`InferenceError::Config`] if the snapshot lacks resolved limits.
    pub fn load(
        model_path: impl AsRef<Path>,
        config_path: impl AsRef<Path>,
        device: &B::Device,
    ) -> Result<Self> {
        Self::load_from(model_path.as_ref(), config_path.as_ref(), None, device)
    }

    /// Like [`Self::load`], overriding the width recorded in the snapshot.
    ///
    /// # Errors
    ///
    /// As [`Self::load`].
    pub fn load_with_network(
        model_path: impl AsRef<Path>,
        config_path: impl AsRef<Path>,
        network: FingerNetConfig,
        device: &B::Device,
    ) -> Result<Self> {
        Self::load_from(model_path.as_ref(), config_path.as_ref(), Some(network), device)
    }

    fn load_from(
        model_path: &Path,
        config_path: &Path,
        network: Option<FingerNetConfig>,
        device: &B::Device,
    ) -> Result<Self> {
        if !config_path.is_file() {
            return Err(InferenceError::model_load(format!(
                "configuration not found: {}",
                config_path.display()
            )));
        }
        if !model_path.is_file() {
            return Err(InferenceError::model_load(format!(
                "checkpoint not found: {}",
                model_path.display()
            )));
        }

        let config = RobotConfig::load(config_path)?;
        let limits = config.resolved_limits()?;
        let formatter = HandFormatter::new(&limits);
        let info = config.keypoint_info()?;
        if limits.len() != info.dof {
            return Err(InferenceError::model_load(format!(
                "{} resolved limits for {} joints",
                limits.len(),
                info.dof
            )));
        }
        let human_ids = info.human_ids();
        let network = network
            .or_else(|| config.hidden.map(FingerNetConfig::new))
            .unwrap_or_default();
        let topology = HandTopology::from_info(&info)?;
        let model = IkModel::new(topology, network, device);
        let model = load_checkpoint::<B, IkModel<B>>(model, model_path, device)?;

        info!(
            robot = %config.name,
            checkpoint = %model_path.display(),
            dof = info.dof,
            hidden = network.hidden,
            "Loaded retargeting model"
        );
        Ok(Self {
            model,
            config,
            limits,
            formatter,
            human_ids,
            device: device.clone(),
        })
    }

    /// Robot configuration snapshot.
    #[must_use]
    pub const fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Joint limits used for unnormalization and clamping.
    #[must_use]
    pub const fn joint_limits(&self) -> &JointLimits {
        &self.limits
    }

    /// Joint normalizer.
    #[must_use]
    pub const fn formatter(&self) -> &HandFormatter {
        &self.formatter
    }

    /// Human skeleton index of each robot fingertip.
    #[must_use]
    pub fn human_ids(&self) -> &[usize] {
        &self.human_ids
    }

    /// Number of joints produced per skeleton.
    #[must_use]
    pub fn dof(&self) -> usize {
        self.limits.len()
    }

    /// Minimum number of skeleton points accepted by [`Self::forward`].
    #[must_use]
    pub fn required_points(&self) -> usize {
        self.human_ids.iter().max().map_or(0, |id| id + 1)
    }

    /// Retargets one skeleton to physical joint positions.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::Data`] if `skeleton` has fewer than
    /// [`Self::required_points`] points.
    pub fn forward(&self, skeleton: &[KeypointSample]) -> Result<Vec<f64>> {
        let mut joints = self.forward_batch(std::slice::from_ref(&skeleton.to_vec()))?;
        Ok(joints.pop().unwrap_or_default())
    }

    /// Like [`Self::forward`], then clamped into the joint limits.
    ///
    /// # Errors
    ///
    /// As [`Self::forward`].
    pub fn forward_clamped(&self, skeleton: &[KeypointSample]) -> Result<Vec<f64>> {
        Ok(self.limits.clamp(&self.forward(skeleton)?))
    }

    /// Retargets a sequence of skeletons in one pass.
    ///
    /// # Errors
    ///
    /// As [`Self::forward`], for any skeleton in the batch.
    pub fn forward_batch(&self, skeletons: &[Vec<KeypointSample>]) -> Result<Vec<Vec<f64>>> {
        if skeletons.is_empty() {
            return Ok(Vec::new());
        }
        let required = self.required_points();
        let fingers = self.human_ids.len();
        let mut data = Vec::with_capacity(skeletons.len() * fingers * 3);
        for skeleton in skeletons {
            if skeleton.len() < required {
                return Err(DatasetError::shape_mismatch(
                    "human skeleton",
                    format!("at least {required} points"),
                    skeleton.len().to_string(),
                )
                .into());
            }
            for &id in &self.human_ids {
                data.extend_from_slice(&skeleton[id]);
            }
        }

        let points = Tensor::<B, 3>::from_data(
            TensorData::new(data, [skeletons.len(), fingers, 3]),
            &self.device,
        );
        let normalized = self
            .model
            .forward(points)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| InferenceError::Output(format!("{e:?}")))?;
        debug!(batch = skeletons.len(), "Retargeted skeletons");

        Ok(normalized
            .chunks(self.dof())
            .map(|row| self.formatter.unnormalize_f32(row))
            .collect())
    }
}

/// Loads the model of the newest run whose directory name contains `tag`.
///
/// `epoch > 0` selects `epoch_<N>`, otherwise `last`. The run's
/// `config.json` supplies limits, keypoint ids and the network width.
///
/// # Errors
///
/// Returns [`InferenceError::ModelLoad`] if no run matches or its files are
/// missing.
pub fn load_model<B: Backend>(
    store: &CheckpointStore,
    tag: &str,
    epoch: usize,
    device: &B::Device,
) -> Result<RetargetingModel<B>> {
    let run = store.find_run(tag)?;
    RetargetingModel::load(store.run_model_path(&run, epoch), run.join(CONFIG_FILE), device)
}

/// Like [`load_model`], overriding the width recorded in the snapshot.
///
/// # Errors
///
/// As [`load_model`].
pub fn load_model_with_network<B: Backend>(
    store: &CheckpointStore,
    tag: &str,
    epoch: usize,
    network: FingerNetConfig,
    device: &B::Device,
) -> Result<RetargetingModel<B>> {
    let run = store.find_run(tag)?;
    let model_path = store.run_model_path(&run, epoch);
    RetargetingModel::load_with_network(model_path, run.join(CONFIG_FILE), network, device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use retarget_models::{CheckpointFormat, save_checkpoint};
    use retarget_types::{FingertipConfig, ResolvedJointLimits};

    type TestBackend = NdArray<f32>;

    fn snapshot() -> RobotConfig {
        RobotConfig {
            name: "duo".into(),
            urdf_path: String::new(),
            base_link: "palm".into(),
            joint_order: vec!["a0".into(), "a1".into(), "b0".into()],
            fingertips: vec![
                FingertipConfig {
                    name: "thumb".into(),
                    link: "a".into(),
                    joints: vec!["a0".into(), "a1".into()],
                    center_offset: [0.0; 3],
                    human_hand_id: 4,
                },
                FingertipConfig {
                    name: "index".into(),
                    link: "b".into(),
                    joints: vec!["b0".into()],
                    center_offset: [0.0; 3],
                    human_hand_id: 8,
                },
            ],
            joint_range_clip_ratio: Default::default(),
            joint: Some(ResolvedJointLimits {
                lower: vec![-1.0, 0.0, -0.5],
                upper: vec![1.0, 2.0, 0.5],
            }),
            hidden: None,
        }
    }

    fn write_model(dir: &Path, config: &RobotConfig) {
        let device = Default::default();
        let info = config.keypoint_info().unwrap();
        let topology = HandTopology::from_info(&info).unwrap();
        let model = IkModel::<TestBackend>::new(topology, FingerNetConfig::new(8), &device);
        save_checkpoint::<TestBackend, _>(&model, dir, "last", CheckpointFormat::Binary).unwrap();
        config.save(dir.join(CONFIG_FILE)).unwrap();
    }

    fn load(dir: &Path) -> RetargetingModel<TestBackend> {
        RetargetingModel::load_with_network(
            dir.join("last.bin"),
            dir.join(CONFIG_FILE),
            FingerNetConfig::new(8),
            &Default::default(),
        )
        .unwrap()
    }

    #[test]
    fn forward_stays_within_limits() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), &snapshot());
        let model = load(dir.path());
        assert_eq!(model.dof(), 3);
        assert_eq!(model.human_ids(), &[4, 8]);
        assert_eq!(model.required_points(), 9);

        let mut skeleton = vec![[0.0f32; 3]; 21];
        skeleton[4] = [0.05, 0.02, 0.1];
        skeleton[8] = [0.06, -0.02, 0.12];
        let q = model.forward(&skeleton).unwrap();
        assert_eq!(q.len(), 3);
        assert!(model.joint_limits().contains(&q));

        let clamped = model.forward_clamped(&skeleton).unwrap();
        assert_eq!(clamped, model.joint_limits().clamp(&q));
    }

    #[test]
    fn batch_matches_single() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), &snapshot());
        let model = load(dir.path());

        let a = vec![[0.01f32, 0.02, 0.03]; 9];
        let b = vec![[-0.04f32, 0.0, 0.08]; 21];
        let batch = model.forward_batch(&[a.clone(), b.clone()]).unwrap();
        for (row, single) in batch.iter().zip([model.forward(&a).unwrap(), model.forward(&b).unwrap()]) {
            for (x, y) in row.iter().zip(&single) {
                approx::assert_relative_eq!(x, y, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn short_skeleton_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), &snapshot());
        let model = load(dir.path());
        let result = model.forward(&[[0.0; 3]; 8]);
        assert!(matches!(result, Err(InferenceError::Data(_))));
    }

    #[test]
    fn missing_files_are_model_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = RetargetingModel::<TestBackend>::load(
            dir.path().join("last.bin"),
            dir.path().join(CONFIG_FILE),
            &Default::default(),
        );
        assert!(matches!(missing, Err(InferenceError::ModelLoad(_))));

        snapshot().save(dir.path().join(CONFIG_FILE)).unwrap();
        let missing = RetargetingModel::<TestBackend>::load(
            dir.path().join("last.bin"),
            dir.path().join(CONFIG_FILE),
            &Default::default(),
        );
        assert!(matches!(missing, Err(InferenceError::ModelLoad(_))));
    }

    #[test]
    fn recorded_width_is_used_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), &snapshot().with_hidden_width(8));
        let model = RetargetingModel::<TestBackend>::load(
            dir.path().join("last.bin"),
            dir.path().join(CONFIG_FILE),
            &Default::default(),
        )
        .unwrap();
        assert_eq!(model.config().hidden, Some(8));
        let q = model.forward_clamped(&[[0.02f32, 0.0, 0.05]; 9]).unwrap();
        assert_eq!(q.len(), 3);
        assert!(model.joint_limits().contains(&q));
    }

    #[test]
    fn snapshot_without_limits_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = snapshot();
        write_model(dir.path(), &config);
        config.joint = None;
        config.save(dir.path().join(CONFIG_FILE)).unwrap();

        let result = RetargetingModel::<TestBackend>::load_with_network(
            dir.path().join("last.bin"),
            dir.path().join(CONFIG_FILE),
            FingerNetConfig::new(8),
            &Default::default(),
        );
        assert!(matches!(result, Err(InferenceError::Config(_))));
    }
}
