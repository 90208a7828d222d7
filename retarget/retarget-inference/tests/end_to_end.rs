//! Train a tiny hand, then serve it from the checkpoint store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use burn::backend::Autodiff;
use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use nalgebra::Vector3;
use retarget_dataset::HumanPointCloud;
use retarget_inference::{InferenceError, RetargetingModel, load_model, load_model_with_network};
use retarget_kinematics::{KinematicTree, KinematicsAdapter, Origin, TreeDescription, TreeJoint};
use retarget_models::FingerNetConfig;
use retarget_training::{
    CONFIG_FILE, CheckpointStore, DatasetConfig, ForwardFitConfig, InverseFitConfig,
    RetargetTrainer, TrainerConfig,
};
use retarget_types::{FingertipConfig, JointLimit, RobotConfig};

const NETWORK: FingerNetConfig = FingerNetConfig::new(16);

fn adapter() -> KinematicsAdapter<KinematicTree> {
    let lim = JointLimit::new(-0.7, 0.7);
    let tree = KinematicTree::new(TreeDescription {
        name: "pincer".into(),
        root: "palm".into(),
        links: vec!["palm".into(), "a".into(), "b".into()],
        joints: vec![
            TreeJoint::revolute("a0", "palm", "a", Origin::from_xyz(0.0, 0.02, 0.0), Vector3::z(), lim),
            TreeJoint::revolute("b0", "palm", "b", Origin::from_xyz(0.0, -0.02, 0.0), Vector3::z(), lim),
        ],
    })
    .unwrap();
    let config = RobotConfig {
        name: "pincer".into(),
        urdf_path: String::new(),
        base_link: "palm".into(),
        joint_order: vec!["a0".into(), "b0".into()],
        fingertips: vec![
            FingertipConfig {
                name: "thumb".into(),
                link: "a".into(),
                joints: vec!["a0".into()],
                center_offset: [0.04, 0.0, 0.0],
                human_hand_id: 4,
            },
            FingertipConfig {
                name: "index".into(),
                link: "b".into(),
                joints: vec!["b0".into()],
                center_offset: [0.04, 0.0, 0.0],
                human_hand_id: 8,
            },
        ],
        joint_range_clip_ratio: Default::default(),
        joint: None,
        hidden: None,
    };
    KinematicsAdapter::new(config, tree).unwrap()
}

#[test]
fn served_model_matches_trained_model() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    let config = TrainerConfig::default()
        .with_dataset(DatasetConfig::new(128))
        .with_forward(ForwardFitConfig::new(2).with_batch_size(32))
        .with_inverse(
            InverseFitConfig::default()
                .with_epochs(2)
                .with_batch_size(32)
                .with_chamfer_samples(32)
                .with_point_cloud_size(64),
        )
        .with_network(NETWORK)
        .with_seed(9);
    let mut trainer =
        RetargetTrainer::<Autodiff<NdArray<f32>>, _>::new(adapter(), store.clone(), config, Default::default())
            .unwrap();
    let robot = trainer.robot_pointcloud().unwrap();
    let cloud =
        HumanPointCloud::from_resampled(robot.iter().map(|f| f[..64].to_vec()).collect()).unwrap();
    let outcome = trainer.train_on_points(&cloud, "serve").unwrap();

    let device = Default::default();
    let served = load_model::<NdArray<f32>>(&store, "serve", 0, &device).unwrap();
    assert_eq!(served.config().hidden, Some(NETWORK.hidden));
    assert_eq!(served.dof(), 2);
    assert_eq!(served.config().name, "pincer");

    let mut skeleton = vec![[0.0f32; 3]; 21];
    skeleton[4] = robot[0][3];
    skeleton[8] = robot[1][3];
    let q = served.forward(&skeleton).unwrap();

    let input = Tensor::<Autodiff<NdArray<f32>>, 3>::from_data(
        TensorData::new([robot[0][3], robot[1][3]].concat(), [1, 2, 3]),
        &device,
    );
    let normalized: Vec<f32> = outcome.model.forward(input).into_data().to_vec().unwrap();
    let expected = trainer.formatter().unnormalize_f32(&normalized);
    for (a, b) in q.iter().zip(&expected) {
        approx::assert_relative_eq!(a, b, epsilon = 1e-5);
    }

    let first_epoch =
        load_model_with_network::<NdArray<f32>>(&store, "serve", 1, NETWORK, &device).unwrap();
    assert_eq!(first_epoch.forward(&skeleton).unwrap().len(), 2);

    let direct = RetargetingModel::<NdArray<f32>>::load(
        outcome.last_dir.join("last.bin"),
        outcome.last_dir.join(CONFIG_FILE),
        &device,
    )
    .unwrap();
    assert_eq!(direct.forward(&skeleton).unwrap(), q);
}

#[test]
fn unknown_tag_is_model_load_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("checkpoint").join("pincer_last")).unwrap();
    let store = CheckpointStore::new(dir.path());
    let result = load_model_with_network::<NdArray<f32>>(&store, "shadow", 0, NETWORK, &Default::default());
    assert!(matches!(result, Err(InferenceError::ModelLoad(_))));

    let result = load_model_with_network::<NdArray<f32>>(&store, "pincer", 3, NETWORK, &Default::default());
    assert!(matches!(result, Err(InferenceError::ModelLoad(_))));
}
