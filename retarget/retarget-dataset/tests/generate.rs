//! Dataset generation against a small kinematic tree.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use retarget_dataset::{DatasetError, RobotKinematicsDataset};
use retarget_kinematics::{KinematicTree, KinematicsAdapter, Origin, TreeDescription, TreeJoint};
use retarget_types::{FingertipConfig, JointLimit, RobotConfig};

fn adapter() -> KinematicsAdapter<KinematicTree> {
    let lim = JointLimit::new(-0.8, 0.8);
    let tree = KinematicTree::new(TreeDescription {
        name: "pair".into(),
        root: "palm".into(),
        links: vec!["palm".into(), "a".into(), "a_tip".into(), "b".into(), "b_tip".into()],
        joints: vec![
            TreeJoint::revolute("a0", "palm", "a", Origin::from_xyz(0.0, 0.02, 0.0), Vector3::z(), lim),
            TreeJoint::revolute("a1", "a", "a_tip", Origin::from_xyz(0.05, 0.0, 0.0), Vector3::z(), lim),
            TreeJoint::revolute("b0", "palm", "b", Origin::from_xyz(0.0, -0.02, 0.0), Vector3::z(), lim),
            TreeJoint::revolute("b1", "b", "b_tip", Origin::from_xyz(0.05, 0.0, 0.0), Vector3::z(), lim),
        ],
    })
    .unwrap();
    let config = RobotConfig {
        name: "pair".into(),
        urdf_path: String::new(),
        base_link: "palm".into(),
        joint_order: vec!["a0".into(), "a1".into(), "b0".into(), "b1".into()],
        fingertips: vec![
            FingertipConfig {
                name: "thumb".into(),
                link: "a_tip".into(),
                joints: vec!["a0".into(), "a1".into()],
                center_offset: [0.03, 0.0, 0.0],
                human_hand_id: 4,
            },
            FingertipConfig {
                name: "index".into(),
                link: "b_tip".into(),
                joints: vec!["b0".into(), "b1".into()],
                center_offset: [0.03, 0.0, 0.0],
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
fn samples_stay_inside_limits() {
    let adapter = adapter();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let dataset = RobotKinematicsDataset::generate(&adapter, 500, &mut rng).unwrap();
    assert_eq!(dataset.len(), 500);
    assert_eq!(dataset.keypoint_names(), &["thumb".to_string(), "index".to_string()]);
    for (q, kp) in dataset.qpos().iter().zip(dataset.keypoints()) {
        assert!(adapter.joint_limits().contains(q));
        assert_eq!(kp, &adapter.keypoint_vector(q).unwrap());
    }
}

#[test]
fn cache_is_reused_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("pair.rkd");
    let adapter = adapter();

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let first = RobotKinematicsDataset::load_or_generate(&path, &adapter, 64, &mut rng).unwrap();
    assert!(path.exists());

    let mut other_rng = ChaCha8Rng::seed_from_u64(2);
    let second =
        RobotKinematicsDataset::load_or_generate(&path, &adapter, 999, &mut other_rng).unwrap();
    assert_eq!(first, second);
    assert_eq!(second.len(), 64);
}

#[test]
fn cache_with_foreign_keypoints_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pair.rkd");
    RobotKinematicsDataset::from_parts(
        "pair",
        vec!["a0".into(), "a1".into(), "b0".into(), "b1".into()],
        vec!["ring".into()],
        vec![vec![0.0; 4]],
        vec![vec![[0.0; 3]]],
    )
    .unwrap()
    .save(&path)
    .unwrap();

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let err = RobotKinematicsDataset::load_or_generate(&path, &adapter(), 8, &mut rng).unwrap_err();
    assert!(matches!(err, DatasetError::UnknownKeypoint(_)));
}
