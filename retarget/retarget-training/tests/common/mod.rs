//! Toy hands shared by the training integration tests.

#![allow(dead_code)]

use burn::backend::Autodiff;
use burn_ndarray::NdArray;
use nalgebra::Vector3;
use retarget_kinematics::{KinematicTree, KinematicsAdapter, Origin, TreeDescription, TreeJoint};
use retarget_types::{FingertipConfig, JointLimit, RobotConfig};

pub type TestBackend = Autodiff<NdArray<f32>>;

/// Routes trainer logs to the test harness; `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Two planar fingers of `links` revolute-z joints each, 3 cm phalanges.
pub fn planar_hand(links: usize) -> KinematicsAdapter<KinematicTree> {
    let limit = JointLimit::new(-0.5, 0.9);
    let mut tree_links = vec!["palm".to_string()];
    let mut joints = Vec::new();
    let mut joint_order = Vec::new();
    let mut fingertips = Vec::new();

    for (finger, (name, y, human_id)) in [("thumb", 0.02, 4), ("index", -0.02, 8)]
        .into_iter()
        .enumerate()
    {
        let mut parent = "palm".to_string();
        let mut finger_joints = Vec::new();
        for j in 0..links {
            let child = format!("f{finger}_l{j}");
            let joint = format!("f{finger}_j{j}");
            let origin = if j == 0 {
                Origin::from_xyz(0.0, y, 0.0)
            } else {
                Origin::from_xyz(0.03, 0.0, 0.0)
            };
            joints.push(TreeJoint::revolute(
                joint.clone(),
                parent.clone(),
                child.clone(),
                origin,
                Vector3::z(),
                limit,
            ));
            tree_links.push(child.clone());
            joint_order.push(joint.clone());
            finger_joints.push(joint);
            parent = child;
        }
        fingertips.push(FingertipConfig {
            name: name.into(),
            link: parent,
            joints: finger_joints,
            center_offset: [0.03, 0.0, 0.0],
            human_hand_id: human_id,
        });
    }

    let tree = KinematicTree::new(TreeDescription {
        name: "planar".into(),
        root: "palm".into(),
        links: tree_links,
        joints,
    })
    .unwrap();
    let config = RobotConfig {
        name: "planar".into(),
        urdf_path: String::new(),
        base_link: "palm".into(),
        joint_order,
        fingertips,
        joint_range_clip_ratio: Default::default(),
        joint: None,
        hidden: None,
    };
    KinematicsAdapter::new(config, tree).unwrap()
}

/// Two fingers whose tips translate freely along x, y and z within
/// `±reach`, rooted `reach` apart on either side of the palm.
pub fn cartesian_hand(reach: f64) -> KinematicsAdapter<KinematicTree> {
    let limit = JointLimit::new(-reach, reach);
    let axes = [("x", Vector3::x()), ("y", Vector3::y()), ("z", Vector3::z())];
    let mut links = vec!["palm".to_string()];
    let mut joints = Vec::new();
    let mut joint_order = Vec::new();
    let mut fingertips = Vec::new();

    for (name, y, human_id) in [("thumb", reach, 4), ("index", -reach, 8)] {
        let mut parent = "palm".to_string();
        let mut finger_joints = Vec::new();
        for (i, (axis, dir)) in axes.iter().enumerate() {
            let child = format!("{name}_{axis}");
            let joint = format!("{name}_slide_{axis}");
            let origin = if i == 0 {
                Origin::from_xyz(0.0, y, 0.0)
            } else {
                Origin::from_xyz(0.0, 0.0, 0.0)
            };
            joints.push(TreeJoint::prismatic(
                joint.clone(),
                parent.clone(),
                child.clone(),
                origin,
                *dir,
                limit,
            ));
            links.push(child.clone());
            joint_order.push(joint.clone());
            finger_joints.push(joint);
            parent = child;
        }
        fingertips.push(FingertipConfig {
            name: name.into(),
            link: parent,
            joints: finger_joints,
            center_offset: [0.0, 0.0, 0.0],
            human_hand_id: human_id,
        });
    }

    let tree = KinematicTree::new(TreeDescription {
        name: "cartesian".into(),
        root: "palm".into(),
        links,
        joints,
    })
    .unwrap();
    let config = RobotConfig {
        name: "cartesian".into(),
        urdf_path: String::new(),
        base_link: "palm".into(),
        joint_order,
        fingertips,
        joint_range_clip_ratio: Default::default(),
        joint: None,
        hidden: None,
    };
    KinematicsAdapter::new(config, tree).unwrap()
}
