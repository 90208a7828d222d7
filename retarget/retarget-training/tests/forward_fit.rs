//! Forward surrogate fitting on a planar two-finger hand.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{TestBackend, init_logging, planar_hand};
use retarget_models::{FingerNetConfig, FkModel};
use retarget_training::{
    CheckpointStore, DatasetConfig, ForwardFitConfig, OptimizerConfig, RetargetTrainer,
    TrainerConfig, TrainingPhase,
};

fn config() -> TrainerConfig {
    TrainerConfig::default()
        .with_dataset(DatasetConfig::new(1000))
        .with_forward(
            ForwardFitConfig::new(30)
                .with_batch_size(64)
                .with_optimizer(OptimizerConfig::adam(1e-3)),
        )
        .with_network(FingerNetConfig::new(64))
        .with_seed(17)
}

#[test]
fn forward_fit_reduces_error_tenfold() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut trainer = RetargetTrainer::<TestBackend, _>::new(
        planar_hand(4),
        CheckpointStore::new(dir.path()),
        config(),
        Default::default(),
    )
    .unwrap();
    assert_eq!(trainer.topology().dof(), 8);

    let dataset = trainer.kinematics_dataset().unwrap();
    assert_eq!(dataset.len(), 1000);

    let untrained = FkModel::<TestBackend>::new(
        trainer.topology().clone(),
        trainer.config().network,
        &Default::default(),
    );
    let initial = trainer.evaluate_forward_error(&untrained, &dataset).unwrap();

    let (model, metrics) = trainer.fit_forward(&dataset).unwrap();
    let fitted = trainer.evaluate_forward_error(&model, &dataset).unwrap();

    assert_eq!(trainer.phase(), TrainingPhase::ForwardFit);
    assert_eq!(metrics.epochs_completed(), 30);
    assert!(metrics.final_loss() < metrics.initial_loss());
    assert!(
        fitted <= initial / 10.0,
        "forward error {fitted} not a tenth of {initial}"
    );
}

#[test]
fn forward_model_is_written_once_and_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path());
    let quick = config()
        .with_dataset(DatasetConfig::new(128))
        .with_forward(ForwardFitConfig::new(1).with_batch_size(32));
    let mut trainer =
        RetargetTrainer::<TestBackend, _>::new(planar_hand(2), store.clone(), quick, Default::default())
            .unwrap();

    let trained = trainer.forward_model(false).unwrap();
    let path = store.forward_model_path("planar");
    let written = std::fs::metadata(&path).unwrap().modified().unwrap();

    let reloaded = trainer.forward_model(false).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), written);

    let dataset = trainer.kinematics_dataset().unwrap();
    let a = trainer.evaluate_forward_error(&trained, &dataset).unwrap();
    let b = trainer.evaluate_forward_error(&reloaded, &dataset).unwrap();
    approx::assert_relative_eq!(a, b, epsilon = 1e-6);

    trainer.forward_model(true).unwrap();
    assert!(path.exists());
}
