//! Training metrics and logging.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::loss::{LossKind, format_loss};

/// Per-term loss values, unweighted.
///
/// # Example
///
/// ```
/// use retarget_training::{LossBreakdown, LossKind};
///
/// let mut total = LossBreakdown::default();
/// total.set(LossKind::Chamfer, 0.5);
/// total.accumulate(&total.clone());
/// assert!((total.get(LossKind::Chamfer) - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LossBreakdown {
    /// Direction-consistency term.
    pub direction: f32,
    /// Chamfer term.
    pub chamfer: f32,
    /// Curvature term.
    pub curvature: f32,
    /// Collision term.
    pub collision: f32,
    /// Pinch term.
    pub pinch: f32,
    /// Joint-limit term, `None` while disabled.
    pub joint_limit: Option<f32>,
}

impl LossBreakdown {
    /// Value of one term; a disabled joint-limit term reads as zero.
    #[must_use]
    pub fn get(&self, kind: LossKind) -> f32 {
        match kind {
            LossKind::Direction => self.direction,
            LossKind::Chamfer => self.chamfer,
            LossKind::Curvature => self.curvature,
            LossKind::Collision => self.collision,
            LossKind::Pinch => self.pinch,
            LossKind::JointLimit => self.joint_limit.unwrap_or(0.0),
        }
    }

    /// Sets one term.
    pub fn set(&mut self, kind: LossKind, value: f32) {
        match kind {
            LossKind::Direction => self.direction = value,
            LossKind::Chamfer => self.chamfer = value,
            LossKind::Curvature => self.curvature = value,
            LossKind::Collision => self.collision = value,
            LossKind::Pinch => self.pinch = value,
            LossKind::JointLimit => self.joint_limit = Some(value),
        }
    }

    /// Adds another breakdown term by term.
    pub fn accumulate(&mut self, other: &Self) {
        self.direction += other.direction;
        self.chamfer += other.chamfer;
        self.curvature += other.curvature;
        self.collision += other.collision;
        self.pinch += other.pinch;
        self.joint_limit = match (self.joint_limit, other.joint_limit) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
    }

    /// Every term multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            direction: self.direction * factor,
            chamfer: self.chamfer * factor,
            curvature: self.curvature * factor,
            collision: self.collision * factor,
            pinch: self.pinch * factor,
            joint_limit: self.joint_limit.map(|v| v * factor),
        }
    }
}

impl fmt::Display for LossBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Direction: {} - Chamfer: {} - Curvature: {} - Collision: {} - Pinch: {}",
            format_loss(self.direction),
            format_loss(self.chamfer),
            format_loss(self.curvature),
            format_loss(self.collision),
            format_loss(self.pinch),
        )?;
        if let Some(limit) = self.joint_limit {
            write!(f, " - JointLimit: {}", format_loss(limit))?;
        }
        Ok(())
    }
}

/// Metrics for a single training epoch.
///
/// # Example
///
/// ```
/// use retarget_training::EpochMetrics;
///
/// let metrics = EpochMetrics::new(0, 0.5).with_samples(1000);
/// assert_eq!(metrics.epoch, 0);
/// assert!((metrics.train_loss - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number (0-indexed).
    pub epoch: usize,

    /// Mean total loss over the epoch's batches.
    pub train_loss: f32,

    /// Learning rate used.
    pub learning_rate: f32,

    /// Training time in seconds.
    pub train_time_secs: f32,

    /// Number of training samples processed.
    pub train_samples: usize,

    /// Mean per-term losses (inverse fit only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub losses: Option<LossBreakdown>,

    /// Optional additional metrics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_metrics: Vec<(String, f32)>,
}

impl EpochMetrics {
    /// Creates new epoch metrics.
    #[must_use]
    pub const fn new(epoch: usize, train_loss: f32) -> Self {
        Self {
            epoch,
            train_loss,
            learning_rate: 0.0,
            train_time_secs: 0.0,
            train_samples: 0,
            losses: None,
            extra_metrics: Vec::new(),
        }
    }

    /// Sets the learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the training time.
    #[must_use]
    pub const fn with_train_time(mut self, secs: f32) -> Self {
        self.train_time_secs = secs;
        self
    }

    /// Sets the sample count.
    #[must_use]
    pub const fn with_samples(mut self, train: usize) -> Self {
        self.train_samples = train;
        self
    }

    /// Sets the per-term losses.
    #[must_use]
    pub const fn with_losses(mut self, losses: LossBreakdown) -> Self {
        self.losses = Some(losses);
        self
    }

    /// Adds an extra metric.
    #[must_use]
    pub fn with_metric(mut self, name: impl Into<String>, value: f32) -> Self {
        self.extra_metrics.push((name.into(), value));
        self
    }

    /// Gets an extra metric by name.
    #[must_use]
    pub fn get_metric(&self, name: &str) -> Option<f32> {
        self.extra_metrics
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Aggregate metrics for one training phase.
///
/// # Example
///
/// ```
/// use retarget_training::{EpochMetrics, TrainingMetrics};
///
/// let mut metrics = TrainingMetrics::new();
/// metrics.add_epoch(EpochMetrics::new(0, 0.5));
/// metrics.add_epoch(EpochMetrics::new(1, 0.3));
///
/// assert_eq!(metrics.epochs_completed(), 2);
/// assert!((metrics.final_loss() - 0.3).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Metrics for each epoch.
    pub epoch_metrics: Vec<EpochMetrics>,

    /// Total training time in seconds.
    pub total_time_secs: f32,
}

impl TrainingMetrics {
    /// Creates new empty training metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds metrics for an epoch.
    pub fn add_epoch(&mut self, metrics: EpochMetrics) {
        self.total_time_secs += metrics.train_time_secs;
        self.epoch_metrics.push(metrics);
    }

    /// Returns the number of completed epochs.
    #[must_use]
    pub fn epochs_completed(&self) -> usize {
        self.epoch_metrics.len()
    }

    /// Returns the final training loss.
    #[must_use]
    pub fn final_loss(&self) -> f32 {
        self.epoch_metrics.last().map_or(f32::NAN, |m| m.train_loss)
    }

    /// Returns the initial training loss.
    #[must_use]
    pub fn initial_loss(&self) -> f32 {
        self.epoch_metrics
            .first()
            .map_or(f32::NAN, |m| m.train_loss)
    }

    /// Returns the loss improvement ratio.
    #[must_use]
    pub fn loss_improvement(&self) -> f32 {
        let initial = self.initial_loss();
        let final_loss = self.final_loss();
        if initial > 0.0 && !initial.is_nan() && !final_loss.is_nan() {
            1.0 - (final_loss / initial)
        } else {
            0.0
        }
    }

    /// Returns training losses as a vector.
    #[must_use]
    pub fn train_losses(&self) -> Vec<f32> {
        self.epoch_metrics.iter().map(|m| m.train_loss).collect()
    }

    /// Per-term losses of the last epoch that recorded them.
    #[must_use]
    pub fn final_breakdown(&self) -> Option<LossBreakdown> {
        self.epoch_metrics.iter().rev().find_map(|m| m.losses)
    }

    /// Returns a human-readable summary.
    #[must_use]
    #[allow(clippy::let_underscore_must_use)] // String::write_fmt is infallible
    pub fn summary(&self) -> String {
        use std::fmt::Write;

        let mut s = String::new();
        let _ = writeln!(s, "Training Summary");
        let _ = writeln!(s, "================");
        let _ = writeln!(s, "Epochs completed: {}", self.epochs_completed());
        let _ = writeln!(s, "Total time: {:.1}s", self.total_time_secs);
        let _ = writeln!(
            s,
            "Initial loss: {} -> Final loss: {}",
            format_loss(self.initial_loss()),
            format_loss(self.final_loss())
        );
        let _ = writeln!(s, "Improvement: {:.1}%", self.loss_improvement() * 100.0);
        if let Some(losses) = self.final_breakdown() {
            let _ = writeln!(s, "Final terms: {losses}");
        }
        s
    }
}
