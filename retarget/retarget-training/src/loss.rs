//! Geometric loss terms for the inverse fit.
//!
//! All functions operate on Burn tensors and return a one-element tensor so
//! they compose into a single differentiable objective. Point batches are
//! `[batch, fingers, 3]`.

use std::fmt;

use burn::prelude::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Input fingertips closer than this are treated as a pinch.
pub const PINCH_THRESHOLD: f32 = 0.015;

/// Additive guard on the pinch-pair count.
pub const PINCH_EPS: f32 = 1e-7;

/// Displacement magnitude for the curvature perturbation.
pub const CURVATURE_SCALE: f32 = 0.002;

/// Minimum displacement magnitude for the direction perturbation.
pub const DIRECTION_SCALE_MIN: f32 = 0.001;

/// Random extra displacement magnitude for the direction perturbation.
pub const DIRECTION_SCALE_RANGE: f32 = 0.01;

/// Norm floor when normalizing displacements.
pub const DIRECTION_EPS: f32 = 1e-5;

/// Weights of the composite inverse-fit objective.
///
/// # Example
///
/// ```
/// use retarget_training::LossWeights;
///
/// let weights = LossWeights::default();
/// assert!((weights.chamfer - 80.0).abs() < 1e-6);
/// assert!((weights.collision - 0.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossWeights {
    /// Direction-consistency weight.
    pub direction: f32,

    /// Chamfer correspondence weight.
    pub chamfer: f32,

    /// Curvature regularization weight.
    pub curvature: f32,

    /// Collision weight (the term itself is a zero placeholder).
    pub collision: f32,

    /// Pinch-preservation weight.
    pub pinch: f32,

    /// Joint-limit weight, used only when the term is enabled.
    pub joint_limit: f32,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self {
            direction: 1.0,
            chamfer: 80.0,
            curvature: 0.1,
            collision: 0.0,
            pinch: 1.0,
            joint_limit: 10.0,
        }
    }
}

impl LossWeights {
    /// Sets the chamfer weight.
    #[must_use]
    pub const fn with_chamfer(mut self, weight: f32) -> Self {
        self.chamfer = weight;
        self
    }

    /// Sets the curvature weight.
    #[must_use]
    pub const fn with_curvature(mut self, weight: f32) -> Self {
        self.curvature = weight;
        self
    }

    /// Sets the collision weight.
    #[must_use]
    pub const fn with_collision(mut self, weight: f32) -> Self {
        self.collision = weight;
        self
    }

    /// Sets the pinch weight.
    #[must_use]
    pub const fn with_pinch(mut self, weight: f32) -> Self {
        self.pinch = weight;
        self
    }

    /// Sets the joint-limit weight.
    #[must_use]
    pub const fn with_joint_limit(mut self, weight: f32) -> Self {
        self.joint_limit = weight;
        self
    }

    /// Validates the weights.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [
            self.direction,
            self.chamfer,
            self.curvature,
            self.collision,
            self.pinch,
            self.joint_limit,
        ]
        .iter()
        .all(|w| w.is_finite() && *w >= 0.0)
    }
}

// ============================================================================
// Loss composition
// ============================================================================

/// One term of the inverse-fit objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossKind {
    /// Negative cosine between input and decoded displacements.
    Direction,
    /// Per-finger chamfer distance to robot keypoints.
    Chamfer,
    /// Squared second difference along a random direction.
    Curvature,
    /// Collision penalty; always zero until a classifier is supplied.
    Collision,
    /// Decoded distance of pinching finger pairs.
    Pinch,
    /// Out-of-range penalty on physical joint values.
    JointLimit,
}

impl LossKind {
    /// Every term, in log order.
    pub const ALL: [Self; 6] = [
        Self::Direction,
        Self::Chamfer,
        Self::Curvature,
        Self::Collision,
        Self::Pinch,
        Self::JointLimit,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Direction => "Direction",
            Self::Chamfer => "Chamfer",
            Self::Curvature => "Curvature",
            Self::Collision => "Collision",
            Self::Pinch => "Pinch",
            Self::JointLimit => "JointLimit",
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A weighted, switchable loss term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossTerm {
    /// Which term.
    pub kind: LossKind,
    /// Multiplier in the total.
    pub weight: f32,
    /// Disabled terms are neither computed nor logged.
    pub enabled: bool,
}

impl LossTerm {
    /// Creates an enabled term.
    #[must_use]
    pub const fn new(kind: LossKind, weight: f32) -> Self {
        Self {
            kind,
            weight,
            enabled: true,
        }
    }

    /// Creates a disabled term.
    #[must_use]
    pub const fn disabled(kind: LossKind, weight: f32) -> Self {
        Self {
            kind,
            weight,
            enabled: false,
        }
    }
}

/// Ordered list of loss terms making up the inverse-fit objective.
///
/// The joint-limit term is present but disabled: the inverse model's `tanh`
/// output already bounds every joint to its normalized range.
///
/// # Example
///
/// ```
/// use retarget_training::{LossComposition, LossKind, LossWeights};
///
/// let composition = LossComposition::from_weights(&LossWeights::default());
/// assert!(composition.is_enabled(LossKind::Collision));
/// assert!(!composition.is_enabled(LossKind::JointLimit));
///
/// let composition = composition.enable(LossKind::JointLimit);
/// assert!(composition.is_enabled(LossKind::JointLimit));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossComposition {
    terms: Vec<LossTerm>,
}

impl Default for LossComposition {
    fn default() -> Self {
        Self::from_weights(&LossWeights::default())
    }
}

impl LossComposition {
    /// Standard composition for the given weights.
    #[must_use]
    pub fn from_weights(weights: &LossWeights) -> Self {
        Self {
            terms: vec![
                LossTerm::new(LossKind::Direction, weights.direction),
                LossTerm::new(LossKind::Chamfer, weights.chamfer),
                LossTerm::new(LossKind::Curvature, weights.curvature),
                LossTerm::new(LossKind::Collision, weights.collision),
                LossTerm::new(LossKind::Pinch, weights.pinch),
                LossTerm::disabled(LossKind::JointLimit, weights.joint_limit),
            ],
        }
    }

    /// All terms, enabled or not.
    #[must_use]
    pub fn terms(&self) -> &[LossTerm] {
        &self.terms
    }

    /// Enabled terms.
    pub fn active(&self) -> impl Iterator<Item = &LossTerm> {
        self.terms.iter().filter(|t| t.enabled)
    }

    /// Returns true if `kind` is present and enabled.
    #[must_use]
    pub fn is_enabled(&self, kind: LossKind) -> bool {
        self.terms.iter().any(|t| t.kind == kind && t.enabled)
    }

    /// Enables `kind`.
    #[must_use]
    pub fn enable(self, kind: LossKind) -> Self {
        self.set_enabled(kind, true)
    }

    /// Disables `kind`.
    #[must_use]
    pub fn disable(self, kind: LossKind) -> Self {
        self.set_enabled(kind, false)
    }

    fn set_enabled(mut self, kind: LossKind, enabled: bool) -> Self {
        for term in self.terms.iter_mut().filter(|t| t.kind == kind) {
            term.enabled = enabled;
        }
        self
    }
}

/// Formats a loss for logging, switching to scientific notation near zero.
///
/// # Example
///
/// ```
/// use retarget_training::format_loss;
///
/// assert_eq!(format_loss(0.25), "0.2500");
/// assert_eq!(format_loss(0.00012), "1.2000e-4");
/// ```
#[must_use]
pub fn format_loss(value: f32) -> String {
    if value.abs() < 1e-3 {
        format!("{value:.4e}")
    } else {
        format!("{value:.4}")
    }
}

// ============================================================================
// Terms
// ============================================================================

/// Row-wise unit vectors of `[n, 3]`, with the norm floored at `eps`.
pub fn normalize_rows<B: Backend>(x: Tensor<B, 2>, eps: f32) -> Tensor<B, 2> {
    let norm = x.clone().powf_scalar(2.0).sum_dim(1).sqrt().clamp_min(eps);
    x / norm
}

/// Finger `f` of a `[batch, fingers, 3]` tensor as `[batch, 3]`.
pub fn finger<B: Backend>(points: &Tensor<B, 3>, f: usize) -> Tensor<B, 2> {
    let [batch, _, _] = points.dims();
    points.clone().slice([0..batch, f..f + 1, 0..3]).reshape([batch, 3])
}

/// Bidirectional mean nearest-neighbour squared distance of two point sets.
///
/// `a` is `[n, 3]`, `b` is `[m, 3]`.
pub fn chamfer_distance<B: Backend>(a: Tensor<B, 2>, b: Tensor<B, 2>) -> Tensor<B, 1> {
    let aa = a.clone().powf_scalar(2.0).sum_dim(1);
    let bb = b.clone().powf_scalar(2.0).sum_dim(1).transpose();
    let ab = a.matmul(b.transpose());
    let dist = (aa + bb - ab.mul_scalar(2.0)).clamp_min(0.0);

    let a_to_b = dist.clone().min_dim(1).mean();
    let b_to_a = dist.transpose().min_dim(1).mean();
    a_to_b + b_to_a
}

/// Chamfer distance per finger, summed.
///
/// `decoded` is `[batch, fingers, 3]`; `targets[f]` is `[m, 3]`.
pub fn chamfer_loss<B: Backend>(decoded: &Tensor<B, 3>, targets: &[Tensor<B, 2>]) -> Tensor<B, 1> {
    let device = decoded.device();
    targets
        .iter()
        .enumerate()
        .fold(Tensor::zeros([1], &device), |acc, (f, target)| {
            acc + chamfer_distance(finger(decoded, f), target.clone())
        })
}

/// Squared second difference of the decoded manifold.
pub fn curvature_loss<B: Backend>(
    decoded: Tensor<B, 3>,
    decoded_plus: Tensor<B, 3>,
    decoded_minus: Tensor<B, 3>,
) -> Tensor<B, 1> {
    (decoded_plus + decoded_minus - decoded.mul_scalar(2.0))
        .powf_scalar(2.0)
        .mean()
}

/// Penalizes decoded distance between fingers that pinch in the input.
///
/// For every finger pair `(i, j)`, samples whose input points are closer
/// than [`PINCH_THRESHOLD`] contribute their squared decoded distance. Each
/// pair's mean is divided by its pinch count (plus [`PINCH_EPS`]) and
/// scaled by the batch size.
pub fn pinch_loss<B: Backend>(points: &Tensor<B, 3>, decoded: &Tensor<B, 3>) -> Tensor<B, 1> {
    let [batch, fingers, _] = points.dims();
    let device = points.device();
    let threshold_sq = PINCH_THRESHOLD * PINCH_THRESHOLD;
    #[allow(clippy::cast_precision_loss)]
    let batch_scale = batch as f32;

    let mut loss = Tensor::zeros([1], &device);
    for i in 0..fingers {
        for j in (i + 1)..fingers {
            let gap = (finger(points, i) - finger(points, j)).powf_scalar(2.0).sum_dim(1);
            let mask = gap.lower_elem(threshold_sq).float();
            let decoded_gap = (finger(decoded, i) - finger(decoded, j))
                .powf_scalar(2.0)
                .sum_dim(1);
            let count = mask.clone().sum().add_scalar(PINCH_EPS);
            loss = loss + ((mask * decoded_gap).mean() / count).mul_scalar(batch_scale);
        }
    }
    loss
}

/// Negative mean cosine between input and decoded displacements.
///
/// Reaches `-1` when the composed map preserves every displacement
/// direction.
pub fn direction_loss<B: Backend>(
    points: Tensor<B, 3>,
    points_moved: Tensor<B, 3>,
    decoded: Tensor<B, 3>,
    decoded_moved: Tensor<B, 3>,
) -> Tensor<B, 1> {
    let [batch, fingers, _] = points.dims();
    let d_in = (points_moved - points).reshape([batch * fingers, 3]);
    let d_out = (decoded_moved - decoded).reshape([batch * fingers, 3]);
    (normalize_rows(d_in, DIRECTION_EPS) * normalize_rows(d_out, DIRECTION_EPS))
        .sum_dim(1)
        .mean()
        .neg()
}

/// Collision placeholder, always zero.
pub fn collision_loss<B: Backend>(device: &B::Device) -> Tensor<B, 1> {
    Tensor::zeros([1], device)
}

/// Squared overshoot of `joints` beyond `[lower, upper]`, averaged over the
/// violating entries.
///
/// `joints` is `[batch, dof]`; the bounds are `[1, dof]`.
pub fn joint_limit_loss<B: Backend>(
    joints: Tensor<B, 2>,
    lower: Tensor<B, 2>,
    upper: Tensor<B, 2>,
    margin: f32,
) -> Tensor<B, 1> {
    let excess = joints.clone() - upper;
    let deficit = lower - joints;
    let over = excess.clone().greater_elem(margin).float();
    let under = deficit.clone().greater_elem(margin).float();
    let over_penalty = excess.powf_scalar(2.0) * over.clone();
    let under_penalty = deficit.powf_scalar(2.0) * under.clone();
    let count = (over.sum() + under.sum()).add_scalar(1e-6);
    (over_penalty + under_penalty).sum() / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::ElementConversion;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn device() -> <TestBackend as Backend>::Device {
        <TestBackend as Backend>::Device::default()
    }

    fn value(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar().elem()
    }

    #[test]
    fn weights_default() {
        let weights = LossWeights::default();
        assert!((weights.curvature - 0.1).abs() < 1e-6);
        assert!((weights.pinch - 1.0).abs() < 1e-6);
        assert!((weights.joint_limit - 10.0).abs() < 1e-6);
        assert!(weights.is_valid());
        assert!(!weights.with_pinch(-1.0).is_valid());
    }

    #[test]
    fn composition_order_and_switches() {
        let composition = LossComposition::default();
        let kinds: Vec<LossKind> = composition.terms().iter().map(|t| t.kind).collect();
        assert_eq!(kinds, LossKind::ALL.to_vec());
        assert_eq!(composition.active().count(), 5);
        let composition = composition.disable(LossKind::Curvature);
        assert!(!composition.is_enabled(LossKind::Curvature));
        assert_eq!(composition.active().count(), 4);
    }

    #[test]
    fn format_switches_notation() {
        assert_eq!(format_loss(1.5), "1.5000");
        assert_eq!(format_loss(-0.5), "-0.5000");
        assert!(format_loss(5e-5).contains('e'));
        assert_eq!(format_loss(0.0), "0.0000e0");
    }

    #[test]
    fn chamfer_zero_for_identical_sets() {
        let pts = Tensor::<TestBackend, 2>::from_floats(
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            &device(),
        );
        assert!(value(chamfer_distance(pts.clone(), pts)).abs() < 1e-6);
    }

    #[test]
    fn chamfer_known_value() {
        // Every pair is 1 apart in both directions.
        let a = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]], &device());
        let b = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0, 0.0]], &device());
        assert!((value(chamfer_distance(a, b)) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn chamfer_loss_sums_fingers() {
        let decoded = Tensor::<TestBackend, 3>::from_floats(
            [[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]],
            &device(),
        );
        let targets = vec![
            Tensor::<TestBackend, 2>::from_floats([[1.0, 0.0, 0.0]], &device()),
            Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0, 3.0]], &device()),
        ];
        // Finger 0: 1 + 1. Finger 1: 4 + 4.
        assert!((value(chamfer_loss(&decoded, &targets)) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn chamfer_backpropagates_to_both_sets() {
        type Diff = burn::backend::Autodiff<TestBackend>;
        let a = Tensor::<Diff, 2>::from_floats([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]], &device())
            .require_grad();
        let b = Tensor::<Diff, 2>::from_floats(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [3.0, 0.0, 1.0]],
            &device(),
        )
        .require_grad();

        let grads = chamfer_distance(a.clone(), b.clone()).backward();
        let grad_a: Vec<f32> = a.grad(&grads).unwrap().into_data().to_vec().unwrap();
        let grad_b: Vec<f32> = b.grad(&grads).unwrap().into_data().to_vec().unwrap();
        assert_eq!(grad_a.len(), 6);
        assert_eq!(grad_b.len(), 9);
        assert!(grad_a.iter().chain(&grad_b).all(|g| g.is_finite()));
        assert!(grad_a.iter().any(|g| g.abs() > 1e-6));
        assert!(grad_b.iter().any(|g| g.abs() > 1e-6));
    }

    #[test]
    fn chamfer_loss_backpropagates_per_finger() {
        type Diff = burn::backend::Autodiff<TestBackend>;
        let decoded = Tensor::<Diff, 3>::from_floats(
            [[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0]], [[0.5, 0.0, 0.0], [0.0, 0.5, 1.0]]],
            &device(),
        )
        .require_grad();
        let targets = vec![
            Tensor::<Diff, 2>::from_floats([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.2, 0.2, 0.2]], &device()),
            Tensor::<Diff, 2>::from_floats([[0.0, 0.0, 3.0]], &device()),
        ];

        let grads = chamfer_loss(&decoded, &targets).backward();
        let grad: Vec<f32> = decoded.grad(&grads).unwrap().into_data().to_vec().unwrap();
        assert_eq!(grad.len(), 12);
        assert!(grad.iter().all(|g| g.is_finite()));
        // Finger 1 is pulled towards z = 3.
        assert!(grad[5] < 0.0 && grad[11] < 0.0);
    }

    #[test]
    fn curvature_zero_for_linear_map() {
        let base = Tensor::<TestBackend, 3>::from_floats([[[0.1, 0.2, 0.3]]], &device());
        let step = Tensor::<TestBackend, 3>::from_floats([[[0.01, 0.0, -0.02]]], &device());
        let loss = curvature_loss(base.clone(), base.clone() + step.clone(), base - step);
        assert!(value(loss).abs() < 1e-10);
    }

    fn pair(gap: f32) -> Tensor<TestBackend, 3> {
        Tensor::<TestBackend, 3>::from_floats([[[0.0, 0.0, 0.0], [gap, 0.0, 0.0]]], &device())
    }

    #[test]
    fn pinch_positive_when_input_fingers_touch() {
        let decoded = pair(0.05);
        let loss = value(pinch_loss(&pair(0.01), &decoded));
        assert!(loss > 0.0);
        // One pinching sample: 0.05^2 / (1 + eps) * 1.
        assert!((loss - 0.0025).abs() < 1e-6);
    }

    #[test]
    fn pinch_zero_when_input_fingers_apart() {
        let decoded = pair(0.5);
        assert_eq!(value(pinch_loss(&pair(0.02), &decoded)), 0.0);
    }

    #[test]
    fn pinch_finite_for_empty_mask() {
        let points = Tensor::<TestBackend, 3>::from_floats(
            [[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]]],
            &device(),
        );
        let loss = value(pinch_loss(&points, &points));
        assert!(loss.is_finite());
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn direction_minus_one_for_identity() {
        let points = Tensor::<TestBackend, 3>::from_floats(
            [[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]],
            &device(),
        );
        let moved = Tensor::<TestBackend, 3>::from_floats(
            [[[0.003, 0.0, 0.0], [1.0, 0.995, 1.0]]],
            &device(),
        );
        let loss = direction_loss(points.clone(), moved.clone(), points, moved);
        assert!((value(loss) + 1.0).abs() < 1e-4);
    }

    #[test]
    fn direction_plus_one_for_reflection() {
        let points = Tensor::<TestBackend, 3>::from_floats([[[0.0, 0.0, 0.0]]], &device());
        let moved = Tensor::<TestBackend, 3>::from_floats([[[0.0, 0.004, 0.0]]], &device());
        let reflected = Tensor::<TestBackend, 3>::from_floats([[[0.0, -0.004, 0.0]]], &device());
        let loss = direction_loss(points.clone(), moved, points, reflected);
        assert!((value(loss) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn collision_is_zero() {
        assert_eq!(value(collision_loss::<TestBackend>(&device())), 0.0);
    }

    #[test]
    fn joint_limit_only_penalizes_violations() {
        let lower = Tensor::<TestBackend, 2>::from_floats([[-1.0, 0.0]], &device());
        let upper = Tensor::<TestBackend, 2>::from_floats([[1.0, 0.5]], &device());
        let inside = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.25]], &device());
        assert_eq!(
            value(joint_limit_loss(inside, lower.clone(), upper.clone(), 1e-5)),
            0.0
        );
        let outside = Tensor::<TestBackend, 2>::from_floats([[1.5, 0.25]], &device());
        let loss = value(joint_limit_loss(outside, lower, upper, 1e-5));
        assert!((loss - 0.25).abs() < 1e-4);
    }
}
