//! Read-only forward surrogate used as a decoder during the inverse fit.

use burn::module::Module;
use burn::prelude::Backend;
use burn::tensor::Tensor;
use retarget_models::{FkModel, HandTopology};

/// A forward model whose parameters no longer track gradients.
///
/// The wrapped model is only reachable through [`Self::decode`], so nothing
/// can hand it to an optimizer. Gradients still flow through its
/// activations back into whatever produced the joint input.
///
/// # Example
///
/// ```ignore
/// let surrogate = FrozenSurrogate::freeze(fk);
/// let points = surrogate.decode(ik.forward(human_points));
/// ```
#[derive(Debug, Clone)]
pub struct FrozenSurrogate<B: Backend> {
    model: FkModel<B>,
}

impl<B: Backend> FrozenSurrogate<B> {
    /// Freezes a trained forward model.
    #[must_use]
    pub fn freeze(model: FkModel<B>) -> Self {
        Self {
            model: model.no_grad(),
        }
    }

    /// Decodes normalized joints `[batch, dof]` to `[batch, fingers, 3]`.
    pub fn decode(&self, q: Tensor<B, 2>) -> Tensor<B, 3> {
        self.model.forward(q)
    }

    /// Finger topology of the wrapped model.
    #[must_use]
    pub fn topology(&self) -> &HandTopology {
        self.model.topology()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn::module::AutodiffModule;
    use burn_ndarray::NdArray;
    use retarget_models::{FingerNetConfig, IkModel};

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn gradients_reach_inverse_but_not_surrogate() {
        let device = <TestBackend as Backend>::Device::default();
        let topology = HandTopology::new(vec![vec![0, 1], vec![2]], 3).unwrap();
        let fk = FkModel::<TestBackend>::new(topology.clone(), FingerNetConfig::new(8), &device);
        let ik = IkModel::<TestBackend>::new(topology, FingerNetConfig::new(8), &device);
        let surrogate = FrozenSurrogate::freeze(fk.clone());

        let points = Tensor::<TestBackend, 3>::from_floats(
            [[[0.1, 0.0, 0.2], [0.0, 0.3, -0.1]]],
            &device,
        );
        let loss = surrogate.decode(ik.forward(points)).powf_scalar(2.0).mean();
        let grads = loss.backward();

        let ik_params = burn::optim::GradientsParams::from_grads(grads, &ik);
        assert!(!ik_params.is_empty());

        let q = Tensor::<TestBackend, 2>::from_floats([[0.2, -0.1, 0.4]], &device);
        let frozen = surrogate.decode(q.clone()).into_data().to_vec::<f32>().unwrap();
        let original = fk.valid().forward(q.inner()).into_data().to_vec::<f32>().unwrap();
        assert_eq!(frozen, original);
    }

    #[test]
    fn frozen_surrogate_has_no_parameter_gradients() {
        let device = <TestBackend as Backend>::Device::default();
        let topology = HandTopology::new(vec![vec![0], vec![1]], 2).unwrap();
        let fk = FkModel::<TestBackend>::new(topology, FingerNetConfig::new(8), &device);
        let frozen = FrozenSurrogate::freeze(fk);

        let q = Tensor::<TestBackend, 2>::from_floats([[0.5, -0.5]], &device).require_grad();
        let loss = frozen.decode(q.clone()).sum();
        let grads = loss.backward();

        let params = burn::optim::GradientsParams::from_grads(grads, &frozen.model);
        assert!(params.is_empty());
    }
}
