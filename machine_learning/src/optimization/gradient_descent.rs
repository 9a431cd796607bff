use rayon::prelude::*;

use super::Optimizer;
use crate::{
    MlErr, Result,
    arch::{Params, layers::Dense},
};

/// Gradient descent optimization algorithm.
#[derive(Clone, Copy, Debug)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Returns a new `GradientDescent`.
    ///
    /// # Arguments
    /// * `learning_rate` - The *length* of the steps taken on `update_params`.
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    /// Makes a step in the opposite direction of the gradient, with a length of `learning_rate`.
    /// Layers are updated in parallel.
    ///
    /// # Arguments
    /// * `params` - The parameters the step starts from.
    /// * `grad` - The gradient used for taking the step.
    fn update_params(&mut self, params: &Params, grad: &Params) -> Result<Params> {
        if params.sizes() != grad.sizes() {
            return Err(MlErr::shape(
                "gradient",
                format!(
                    "got layer sizes {:?}, expected {:?}",
                    grad.sizes(),
                    params.sizes()
                ),
            ));
        }

        let lr = self.learning_rate;
        let layers = params
            .layers()
            .par_iter()
            .zip(grad.layers())
            .map(|(layer, g)| {
                let mut w = layer.weights().to_owned();
                let mut b = layer.bias().to_owned();
                w.scaled_add(-lr, &g.weights());
                b.scaled_add(-lr, &g.bias());
                Dense::new(w, b)
            })
            .collect::<Result<Vec<_>>>()?;

        Params::from_layers(layers)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn steps_against_the_gradient() {
        let params = Params::from_layers(vec![
            Dense::new(array![[1., 2.]], array![0.5]).unwrap(),
        ])
        .unwrap();
        let grad = Params::from_layers(vec![
            Dense::new(array![[10., -10.]], array![1.]).unwrap(),
        ])
        .unwrap();

        let new = GradientDescent::new(0.1)
            .update_params(&params, &grad)
            .unwrap();

        assert_eq!(new.layers()[0].weights(), array![[0., 3.]]);
        assert!((new.layers()[0].bias()[0] - 0.4).abs() < 1e-6);
        assert_eq!(params.layers()[0].weights(), array![[1., 2.]]);
    }

    #[test]
    fn mismatched_gradient_is_rejected() {
        let params = Params::init(&[3, 2], 0).unwrap();
        let grad = Params::init(&[2, 2], 0).unwrap();

        assert!(matches!(
            GradientDescent::new(0.1).update_params(&params, &grad),
            Err(MlErr::InvalidShape { what: "gradient", .. })
        ));
    }
}
