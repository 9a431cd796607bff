use ndarray::ArrayView2;

use crate::{
    Result,
    arch::{Params, predict_batch},
    autodiff::{Tape, Var},
};

/// A loss over a batch of log-probabilities and their one-hot targets.
pub trait LossFn {
    /// Computes the loss of already computed log-probabilities.
    fn loss(&self, log_probs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32>;

    /// Records the loss on `tape` so it can be differentiated, the returned variable is a
    /// `[1, 1]` value.
    fn record(&self, tape: &mut Tape, log_probs: Var, targets: Var) -> Result<Var>;

    /// Runs the network over `x` and measures its predictions against `targets`.
    fn batch_loss(&self, params: &Params, x: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        let log_probs = predict_batch(params, x)?;
        self.loss(log_probs.view(), targets)
    }
}
