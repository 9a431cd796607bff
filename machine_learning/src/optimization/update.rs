use ndarray::ArrayView2;

use super::{GradientDescent, Optimizer};
use crate::{
    Result,
    arch::{
        Params,
        loss::{CrossEntropy, LossFn},
        value_and_grad,
    },
};

/// Makes one gradient descent step on a batch with the default cross-entropy loss.
///
/// # Arguments
/// * `params` - The current parameters, left untouched.
/// * `x` - The input batch.
/// * `targets` - The one-hot targets of the batch.
/// * `step_size` - The learning rate.
///
/// # Returns
/// The updated parameters.
pub fn update(
    params: &Params,
    x: ArrayView2<f32>,
    targets: ArrayView2<f32>,
    step_size: f32,
) -> Result<Params> {
    let mut optimizer = GradientDescent::new(step_size);
    update_with(&mut optimizer, &CrossEntropy::default(), params, x, targets).map(|(new, _)| new)
}

/// Makes one optimization step on a batch.
///
/// # Returns
/// A tuple with the updated parameters and the loss of `params` on the batch, measured before
/// the step.
pub fn update_with<O, L>(
    optimizer: &mut O,
    loss_fn: &L,
    params: &Params,
    x: ArrayView2<f32>,
    targets: ArrayView2<f32>,
) -> Result<(Params, f32)>
where
    O: Optimizer,
    L: LossFn,
{
    let (loss, grad) = value_and_grad(params, x, targets, loss_fn)?;
    let new = optimizer.update_params(params, &grad)?;
    Ok((new, loss))
}
