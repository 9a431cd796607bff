use ndarray::{ArrayView2, Axis};

use super::{Params, forward, layers::Dense, loss::LossFn};
use crate::{Result, autodiff::Tape};

/// Computes the loss of `params` over a batch together with its gradient.
///
/// The forward pass and the loss are recorded on a fresh `Tape`, which is then walked backwards
/// once. The gradient has the same layout as `params`.
///
/// # Arguments
/// * `params` - The parameters to differentiate with respect to.
/// * `x` - The input batch, `[batch_size, params.input_size()]`.
/// * `targets` - The one-hot targets, `[batch_size, params.num_classes()]`.
/// * `loss_fn` - The loss to minimize.
///
/// # Returns
/// A tuple with the loss value and the gradient.
pub fn value_and_grad<L: LossFn>(
    params: &Params,
    x: ArrayView2<f32>,
    targets: ArrayView2<f32>,
    loss_fn: &L,
) -> Result<(f32, Params)> {
    forward::ensure_finite(x, "input")?;

    let mut tape = Tape::new();
    let vars: Vec<_> = params
        .layers()
        .iter()
        .map(|layer| {
            let w = tape.var(layer.weights().to_owned());
            let b = tape.var(layer.bias().insert_axis(Axis(0)).to_owned());
            (w, b)
        })
        .collect();

    let input = tape.constant(x.to_owned());
    let y = tape.constant(targets.to_owned());

    let log_probs = forward::record(&mut tape, &vars, input)?;
    forward::ensure_finite(tape.value(log_probs), "log-probabilities")?;

    let root = loss_fn.record(&mut tape, log_probs, y)?;
    let loss = tape.value(root)[[0, 0]];

    let mut grads = tape.backward(root)?;
    let layers = params
        .layers()
        .iter()
        .zip(vars)
        .map(|(layer, (w, b))| {
            let dw = grads
                .take(w)
                .unwrap_or_else(|| layer.weights().mapv(|_| 0.));
            let db = match grads.take(b) {
                Some(db) => db.index_axis_move(Axis(0), 0),
                None => layer.bias().mapv(|_| 0.),
            };
            Dense::new(dw, db)
        })
        .collect::<Result<_>>()?;

    Ok((loss, Params::from_layers(layers)?))
}

/// Computes only the gradient of the loss, see `value_and_grad`.
pub fn grad<L: LossFn>(
    params: &Params,
    x: ArrayView2<f32>,
    targets: ArrayView2<f32>,
    loss_fn: &L,
) -> Result<Params> {
    value_and_grad(params, x, targets, loss_fn).map(|(_, grad)| grad)
}
