use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::{
    Params,
    activations::{Relu, log_softmax, log_softmax_rows},
    layers::Dense,
};
use crate::{
    MlErr, Result,
    autodiff::{Tape, Var},
};

/// Makes a forward pass of a single sample through the network.
///
/// Every layer but the last is followed by a ReLU, the output of the last one is normalized with
/// a log-softmax.
///
/// # Arguments
/// * `params` - The network's parameters.
/// * `x` - A feature vector of length `params.input_size()`.
///
/// # Returns
/// The log-probability of each class, or an error if the shapes mismatch or a non-finite value
/// shows up.
pub fn predict(params: &Params, x: ArrayView1<f32>) -> Result<Array1<f32>> {
    ensure_finite(x.insert_axis(Axis(0)), "input")?;

    let (last, hidden) = split_layers(params)?;
    let mut a = x.to_owned();

    for layer in hidden {
        a = layer.forward_one(a.view())?;
        a.mapv_inplace(|z| Relu.f(z));
    }

    let logits = last.forward_one(a.view())?;
    let out = log_softmax(logits.view());
    ensure_finite(out.view().insert_axis(Axis(0)), "log-probabilities")?;

    Ok(out)
}

/// Makes a forward pass of a batch through the network, one sample per row.
///
/// The result equals stacking `predict` over every row, the batch is only processed as whole
/// matrices to share the work.
///
/// # Arguments
/// * `params` - The network's parameters.
/// * `x` - The input batch of shape `[batch_size, params.input_size()]`.
///
/// # Returns
/// The log-probabilities of shape `[batch_size, params.num_classes()]`.
pub fn predict_batch(params: &Params, x: ArrayView2<f32>) -> Result<Array2<f32>> {
    ensure_finite(x, "input")?;

    let (last, hidden) = split_layers(params)?;
    let mut a = x.to_owned();

    for layer in hidden {
        a = layer.forward(a.view())?;
        a.par_mapv_inplace(|z| Relu.f(z));
    }

    let mut out = last.forward(a.view())?;
    log_softmax_rows(&mut out);
    ensure_finite(out.view(), "log-probabilities")?;

    Ok(out)
}

/// Records the batched forward pass on a tape.
///
/// # Arguments
/// * `tape` - The tape to record on.
/// * `layers` - The `(weights, bias)` variables of each layer, biases with shape `[1, out]`.
/// * `x` - The input batch.
///
/// # Returns
/// The variable holding the log-probabilities.
pub(crate) fn record(tape: &mut Tape, layers: &[(Var, Var)], x: Var) -> Result<Var> {
    let Some((&(w, b), hidden)) = layers.split_last() else {
        return Err(MlErr::shape("layers", "at least one layer is required"));
    };

    let mut a = x;
    for &(w, b) in hidden {
        let z = tape.matmul_t(a, w)?;
        let z = tape.add_row(z, b)?;
        a = tape.relu(z);
    }

    let z = tape.matmul_t(a, w)?;
    let logits = tape.add_row(z, b)?;
    Ok(tape.log_softmax(logits))
}

/// Fails with `NumericOverflow` naming the first row holding a NaN or an infinity.
pub(crate) fn ensure_finite(x: ArrayView2<f32>, what: &'static str) -> Result<()> {
    match x
        .rows()
        .into_iter()
        .position(|row| row.iter().any(|v| !v.is_finite()))
    {
        Some(row) => Err(MlErr::NumericOverflow { what, row }),
        None => Ok(()),
    }
}

fn split_layers(params: &Params) -> Result<(&Dense, &[Dense])> {
    params
        .layers()
        .split_last()
        .ok_or_else(|| MlErr::shape("layers", "at least one layer is required"))
}
