use ndarray::{Array1, ArrayView1, ArrayView2, Zip};

use super::{Params, predict_batch};
use crate::{MlErr, Result};

/// Returns the index of the largest value of each row, ties go to the first one.
pub fn argmax_rows(x: ArrayView2<f32>) -> Array1<usize> {
    x.rows().into_iter().map(argmax).collect()
}

/// The fraction of rows whose arg-max agrees between `scores` and `targets`.
///
/// `scores` may be logits or log-probabilities, the arg-max is the same.
pub fn batch_accuracy(scores: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
    if scores.nrows() == 0 {
        return Err(MlErr::shape("accuracy", "the split is empty"));
    }

    if scores.dim() != targets.dim() {
        return Err(MlErr::shape(
            "accuracy",
            format!(
                "got targets {:?} for scores {:?}",
                targets.shape(),
                scores.shape()
            ),
        ));
    }

    let hits = Zip::from(scores.rows())
        .and(targets.rows())
        .fold(0usize, |hits, s, t| hits + usize::from(argmax(s) == argmax(t)));

    Ok(hits as f32 / scores.nrows() as f32)
}

/// Runs the network over a whole split and returns the fraction of correctly classified samples.
///
/// # Arguments
/// * `params` - The network's parameters.
/// * `x` - The inputs, `[n, params.input_size()]`.
/// * `targets` - The one-hot targets, `[n, params.num_classes()]`.
pub fn accuracy(params: &Params, x: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
    if x.nrows() == 0 {
        return Err(MlErr::shape("accuracy", "the split is empty"));
    }

    let log_probs = predict_batch(params, x)?;
    batch_accuracy(log_probs.view(), targets)
}

fn argmax(row: ArrayView1<f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    #[test]
    fn argmax_picks_the_first_maximum() {
        let x = array![[0., 3., 3.], [-1., -2., -3.], [0.5, 0., 2.]];
        assert_eq!(argmax_rows(x.view()), array![1, 0, 2]);
    }

    #[test]
    fn matching_logits_give_full_accuracy() {
        let logits = array![[2., -1., 0.], [0., 0., 9.], [-3., 4., 1.]];
        let targets = array![[1., 0., 0.], [0., 0., 1.], [0., 1., 0.]];

        assert_eq!(batch_accuracy(logits.view(), targets.view()).unwrap(), 1.);
    }

    #[test]
    fn accuracy_counts_partial_hits() {
        let logits = array![[2., 1.], [2., 1.], [0., 1.], [0., 1.]];
        let targets = array![[1., 0.], [0., 1.], [0., 1.], [1., 0.]];

        assert_eq!(batch_accuracy(logits.view(), targets.view()).unwrap(), 0.5);
    }

    #[test]
    fn empty_split_is_rejected() {
        let params = Params::init(&[3, 2], 0).unwrap();
        let empty = Array2::zeros((0, 3));

        assert!(matches!(
            accuracy(&params, empty.view(), Array2::zeros((0, 2)).view()),
            Err(MlErr::InvalidShape { what: "accuracy", .. })
        ));
    }

    #[test]
    fn network_accuracy_is_a_fraction() {
        let params = Params::init_with_scale(&[2, 3, 2], 4, 1.).unwrap();
        let x = array![[1., 0.], [0., 1.], [1., 1.]];
        let targets = array![[1., 0.], [0., 1.], [0., 1.]];

        let acc = accuracy(&params, x.view(), targets.view()).unwrap();
        assert!((0. ..=1.).contains(&acc));
    }
}
