use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Zip};

/// Computes `z - log(sum(exp(z)))` for a single logit vector.
///
/// The maximum logit is subtracted before exponentiating so large logits don't overflow.
pub fn log_softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let mut out = logits.to_owned();
    log_softmax_inplace(out.view_mut());
    out
}

/// Applies `log_softmax` to every row of `z` in place, rows are processed in parallel.
pub fn log_softmax_rows(z: &mut Array2<f32>) {
    Zip::from(z.rows_mut()).par_for_each(log_softmax_inplace);
}

/// Backward pass of `log_softmax_rows`.
///
/// # Arguments
/// * `y` - The output of the forward pass (log-probabilities).
/// * `d` - The gradient of the loss with respect to `y`.
///
/// # Returns
/// The gradient with respect to the logits, `d - softmax * sum(d)` per row.
pub fn log_softmax_rows_backward(y: ArrayView2<f32>, d: ArrayView2<f32>) -> Array2<f32> {
    let mut dx = d.to_owned();

    Zip::from(dx.rows_mut())
        .and(y.rows())
        .par_for_each(|mut dx, y| {
            let total = dx.sum();
            dx.zip_mut_with(&y, |g, &y| *g -= y.exp() * total);
        });

    dx
}

fn log_softmax_inplace(mut z: ArrayViewMut1<f32>) {
    let max = z.fold(f32::NEG_INFINITY, |max, &v| max.max(v));
    let lse = max + z.fold(0., |acc, &v| acc + (v - max).exp()).ln();
    z.mapv_inplace(|v| v - lse);
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn rows_are_log_distributions() {
        let mut z = array![[1., 2., 3.], [-4., 0., 4.], [0., 0., 0.]];
        log_softmax_rows(&mut z);

        for row in z.rows() {
            let total: f32 = row.iter().map(|v| v.exp()).sum();
            assert!((total - 1.).abs() < 1e-6);
        }

        assert!((z[[2, 0]] - (1f32 / 3.).ln()).abs() < 1e-6);
    }

    #[test]
    fn large_logits_do_not_overflow() {
        let out = log_softmax(array![1000., 1000.].view());

        assert!(out.iter().all(|v| v.is_finite()));
        assert!((out[0] - 0.5f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn single_and_rows_agree() {
        let z = array![[0.3, -1.2, 2.2, 0.]];
        let single = log_softmax(z.row(0));

        let mut rows = z.clone();
        log_softmax_rows(&mut rows);

        for (a, b) in single.iter().zip(rows.row(0)) {
            assert!((a - b).abs() < 1e-7);
        }
    }

    #[test]
    fn backward_of_uniform_upstream_is_zero() {
        // The rows of softmax sum to one, so a constant upstream gradient cancels out.
        let mut y = array![[0.5, 1.5, -0.5]];
        log_softmax_rows(&mut y);
        let d = Array2::ones((1, 3));

        let dx = log_softmax_rows_backward(y.view(), d.view());
        assert!(dx.iter().all(|g| g.abs() < 1e-6));
    }
}
