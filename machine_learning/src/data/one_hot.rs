use ndarray::{Array2, ArrayView1};

use crate::{MlErr, Result};

/// Encodes integer labels as one-hot rows.
///
/// # Arguments
/// * `labels` - The class of each sample.
/// * `classes` - The amount of classes, the width of the result.
///
/// # Returns
/// A `[labels.len(), classes]` matrix, or `InvalidShape` if a label is not below `classes`.
pub fn one_hot(labels: ArrayView1<usize>, classes: usize) -> Result<Array2<f32>> {
    let mut out = Array2::zeros((labels.len(), classes));

    for (i, &label) in labels.iter().enumerate() {
        if label >= classes {
            return Err(MlErr::shape(
                "labels",
                format!("label {label} at row {i} is out of range for {classes} classes"),
            ));
        }

        out[[i, label]] = 1.;
    }

    Ok(out)
}
