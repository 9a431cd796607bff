use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::one_hot;
use crate::{MlErr, Result};

/// An in-memory labelled split, one sample per row.
#[derive(Clone, Debug)]
pub struct Dataset {
    images: Array2<f32>,
    labels: Array1<usize>,
    classes: usize,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `images` - The features, `[n, features]`.
    /// * `labels` - The class of each sample, `[n]`.
    /// * `classes` - The amount of classes.
    ///
    /// # Returns
    /// An `InvalidShape` error if the row counts differ or a label is not below `classes`.
    pub fn new(images: Array2<f32>, labels: Array1<usize>, classes: usize) -> Result<Self> {
        if images.nrows() != labels.len() {
            return Err(MlErr::shape(
                "dataset",
                format!("{} images but {} labels", images.nrows(), labels.len()),
            ));
        }

        if let Some((i, label)) = labels.iter().enumerate().find(|&(_, &l)| l >= classes) {
            return Err(MlErr::shape(
                "labels",
                format!("label {label} at row {i} is out of range for {classes} classes"),
            ));
        }

        Ok(Self {
            images,
            labels,
            classes,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn features(&self) -> usize {
        self.images.ncols()
    }

    #[inline]
    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn images(&self) -> ArrayView2<'_, f32> {
        self.images.view()
    }

    pub fn labels(&self) -> ArrayView1<'_, usize> {
        self.labels.view()
    }

    /// Returns the labels encoded as one-hot rows, `[n, classes]`.
    pub fn one_hot_labels(&self) -> Result<Array2<f32>> {
        one_hot(self.labels.view(), self.classes)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn rejects_mismatched_rows() {
        let err = Dataset::new(Array2::zeros((3, 2)), array![0, 1], 2).unwrap_err();
        assert!(matches!(err, MlErr::InvalidShape { what: "dataset", .. }));
    }

    #[test]
    fn rejects_out_of_range_labels() {
        let err = Dataset::new(Array2::zeros((2, 2)), array![0, 5], 2).unwrap_err();
        assert!(matches!(err, MlErr::InvalidShape { what: "labels", .. }));
    }

    #[test]
    fn one_hot_labels_follow_the_classes() {
        let ds = Dataset::new(Array2::zeros((2, 4)), array![1, 2], 3).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.features(), 4);
        assert_eq!(ds.one_hot_labels().unwrap(), array![[0., 1., 0.], [0., 0., 1.]]);
    }
}
