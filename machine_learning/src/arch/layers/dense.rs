use ndarray::{linalg, prelude::*};

use crate::{MlErr, Result};

/// A fully-connected layer: a weight matrix of shape `[out, in]` and a bias vector of shape
/// `[out]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Dense {
    w: Array2<f32>,
    b: Array1<f32>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `w` - The weights, one row per output unit.
    /// * `b` - The biases, one per output unit.
    ///
    /// # Returns
    /// A new `Dense` or an error if the amount of rows of `w` and the length of `b` differ.
    pub fn new(w: Array2<f32>, b: Array1<f32>) -> Result<Self> {
        if w.nrows() != b.len() {
            return Err(MlErr::shape(
                "dense layer",
                format!("weights {:?} do not match biases {:?}", w.shape(), b.shape()),
            ));
        }

        Ok(Self { w, b })
    }

    /// Returns the `(in, out)` dimensions of this layer.
    pub fn dim(&self) -> (usize, usize) {
        (self.w.ncols(), self.w.nrows())
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.w.len() + self.b.len()
    }

    pub fn weights(&self) -> ArrayView2<'_, f32> {
        self.w.view()
    }

    pub fn bias(&self) -> ArrayView1<'_, f32> {
        self.b.view()
    }

    /// Affine transform of a batch: `x · wᵀ + b`, `x` has one sample per row.
    pub fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (nin, nout) = self.dim();
        if x.ncols() != nin {
            return Err(MlErr::shape(
                "batch",
                format!("got {:?}, expected [{}, {nin}]", x.shape(), x.nrows()),
            ));
        }

        let mut z = Array2::zeros((x.nrows(), nout));
        z += &self.b;
        linalg::general_mat_mul(1.0, &x, &self.w.t(), 1.0, &mut z);
        Ok(z)
    }

    /// Affine transform of a single sample: `w · x + b`.
    pub fn forward_one(&self, x: ArrayView1<f32>) -> Result<Array1<f32>> {
        let (nin, _) = self.dim();
        if x.len() != nin {
            return Err(MlErr::shape(
                "input",
                format!("got {:?}, expected [{nin}]", x.shape()),
            ));
        }

        Ok(self.w.dot(&x) + &self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> Dense {
        Dense::new(array![[1., 0., -1.], [2., 1., 0.]], array![0.5, -0.5]).unwrap()
    }

    #[test]
    fn mismatched_bias_is_rejected() {
        let err = Dense::new(Array2::zeros((2, 3)), Array1::zeros(3)).unwrap_err();
        assert!(matches!(err, MlErr::InvalidShape { .. }));
    }

    #[test]
    fn forward_computes_affine_rows() {
        let dense = layer();
        let x = array![[1., 2., 3.], [0., 0., 0.]];
        let z = dense.forward(x.view()).unwrap();

        assert_eq!(z, array![[-1.5, 3.5], [0.5, -0.5]]);
        assert_eq!(dense.dim(), (3, 2));
        assert_eq!(dense.size(), 8);
    }

    #[test]
    fn forward_one_matches_forward() {
        let dense = layer();
        let x = array![1., 2., 3.];
        let z = dense.forward_one(x.view()).unwrap();

        assert_eq!(z, array![-1.5, 3.5]);
    }

    #[test]
    fn wrong_feature_count_is_rejected() {
        let dense = layer();
        let x = Array2::zeros((4, 2));

        assert!(matches!(
            dense.forward(x.view()),
            Err(MlErr::InvalidShape { what: "batch", .. })
        ));
        assert!(dense.forward_one(Array1::zeros(5).view()).is_err());
    }
}
