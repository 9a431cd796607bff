use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::Normal;

use super::layers::Dense;
use crate::{MlErr, Result};

/// The standard deviation used by `Params::init`.
pub const DEFAULT_INIT_SCALE: f32 = 1e-2;

/// The parameters of a fully-connected network: an ordered list of dense layers where each
/// layer's output dimension is the next layer's input dimension.
///
/// A gradient has exactly the same structure as the parameters it was computed for, so it is
/// represented with this same type.
#[derive(Clone, Debug, PartialEq)]
pub struct Params {
    layers: Vec<Dense>,
}

impl Params {
    /// Creates randomly initialized parameters with the default scale.
    ///
    /// # Arguments
    /// * `sizes` - The layer widths, the first is the input feature count and the last the amount
    ///   of classes.
    /// * `seed` - The seed of the random number generator, equal seeds give equal parameters.
    ///
    /// # Returns
    /// The new parameters or an `InvalidShape` error if `sizes` is malformed.
    pub fn init(sizes: &[usize], seed: u64) -> Result<Self> {
        Self::init_with_scale(sizes, seed, DEFAULT_INIT_SCALE)
    }

    /// Creates parameters whose weights and biases are drawn i.i.d. from `N(0, scale²)`.
    ///
    /// Layers are sampled in order, weights first and then biases.
    ///
    /// # Arguments
    /// * `sizes` - The layer widths.
    /// * `seed` - The seed of the random number generator.
    /// * `scale` - The standard deviation of the distribution.
    ///
    /// # Returns
    /// The new parameters, an `InvalidShape` error if `sizes` is malformed or an `InvalidConfig`
    /// error if `scale` is negative or not finite.
    pub fn init_with_scale(sizes: &[usize], seed: u64, scale: f32) -> Result<Self> {
        validate_sizes(sizes)?;

        let normal = Normal::new(0., scale)
            .map_err(|e| MlErr::InvalidConfig(format!("init scale {scale}: {e}")))?;
        let mut rng = StdRng::seed_from_u64(seed);

        let layers = sizes
            .windows(2)
            .map(|pair| {
                let (nin, nout) = (pair[0], pair[1]);
                let w = Array2::random_using((nout, nin), normal, &mut rng);
                let b = Array1::random_using(nout, normal, &mut rng);
                Dense::new(w, b)
            })
            .collect::<Result<_>>()?;

        Ok(Self { layers })
    }

    /// Creates parameters from already built layers.
    ///
    /// # Returns
    /// An `InvalidShape` error if there are no layers or two consecutive layers don't chain.
    pub fn from_layers(layers: Vec<Dense>) -> Result<Self> {
        if layers.is_empty() {
            return Err(MlErr::shape("layers", "at least one layer is required"));
        }

        for (i, pair) in layers.windows(2).enumerate() {
            let (_, out) = pair[0].dim();
            let (nin, _) = pair[1].dim();

            if out != nin {
                return Err(MlErr::shape(
                    "layers",
                    format!(
                        "layer {i} outputs {out} values but layer {} expects {nin}",
                        i + 1
                    ),
                ));
            }
        }

        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn into_layers(self) -> Vec<Dense> {
        self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Returns the layer widths these parameters were built for.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.input_size()];
        sizes.extend(self.layers.iter().map(|layer| layer.dim().1));
        sizes
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.dim().0)
    }

    pub fn num_classes(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.dim().1)
    }

    /// Returns the total amount of scalar parameters.
    pub fn size(&self) -> usize {
        self.layers.iter().map(Dense::size).sum()
    }
}

fn validate_sizes(sizes: &[usize]) -> Result<()> {
    if sizes.len() < 2 {
        return Err(MlErr::shape(
            "layer sizes",
            format!("got {sizes:?}, expected at least an input and an output width"),
        ));
    }

    if let Some(i) = sizes.iter().position(|&size| size == 0) {
        return Err(MlErr::shape(
            "layer sizes",
            format!("got {sizes:?}, width at position {i} is zero"),
        ));
    }

    Ok(())
}
