use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{
    MlErr, Result,
    arch::{DEFAULT_INIT_SCALE, loss::Reduction},
};

const DEFAULT_EPOCHS: NonZeroUsize = NonZeroUsize::new(10).unwrap();
const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(128).unwrap();

/// The hyperparameters of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// The layer widths, input features first and classes last.
    pub layer_sizes: Vec<usize>,
    pub step_size: f32,
    pub epochs: NonZeroUsize,
    pub batch_size: NonZeroUsize,
    /// Seeds the parameter initialization and the shuffling.
    pub seed: u64,
    pub init_scale: f32,
    pub reduction: Reduction,
    pub shuffle: bool,
    /// The size of the worker thread pool, rayon picks one if missing.
    pub threads: Option<NonZeroUsize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![784, 512, 512, 10],
            step_size: 0.01,
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: 0,
            init_scale: DEFAULT_INIT_SCALE,
            reduction: Reduction::default(),
            shuffle: false,
            threads: None,
        }
    }
}

impl TrainConfig {
    /// Checks the values are usable for training.
    ///
    /// # Errors
    /// `InvalidShape` for malformed layer sizes and `InvalidConfig` for a step size or
    /// initialization scale that is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if self.layer_sizes.len() < 2 || self.layer_sizes.contains(&0) {
            return Err(MlErr::shape(
                "layer sizes",
                format!(
                    "got {:?}, expected at least two non-zero widths",
                    self.layer_sizes
                ),
            ));
        }

        if !(self.step_size.is_finite() && self.step_size > 0.) {
            return Err(MlErr::InvalidConfig(format!(
                "step size must be positive, got {}",
                self.step_size
            )));
        }

        if !(self.init_scale.is_finite() && self.init_scale >= 0.) {
            return Err(MlErr::InvalidConfig(format!(
                "init scale must be non-negative, got {}",
                self.init_scale
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config: TrainConfig =
            serde_json::from_str(r#"{ "layer_sizes": [4, 3, 2], "step_size": 0.1 }"#).unwrap();

        assert_eq!(config.layer_sizes, [4, 3, 2]);
        assert_eq!(config.epochs.get(), 10);
        assert_eq!(config.batch_size.get(), 128);
        assert_eq!(config.reduction, Reduction::BatchMean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_epochs_do_not_deserialize() {
        assert!(serde_json::from_str::<TrainConfig>(r#"{ "epochs": 0 }"#).is_err());
    }

    #[test]
    fn bad_values_are_rejected() {
        let short = TrainConfig {
            layer_sizes: vec![784],
            ..Default::default()
        };
        assert!(matches!(short.validate(), Err(MlErr::InvalidShape { .. })));

        let negative = TrainConfig {
            step_size: -0.1,
            ..Default::default()
        };
        assert!(matches!(negative.validate(), Err(MlErr::InvalidConfig(_))));

        let nan = TrainConfig {
            init_scale: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(nan.validate(), Err(MlErr::InvalidConfig(_))));
    }
}
