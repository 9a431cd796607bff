use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::LossFn;
use crate::{
    MlErr, Result,
    autodiff::{Tape, Var},
};

/// How the per-element terms of the loss are averaged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Sum over the classes, then average over the batch.
    #[default]
    BatchMean,
    /// Average over every `(sample, class)` pair. Only rescales `BatchMean` by the amount of
    /// classes.
    ElementMean,
}

/// Categorical cross-entropy over log-probabilities and one-hot targets.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrossEntropy {
    reduction: Reduction,
}

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new(reduction: Reduction) -> Self {
        Self { reduction }
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, log_probs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        check_targets(log_probs, targets)?;

        let picked = &log_probs * &targets;
        let mean = match self.reduction {
            Reduction::BatchMean => picked.sum_axis(Axis(1)).mean(),
            Reduction::ElementMean => picked.mean(),
        };

        Ok(-mean.unwrap_or_default())
    }

    fn record(&self, tape: &mut Tape, log_probs: Var, targets: Var) -> Result<Var> {
        check_targets(tape.value(log_probs), tape.value(targets))?;

        let picked = tape.mul(log_probs, targets)?;
        let mean = match self.reduction {
            Reduction::BatchMean => {
                let per_sample = tape.sum_rows(picked);
                tape.mean(per_sample)
            }
            Reduction::ElementMean => tape.mean(picked),
        };

        Ok(tape.scale(mean, -1.))
    }
}

fn check_targets(log_probs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<()> {
    if log_probs.nrows() == 0 {
        return Err(MlErr::shape("batch", "the batch is empty"));
    }

    if log_probs.dim() != targets.dim() {
        return Err(MlErr::shape(
            "targets",
            format!(
                "got {:?}, expected {:?}",
                targets.shape(),
                log_probs.shape()
            ),
        ));
    }

    Ok(())
}
