use std::time::Instant;

use log::{debug, info};

use super::{EpochReport, Reporter, TrainConfig};
use crate::{
    MlErr, Result,
    arch::{
        Params, accuracy,
        loss::{CrossEntropy, LossFn},
    },
    data::{BatchSource, Dataset, one_hot},
    optimization::{GradientDescent, Optimizer, update_with},
};

/// Trains a network over a fixed amount of epochs.
///
/// The trainer doesn't own the parameters, they are threaded through `train` so every step
/// produces a new value.
pub struct Trainer<O, L>
where
    O: Optimizer,
    L: LossFn,
{
    config: TrainConfig,
    optimizer: O,
    loss_fn: L,
}

impl Trainer<GradientDescent, CrossEntropy> {
    /// Returns a gradient descent `Trainer` minimizing the cross-entropy.
    ///
    /// # Errors
    /// If the config doesn't validate.
    pub fn new(config: TrainConfig) -> Result<Self> {
        let optimizer = GradientDescent::new(config.step_size);
        let loss_fn = CrossEntropy::new(config.reduction);
        Self::with_parts(config, optimizer, loss_fn)
    }
}

impl<O, L> Trainer<O, L>
where
    O: Optimizer,
    L: LossFn,
{
    /// Returns a new `Trainer`.
    ///
    /// # Arguments
    /// * `config` - The hyperparameters of the run.
    /// * `optimizer` - The rule used to update the parameters after every batch.
    /// * `loss_fn` - The loss being minimized.
    pub fn with_parts(config: TrainConfig, optimizer: O, loss_fn: L) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            optimizer,
            loss_fn,
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Initializes parameters for the configured layer sizes and seed.
    pub fn init_params(&self) -> Result<Params> {
        Params::init_with_scale(
            &self.config.layer_sizes,
            self.config.seed,
            self.config.init_scale,
        )
    }

    /// Runs every configured epoch.
    ///
    /// After each epoch the accuracy over both splits is computed and sent to `reporter`.
    ///
    /// # Arguments
    /// * `params` - The starting parameters.
    /// * `source` - The batches of the training split.
    /// * `train` - The whole training split, used for measuring accuracy.
    /// * `test` - The test split.
    /// * `reporter` - Receives the summary of every epoch.
    ///
    /// # Returns
    /// The trained parameters, or the first error found, which aborts the run.
    pub fn train<S, R>(
        &mut self,
        mut params: Params,
        source: &mut S,
        train: &Dataset,
        test: &Dataset,
        reporter: &mut R,
    ) -> Result<Params>
    where
        S: BatchSource + ?Sized,
        R: Reporter + ?Sized,
    {
        let train_targets = one_hot(train.labels(), params.num_classes())?;
        let test_targets = one_hot(test.labels(), params.num_classes())?;

        info!(
            "training {:?} ({} parameters) for {} epochs",
            params.sizes(),
            params.size(),
            self.config.epochs
        );

        for epoch in 0..self.config.epochs.get() {
            let start = Instant::now();
            let (next, loss) = self.run_epoch(epoch, &params, source)?;
            params = next;
            let duration = start.elapsed();

            let report = EpochReport {
                epoch,
                duration,
                loss,
                train_accuracy: accuracy(&params, train.images(), train_targets.view())?,
                test_accuracy: accuracy(&params, test.images(), test_targets.view())?,
            };
            reporter.report(&report);
        }

        Ok(params)
    }

    /// Applies one update per batch of a single epoch.
    ///
    /// # Returns
    /// A tuple with the new parameters and the mean of the batch losses, or `DataExhausted` if
    /// `source` ran out of batches before `source.num_batches()`.
    pub fn run_epoch<S>(
        &mut self,
        epoch: usize,
        params: &Params,
        source: &mut S,
    ) -> Result<(Params, f32)>
    where
        S: BatchSource + ?Sized,
    {
        let expected = source.num_batches();
        let classes = params.num_classes();

        let mut current = params.clone();
        let mut total_loss = 0.;
        let mut got = 0;

        for batch in source.batches().take(expected) {
            let targets = one_hot(batch.labels.view(), classes)?;
            let (next, loss) = update_with(
                &mut self.optimizer,
                &self.loss_fn,
                &current,
                batch.images.view(),
                targets.view(),
            )?;

            debug!(epoch = epoch, batch = got, size = batch.len(), loss = loss; "batch done");

            current = next;
            total_loss += loss;
            got += 1;
        }

        if got < expected {
            return Err(MlErr::DataExhausted {
                epoch,
                got,
                expected,
            });
        }

        let loss = if got == 0 { 0. } else { total_loss / got as f32 };
        Ok((current, loss))
    }
}
