use std::{env, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use log::{error, info};

use machine_learning::{
    data::DataLoader,
    training::{LogReporter, Trainer},
};

use crate::config::TrainerConfig;

mod config;
mod csv;

fn main() -> ExitCode {
    env_logger::init();
    ExitCode::from(exit_status(run()))
}

/// Logs a failed run once and maps it to the process status.
fn exit_status(result: Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("training failed: {e:#}");
            1
        }
    }
}

fn run() -> Result<()> {
    let path: PathBuf = env::args()
        .nth(1)
        .context("usage: trainer <config.json>")?
        .into();

    let config = TrainerConfig::load(&path)?;
    info!("loaded config from {}", path.display());

    if let Some(threads) = config.training.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads.get())
            .build_global()
            .context("cannot build the thread pool")?;
    }

    let classes = config.training.layer_sizes.last().copied().unwrap_or_default();
    let train = csv::load(&config.train_path, config.has_header, config.scale, classes)?;
    let test = csv::load(&config.test_path, config.has_header, config.scale, classes)?;
    info!(
        "loaded {} training and {} test samples with {} features",
        train.len(),
        test.len(),
        train.features()
    );

    let mut trainer = Trainer::new(config.training)?;
    let training = trainer.config();
    let mut loader = DataLoader::new(train.clone(), training.batch_size);
    if training.shuffle {
        loader = loader.shuffled(training.seed);
    }

    let params = trainer.init_params()?;
    trainer.train(params, &mut loader, &train, &test, &mut LogReporter)?;

    info!("training finished");
    Ok(())
}
