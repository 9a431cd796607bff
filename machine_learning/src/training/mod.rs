mod config;
mod report;
mod trainer;

pub use config::TrainConfig;
pub use report::{EpochReport, LogReporter, Reporter};
pub use trainer::Trainer;
