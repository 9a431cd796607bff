use std::time::Duration;

use log::info;

/// The summary of one training epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub duration: Duration,
    /// The mean of the batch losses of the epoch.
    pub loss: f32,
    pub train_accuracy: f32,
    pub test_accuracy: f32,
}

/// Receives a report after every epoch.
pub trait Reporter {
    fn report(&mut self, report: &EpochReport);
}

/// Writes every report to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, report: &EpochReport) {
        let &EpochReport {
            epoch,
            duration,
            loss,
            train_accuracy,
            test_accuracy,
        } = report;

        info!(
            "epoch {epoch} in {:.2}s: loss {loss:.4}, training set accuracy {train_accuracy:.4}, test set accuracy {test_accuracy:.4}",
            duration.as_secs_f64()
        );
    }
}

impl Reporter for Vec<EpochReport> {
    fn report(&mut self, report: &EpochReport) {
        self.push(*report);
    }
}
