use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
///
/// Every variant is unrecoverable for the current run, callers are expected to propagate it up to
/// whoever drives the training.
#[derive(Debug, Clone, PartialEq)]
pub enum MlErr {
    /// A malformed layer size list, or a shape mismatch between consecutive layers, between the
    /// parameters and a batch, or between predictions and targets.
    InvalidShape { what: &'static str, detail: String },
    /// A non-finite value showed up in the inputs or in the computed log-probabilities.
    NumericOverflow { what: &'static str, row: usize },
    /// The batch source ended before producing every batch of the epoch.
    DataExhausted {
        epoch: usize,
        got: usize,
        expected: usize,
    },
    /// A configuration value is out of its valid range.
    InvalidConfig(String),
}

impl MlErr {
    pub(crate) fn shape(what: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidShape {
            what,
            detail: detail.into(),
        }
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::InvalidShape { what, detail } => write!(f, "invalid shape for {what}: {detail}"),
            MlErr::NumericOverflow { what, row } => {
                write!(f, "non-finite value in {what} at row {row}")
            }
            MlErr::DataExhausted {
                epoch,
                got,
                expected,
            } => write!(
                f,
                "batch source exhausted at epoch {epoch}: got {got} batches, expected {expected}"
            ),
            MlErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for MlErr {}
