//! A small fully-connected classifier trained with mini-batch gradient descent.
//!
//! The network is a list of dense layers with ReLU activations between them and a log-softmax
//! over the output. Gradients are computed by recording the batched forward pass and the loss on
//! an `autodiff::Tape` and walking it backwards.

pub mod arch;
pub mod autodiff;
pub mod data;
pub mod error;
pub mod optimization;
pub mod training;

pub use error::{MlErr, Result};
