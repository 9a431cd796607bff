pub mod activations;
mod backprop;
mod forward;
pub mod layers;
pub mod loss;
mod metrics;
mod params;

pub use backprop::{grad, value_and_grad};
pub use forward::{predict, predict_batch};
pub use metrics::{accuracy, argmax_rows, batch_accuracy};
pub use params::{DEFAULT_INIT_SCALE, Params};
