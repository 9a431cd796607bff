mod log_softmax;
mod relu;

pub use log_softmax::{log_softmax, log_softmax_rows, log_softmax_rows_backward};
pub use relu::Relu;
