mod gradient_descent;
mod optimizer;
mod update;

pub use gradient_descent::GradientDescent;
pub use optimizer::Optimizer;
pub use update::{update, update_with};
