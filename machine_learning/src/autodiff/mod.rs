//! Reverse-mode automatic differentiation over `ndarray` matrices.

mod tape;

pub use tape::{Gradients, Tape, Var};
