use crate::{Result, arch::Params};

/// A rule for moving parameters along a gradient.
pub trait Optimizer {
    /// Returns the parameters after taking a step with `grad`, `params` is left untouched.
    ///
    /// # Errors
    /// `InvalidShape` if `grad` doesn't have the same layout as `params`.
    fn update_params(&mut self, params: &Params, grad: &Params) -> Result<Params>;
}
