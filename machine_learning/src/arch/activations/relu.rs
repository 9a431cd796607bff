/// Rectified linear unit, `max(0, z)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relu;

impl Relu {
    /// NaN is passed through so it still shows up in the network's output.
    pub fn f(&self, z: f32) -> f32 {
        if z.is_nan() || z > 0. { z } else { 0. }
    }

    /// The derivative is taken as `0` at the kink.
    pub fn df(&self, z: f32) -> f32 {
        if z > 0. { 1. } else { 0. }
    }
}
