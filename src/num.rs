//! Utilities related to numbers.

use num;
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync + Send + num::Float + num::cast::FromPrimitive + fmt::Debug + fmt::Display + 'static
{
    /// Converts an index or count to the floating point type.
    fn from_index(idx: usize) -> Self {
        Self::from_usize(idx).expect("Index not representable as float.")
    }
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Linearly interpolates between `start` and `end` at parameter `t`.
pub fn lerp<F: BFloat>(start: F, end: F, t: F) -> F {
    start + t * (end - start)
}
