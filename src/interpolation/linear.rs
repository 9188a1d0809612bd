//! Multilinear interpolation.

use super::{interp_tensor_product, IndexInterpolator, IndexInterpolatorConfig};
use crate::num::BFloat;
use ndarray::prelude::*;

/// An interpolator weighting the 2^N nodes of the grid cell containing the
/// interpolation point linearly along each axis.
#[derive(Clone, Debug, Default)]
pub struct LinearInterpolator {
    config: IndexInterpolatorConfig,
}

impl LinearInterpolator {
    /// Creates a new linear interpolator.
    pub fn new(config: IndexInterpolatorConfig) -> Self {
        Self { config }
    }
}

impl IndexInterpolator for LinearInterpolator {
    fn interp_at_fractional_indices<F: BFloat>(&self, values: &ArrayViewD<F>, indices: &[F]) -> F {
        interp_tensor_product(values, indices, &self.config.boundary_mode, 0, |t| {
            [F::one() - t, t]
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_interpolation_is_exact_for_trilinear_functions() {
        let f = |x: f64, y: f64, z: f64| 1.0 + 2.0 * x - 0.5 * y + 3.0 * z + 0.25 * x * y * z;
        let values = Array3::from_shape_fn((5, 4, 3), |(i, j, k)| {
            f(i as f64, j as f64, k as f64)
        })
        .into_dyn();
        let interpolator = LinearInterpolator::default();

        for &(x, y, z) in &[(0.0, 0.0, 0.0), (1.3, 2.7, 0.4), (3.99, 0.01, 1.5), (4.0, 3.0, 2.0)] {
            assert_abs_diff_eq!(
                interpolator.interp_at_fractional_indices(&values.view(), &[x, y, z]),
                f(x, y, z),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn single_node_axes_are_supported() {
        let values = Array2::from_shape_fn((1, 3), |(_, k)| k as f32).into_dyn();
        let interpolator = LinearInterpolator::default();
        assert_abs_diff_eq!(
            interpolator.interp_at_fractional_indices(&values.view(), &[0.0, 1.25]),
            1.25
        );
    }
}
