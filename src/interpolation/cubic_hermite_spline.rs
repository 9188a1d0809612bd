//! Interpolation with a cubic Hermite spline.

use super::{interp_tensor_product, IndexInterpolator, IndexInterpolatorConfig};
use crate::num::BFloat;
use ndarray::prelude::*;

/// An interpolator evaluating a tensor product of cubic Hermite splines.
///
/// Tangents are computed with centered finite differences, so along each axis
/// the interpolant passes through the nodes and uses the four nodes surrounding
/// the interpolation point. Nodes beyond the array edges are taken from the
/// boundary mode.
#[derive(Clone, Debug, Default)]
pub struct CubicHermiteSplineInterpolator {
    config: IndexInterpolatorConfig,
}

impl CubicHermiteSplineInterpolator {
    /// Creates a new cubic Hermite spline interpolator.
    pub fn new(config: IndexInterpolatorConfig) -> Self {
        Self { config }
    }

    fn hermite_basis_00<F: BFloat>(t: F) -> F {
        let two = F::one() + F::one();
        (F::one() + two * t) * (F::one() - t).powi(2)
    }

    fn hermite_basis_10<F: BFloat>(t: F) -> F {
        t * (F::one() - t).powi(2)
    }

    fn hermite_basis_01<F: BFloat>(t: F) -> F {
        let two = F::one() + F::one();
        t * t * (two + F::one() - two * t)
    }

    fn hermite_basis_11<F: BFloat>(t: F) -> F {
        t * t * (t - F::one())
    }

    /// Weights of the nodes at offsets -1, 0, 1 and 2 from the lower node of the cell.
    fn node_weights<F: BFloat>(t: F) -> [F; 4] {
        let half = F::from_f64(0.5).unwrap();
        let h00 = Self::hermite_basis_00(t);
        let h10 = Self::hermite_basis_10(t);
        let h01 = Self::hermite_basis_01(t);
        let h11 = Self::hermite_basis_11(t);
        [
            -half * h10,
            h00 - half * h11,
            h01 + half * h10,
            half * h11,
        ]
    }
}

impl IndexInterpolator for CubicHermiteSplineInterpolator {
    fn interp_at_fractional_indices<F: BFloat>(&self, values: &ArrayViewD<F>, indices: &[F]) -> F {
        interp_tensor_product(
            values,
            indices,
            &self.config.boundary_mode,
            -1,
            Self::node_weights,
        )
    }
}
