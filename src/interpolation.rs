//! Interpolation of structured arrays at fractional index coordinates.

pub mod cubic_hermite_spline;
pub mod linear;

use crate::num::BFloat;
use ndarray::prelude::*;
use rayon::prelude::*;
use thiserror::Error;

/// How values are obtained for index coordinates outside an array axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryMode {
    /// Coordinates outside `[0, n - 1]` give the specified value.
    Constant(f64),
    /// Coordinates are clamped to `[0, n - 1]`.
    Nearest,
    /// The axis is treated as periodic with period `n`.
    Wrap,
}

/// Configuration parameters for index space interpolators.
#[derive(Clone, Debug)]
pub struct IndexInterpolatorConfig {
    /// How to handle coordinates outside the array.
    pub boundary_mode: BoundaryMode,
}

impl IndexInterpolatorConfig {
    pub const DEFAULT_BOUNDARY_MODE: BoundaryMode = BoundaryMode::Constant(0.0);
}

impl Default for IndexInterpolatorConfig {
    fn default() -> Self {
        IndexInterpolatorConfig {
            boundary_mode: Self::DEFAULT_BOUNDARY_MODE,
        }
    }
}

/// Defines the properties of an interpolator working in the index space of a
/// structured array of arbitrary dimensionality.
pub trait IndexInterpolator: Clone + Sync + Send {
    /// Computes the interpolated value of the array at the given fractional indices.
    ///
    /// # Parameters
    ///
    /// - `values`: Array to interpolate.
    /// - `indices`: Fractional index along each axis of the array.
    ///
    /// # Returns
    ///
    /// The interpolated value, the boundary value for constant boundaries if the
    /// indices lie outside the array, or NaN if any index is not finite.
    ///
    /// # Type parameters
    ///
    /// - `F`: Floating point type of the array data.
    fn interp_at_fractional_indices<F: BFloat>(&self, values: &ArrayViewD<F>, indices: &[F]) -> F;
}

/// Errors that can occur when interpolating at arrays of coordinates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapCoordinatesError {
    #[error("Expected {expected} coordinate arrays (one per dimension), got {actual}")]
    WrongCoordinateCount { expected: usize, actual: usize },

    #[error("Coordinate array {axis} has shape {shape:?}, expected {expected:?}")]
    CoordinateShapeMismatch {
        axis: usize,
        shape: Vec<usize>,
        expected: Vec<usize>,
    },

    #[error("Cannot interpolate along empty axis {axis}")]
    EmptyAxis { axis: usize },

    #[error("Cannot interpolate a zero-dimensional array")]
    ZeroDimensional,
}

/// Samples a structured array at fractional index coordinates.
///
/// `coordinates` holds one array per dimension of `values`, all with the same
/// shape. The returned array has that shape, with each element interpolated at
/// the index coordinates given by the corresponding coordinate elements.
pub fn map_coordinates<F, D, E, I>(
    values: ArrayView<F, D>,
    coordinates: &[ArrayView<F, E>],
    interpolator: &I,
) -> Result<Array<F, E>, MapCoordinatesError>
where
    F: BFloat,
    D: Dimension,
    E: Dimension,
    I: IndexInterpolator,
{
    if coordinates.len() != values.ndim() {
        return Err(MapCoordinatesError::WrongCoordinateCount {
            expected: values.ndim(),
            actual: coordinates.len(),
        });
    }
    if let Some(axis) = values.shape().iter().position(|&size| size == 0) {
        return Err(MapCoordinatesError::EmptyAxis { axis });
    }

    let values = values.into_dyn();

    let (first, rest) = coordinates
        .split_first()
        .ok_or(MapCoordinatesError::ZeroDimensional)?;
    for (axis, coords) in rest.iter().enumerate() {
        if coords.shape() != first.shape() {
            return Err(MapCoordinatesError::CoordinateShapeMismatch {
                axis: axis + 1,
                shape: coords.shape().to_vec(),
                expected: first.shape().to_vec(),
            });
        }
    }

    let flat_coords: Vec<Vec<F>> = coordinates
        .iter()
        .map(|coords| coords.iter().cloned().collect())
        .collect();

    let mut output = Array::zeros(first.raw_dim());
    output
        .as_slice_mut()
        .expect("Freshly allocated array should be contiguous")
        .par_iter_mut()
        .enumerate()
        .for_each(|(idx, value)| {
            let point: Vec<F> = flat_coords.iter().map(|coords| coords[idx]).collect();
            *value = interpolator.interp_at_fractional_indices(&values, &point);
        });
    Ok(output)
}

/// Position of a fractional index relative to the nodes of an axis.
enum AxisLocation<F> {
    /// Lower node index and offset from it in `[0, 1]`.
    Inside(isize, F),
    Outside,
    Invalid,
}

impl BoundaryMode {
    fn locate<F: BFloat>(&self, coord: F, size: usize) -> AxisLocation<F> {
        if !coord.is_finite() {
            return AxisLocation::Invalid;
        }
        let upper = F::from_index(size - 1);
        let tolerance = F::from_f64(1e-9).unwrap();

        let coord = match self {
            Self::Constant(_) => {
                if coord < -tolerance || coord > upper + tolerance {
                    return AxisLocation::Outside;
                }
                coord.max(F::zero()).min(upper)
            }
            Self::Nearest => coord.max(F::zero()).min(upper),
            Self::Wrap => {
                let period = F::from_index(size);
                let wrapped = coord - (coord / period).floor() * period;
                // Guard against rounding up to the period itself
                if wrapped >= period {
                    F::zero()
                } else {
                    wrapped
                }
            }
        };

        if size == 1 {
            return AxisLocation::Inside(0, F::zero());
        }

        let mut lower = coord.floor();
        if matches!(self, Self::Constant(_) | Self::Nearest) && lower >= upper {
            // Interpolate within the last cell
            lower = upper - F::one();
        }
        AxisLocation::Inside(lower.to_isize().unwrap_or(0), coord - lower)
    }

    fn resolve(&self, idx: isize, size: usize) -> usize {
        match self {
            Self::Constant(_) | Self::Nearest => idx.clamp(0, size as isize - 1) as usize,
            Self::Wrap => idx.rem_euclid(size as isize) as usize,
        }
    }

    fn outside_value<F: BFloat>(&self) -> F {
        match self {
            Self::Constant(value) => F::from_f64(*value).unwrap_or_else(F::nan),
            _ => F::nan(),
        }
    }
}

/// Evaluates a separable interpolation stencil of `N` nodes per axis.
///
/// The stencil along each axis starts `start_offset` nodes from the lower node
/// of the cell containing the coordinate, and `compute_weights` gives the node
/// weights for an offset into the cell.
fn interp_tensor_product<F, W, const N: usize>(
    values: &ArrayViewD<F>,
    indices: &[F],
    boundary_mode: &BoundaryMode,
    start_offset: isize,
    compute_weights: W,
) -> F
where
    F: BFloat,
    W: Fn(F) -> [F; N],
{
    let ndim = values.ndim();
    assert_eq!(
        indices.len(),
        ndim,
        "Number of indices does not match array dimensionality."
    );

    let mut stencil_nodes = Vec::with_capacity(ndim);
    let mut stencil_weights = Vec::with_capacity(ndim);

    for (axis, &coord) in indices.iter().enumerate() {
        let size = values.len_of(Axis(axis));
        match boundary_mode.locate(coord, size) {
            AxisLocation::Inside(lower, offset) => {
                let nodes: [usize; N] = std::array::from_fn(|n| {
                    boundary_mode.resolve(lower + start_offset + n as isize, size)
                });
                stencil_nodes.push(nodes);
                stencil_weights.push(compute_weights(offset));
            }
            AxisLocation::Outside => return boundary_mode.outside_value(),
            AxisLocation::Invalid => return F::nan(),
        }
    }

    let mut counter = vec![0; ndim];
    let mut node = vec![0; ndim];
    let mut result = F::zero();

    loop {
        let mut weight = F::one();
        for axis in 0..ndim {
            node[axis] = stencil_nodes[axis][counter[axis]];
            weight = weight * stencil_weights[axis][counter[axis]];
        }
        if weight != F::zero() {
            result = result + weight * values[node.as_slice()];
        }

        let mut axis = 0;
        loop {
            if axis == ndim {
                return result;
            }
            counter[axis] += 1;
            if counter[axis] < N {
                break;
            }
            counter[axis] = 0;
            axis += 1;
        }
    }
}
