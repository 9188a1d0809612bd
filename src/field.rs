//! Handling of scalar fields defined on structured grids.

use crate::{error::FciError, geometry::In3D, num::BFloat};
use ndarray::prelude::*;

/// Brings the given field into the (x, y, z) shape of a grid.
///
/// A field that already has the grid shape is copied as is. A field with the
/// same number of elements but a different shape is assumed to hold its data
/// in reversed axis order: its elements, taken in logical order, are laid out
/// with shape (nz, ny, nx) and then transposed.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the field as a standard layout array of shape (nx, ny, nz).
/// - `Err`: Contains `FciError::ShapeMismatch` if the number of elements differs.
pub fn reconcile_field_shape<F, D>(
    field: ArrayView<F, D>,
    shape: &In3D<usize>,
) -> Result<Array3<F>, FciError>
where
    F: BFloat,
    D: Dimension,
{
    let (nx, ny, nz) = shape.to_tuple();
    let shape_mismatch = || FciError::ShapeMismatch {
        field: field.shape().to_vec(),
        grid: vec![nx, ny, nz],
    };

    if field.shape() == &[nx, ny, nz] {
        return field
            .view()
            .into_dimensionality::<Ix3>()
            .map(|field| field.to_owned())
            .map_err(|_| shape_mismatch());
    }
    if field.len() != nx * ny * nz {
        return Err(shape_mismatch());
    }

    let values: Vec<F> = field.iter().cloned().collect();
    let reversed = Array3::from_shape_vec((nz, ny, nx), values).map_err(|_| shape_mismatch())?;
    Ok(reversed.reversed_axes().as_standard_layout().into_owned())
}
