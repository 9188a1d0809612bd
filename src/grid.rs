//! Structured grids for field-aligned simulations.

use crate::{
    geometry::{
        Dim3::{self, X, Y, Z},
        In3D,
    },
    num::BFloat,
};
use ndarray::prelude::*;

/// A structured 3D grid with uniform spacing in each dimension.
///
/// The x-dimension has `mxg` guard cells at each boundary, so that the first
/// interior cell is centered half a cell beyond x = 0. The y- and z-dimensions
/// are periodic, with the first cell located at zero.
#[derive(Clone, Debug)]
pub struct StructuredGrid3<F: BFloat> {
    shape: In3D<usize>,
    cell_extents: In3D<F>,
    mxg: usize,
}

impl<F: BFloat> StructuredGrid3<F> {
    /// Default number of guard cells at each x-boundary.
    pub const DEFAULT_MXG: usize = 2;

    /// Creates a new grid given the shape, the extent of a grid cell in each
    /// dimension and the number of guard cells at each x-boundary.
    pub fn new(shape: In3D<usize>, cell_extents: In3D<F>, mxg: usize) -> Self {
        for dim in Dim3::slice() {
            assert_ne!(
                shape[dim], 0,
                "Cannot create grid with size zero along any dimension."
            );
            assert!(
                cell_extents[dim] > F::zero(),
                "Grid cell extents must be positive."
            );
        }
        Self {
            shape,
            cell_extents,
            mxg,
        }
    }

    /// Creates a new grid covering `x_extent` with the interior x-cells, and the
    /// periodic lengths `y_extent` and `z_extent` in y and z.
    pub fn from_extents(shape: In3D<usize>, extents: In3D<F>, mxg: usize) -> Self {
        assert!(
            shape[X] > 2 * mxg,
            "Grid must have interior cells in addition to guard cells."
        );
        let interior_x = shape[X] - 2 * mxg;
        let cell_extents = In3D::new(
            extents[X] / F::from_index(interior_x),
            extents[Y] / F::from_index(shape[Y]),
            extents[Z] / F::from_index(shape[Z]),
        );
        Self::new(shape, cell_extents, mxg)
    }

    /// Returns the 3D shape of the grid.
    pub fn shape(&self) -> &In3D<usize> {
        &self.shape
    }

    /// Returns the extent of a grid cell in each dimension.
    pub fn cell_extents(&self) -> &In3D<F> {
        &self.cell_extents
    }

    /// Returns the number of guard cells at each x-boundary.
    pub fn mxg(&self) -> usize {
        self.mxg
    }

    /// Returns the full periodic length of the y-dimension.
    pub fn y_length(&self) -> F {
        F::from_index(self.shape[Y]) * self.cell_extents[Y]
    }

    /// Computes the physical coordinate of the grid node with the given index
    /// along the given dimension.
    pub fn coord(&self, dim: Dim3, idx: usize) -> F {
        self.coord_from_fractional_index(dim, F::from_index(idx))
    }

    /// Computes the physical coordinate corresponding to a fractional index.
    pub fn coord_from_fractional_index(&self, dim: Dim3, idx: F) -> F {
        match dim {
            X => (idx - self.x_index_offset()) * self.cell_extents[X],
            Y | Z => idx * self.cell_extents[dim],
        }
    }

    /// Computes the fractional index corresponding to a physical coordinate.
    pub fn fractional_index(&self, dim: Dim3, coord: F) -> F {
        match dim {
            X => self.x_index_offset() + coord / self.cell_extents[X],
            Y | Z => coord / self.cell_extents[dim],
        }
    }

    /// Returns the coordinates of all grid nodes along the given dimension.
    pub fn coords(&self, dim: Dim3) -> Array1<F> {
        Array1::from_shape_fn(self.shape[dim], |idx| self.coord(dim, idx))
    }

    /// Returns the coordinate in the middle of the grid along the given dimension.
    pub fn centre(&self, dim: Dim3) -> F {
        let coords = self.coords(dim);
        let two = F::one() + F::one();
        (coords[0] + coords[coords.len() - 1]) / two
    }

    /// Creates 2D arrays with the x- and z-coordinates of every node in a
    /// plane of constant y.
    pub fn perpendicular_coord_meshes(&self) -> (Array2<F>, Array2<F>) {
        let xs = self.coords(X);
        let zs = self.coords(Z);
        let shape = (self.shape[X], self.shape[Z]);
        (
            Array2::from_shape_fn(shape, |(i, _)| xs[i]),
            Array2::from_shape_fn(shape, |(_, k)| zs[k]),
        )
    }

    fn x_index_offset(&self) -> F {
        let half = F::from_f64(0.5).unwrap();
        F::from_index(self.mxg) - half
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn coordinate_and_index_conversions_are_inverse() {
        let grid = StructuredGrid3::from_extents(
            In3D::new(12, 8, 16),
            In3D::new(1.6, 2.0 * std::f64::consts::PI, 3.2),
            StructuredGrid3::<f64>::DEFAULT_MXG,
        );
        assert_abs_diff_eq!(grid.cell_extents()[X], 0.2);
        assert_abs_diff_eq!(grid.cell_extents()[Z], 0.2);

        assert_abs_diff_eq!(grid.coord(X, 2), 0.1);
        assert_abs_diff_eq!(grid.fractional_index(X, 0.1), 2.0);
        assert_abs_diff_eq!(grid.coord(Z, 5), 1.0);

        for dim in Dim3::slice() {
            for idx in 0..grid.shape()[dim] {
                let coord = grid.coord(dim, idx);
                assert_abs_diff_eq!(
                    grid.fractional_index(dim, coord),
                    idx as f64,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn perpendicular_meshes_have_grid_shape() {
        let grid = StructuredGrid3::new(In3D::new(5, 3, 4), In3D::new(0.5, 1.0, 0.25), 1);
        let (x_mesh, z_mesh) = grid.perpendicular_coord_meshes();
        assert_eq!(x_mesh.dim(), (5, 4));
        assert_eq!(z_mesh.dim(), (5, 4));
        assert_abs_diff_eq!(x_mesh[[0, 3]], -0.25);
        assert_abs_diff_eq!(z_mesh[[4, 3]], 0.75);
        assert_abs_diff_eq!(grid.y_length(), 3.0);
    }
}
