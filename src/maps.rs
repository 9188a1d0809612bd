//! Field line maps connecting neighbouring y-slices of a structured grid.

use crate::{
    error::FciError,
    geometry::{
        Dim3::{X, Y, Z},
        In3D,
    },
    grid::StructuredGrid3,
    io::Verbosity,
    num::BFloat,
};
use indicatif::ParallelProgressIterator;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Defines the properties of an object that can follow magnetic field lines
/// through the y-direction.
pub trait FieldLineTracer<F: BFloat>: Sync {
    /// Follows the field lines starting at the given (x, z) seed positions in the
    /// plane `y = y_targets[0]`.
    ///
    /// # Parameters
    ///
    /// - `x_seeds`: Physical x-coordinates of the seed points.
    /// - `z_seeds`: Physical z-coordinates of the seed points, with the same shape as `x_seeds`.
    /// - `y_targets`: The y-coordinates at which to record field line positions.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains an array of shape (`y_targets.len()`, `m`, `n`, 2), where
    ///   (`m`, `n`) is the shape of the seed arrays, holding the x- and z-coordinate
    ///   of each field line at each target y-coordinate.
    /// - `Err`: Contains an `FciError` describing why tracing failed.
    fn follow_field_lines(
        &self,
        x_seeds: ArrayView2<F>,
        z_seeds: ArrayView2<F>,
        y_targets: &[F],
    ) -> Result<Array4<F>, FciError>;
}

/// Forward and optionally backward field line maps.
///
/// Element (i, j, k) of the forward maps holds the fractional x- and z-index where
/// the field line through grid node (i, j, k) crosses the y-slice (j + 1) mod ny.
/// The backward maps hold the same for the y-slice (j - 1) mod ny.
#[derive(Clone, Debug)]
pub struct FieldLineMaps<F: BFloat> {
    forward_xt_prime: Array3<F>,
    forward_zt_prime: Array3<F>,
    backward: Option<(Array3<F>, Array3<F>)>,
}

impl<F: BFloat> FieldLineMaps<F> {
    /// Creates a new set of forward maps.
    ///
    /// Fails with `FciError::ShapeMismatch` if the two maps differ in shape.
    pub fn new(forward_xt_prime: Array3<F>, forward_zt_prime: Array3<F>) -> Result<Self, FciError> {
        check_same_shape(&forward_xt_prime, &forward_zt_prime)?;
        Ok(Self {
            forward_xt_prime,
            forward_zt_prime,
            backward: None,
        })
    }

    /// Adds backward maps, which must have the same shape as the forward maps.
    pub fn with_backward(
        mut self,
        backward_xt_prime: Array3<F>,
        backward_zt_prime: Array3<F>,
    ) -> Result<Self, FciError> {
        check_same_shape(&self.forward_xt_prime, &backward_xt_prime)?;
        check_same_shape(&self.forward_xt_prime, &backward_zt_prime)?;
        self.backward = Some((backward_xt_prime, backward_zt_prime));
        Ok(self)
    }

    /// Creates maps for field lines running straight along y.
    pub fn straight(shape: &In3D<usize>) -> Self {
        let shape = shape.to_tuple();
        let xt_prime = Array3::from_shape_fn(shape, |(i, _, _)| F::from_index(i));
        let zt_prime = Array3::from_shape_fn(shape, |(_, _, k)| F::from_index(k));
        Self {
            forward_xt_prime: xt_prime.clone(),
            forward_zt_prime: zt_prime.clone(),
            backward: Some((xt_prime, zt_prime)),
        }
    }

    /// Computes forward and backward maps for the given grid by following the
    /// field lines through every grid node one cell extent in each y-direction.
    pub fn trace<T>(
        grid: &StructuredGrid3<F>,
        tracer: &T,
        verbosity: &Verbosity,
    ) -> Result<Self, FciError>
    where
        T: FieldLineTracer<F>,
    {
        let (nx, ny, nz) = grid.shape().to_tuple();
        let dy = grid.cell_extents()[Y];
        let (x_mesh, z_mesh) = grid.perpendicular_coord_meshes();

        if verbosity.print_messages() {
            println!("Tracing field lines from {} y-slices", ny);
        }

        let trace_to = |y_start: F, y_end: F| -> Result<(Array2<F>, Array2<F>), FciError> {
            let positions =
                tracer.follow_field_lines(x_mesh.view(), z_mesh.view(), &[y_start, y_end])?;
            if positions.dim() != (2, nx, nz, 2) {
                return Err(FciError::Tracing(format!(
                    "Tracer returned positions with shape {:?}, expected {:?}",
                    positions.shape(),
                    [2, nx, nz, 2]
                )));
            }
            let end = positions.index_axis(Axis(0), 1);
            Ok((
                end.index_axis(Axis(2), 0)
                    .mapv(|x| grid.fractional_index(X, x)),
                end.index_axis(Axis(2), 1)
                    .mapv(|z| grid.fractional_index(Z, z)),
            ))
        };

        let slices: Vec<_> = (0..ny)
            .into_par_iter()
            .progress_with(verbosity.create_progress_bar(ny))
            .map(|j| -> Result<_, FciError> {
                let y = grid.coord(Y, j);
                Ok((trace_to(y, y + dy)?, trace_to(y, y - dy)?))
            })
            .collect();

        let mut forward_xt_prime = Array3::zeros((nx, ny, nz));
        let mut forward_zt_prime = Array3::zeros((nx, ny, nz));
        let mut backward_xt_prime = Array3::zeros((nx, ny, nz));
        let mut backward_zt_prime = Array3::zeros((nx, ny, nz));

        for (j, slice) in slices.into_iter().enumerate() {
            let ((fxt, fzt), (bxt, bzt)) = slice?;
            forward_xt_prime.index_axis_mut(Axis(1), j).assign(&fxt);
            forward_zt_prime.index_axis_mut(Axis(1), j).assign(&fzt);
            backward_xt_prime.index_axis_mut(Axis(1), j).assign(&bxt);
            backward_zt_prime.index_axis_mut(Axis(1), j).assign(&bzt);
        }

        Self::new(forward_xt_prime, forward_zt_prime)?
            .with_backward(backward_xt_prime, backward_zt_prime)
    }

    /// Returns the (nx, ny, nz) shape of the maps.
    pub fn shape(&self) -> In3D<usize> {
        let (nx, ny, nz) = self.forward_xt_prime.dim();
        In3D::new(nx, ny, nz)
    }

    pub fn forward_xt_prime(&self) -> &Array3<F> {
        &self.forward_xt_prime
    }

    pub fn forward_zt_prime(&self) -> &Array3<F> {
        &self.forward_zt_prime
    }

    pub fn backward_xt_prime(&self) -> Option<&Array3<F>> {
        self.backward.as_ref().map(|(xt_prime, _)| xt_prime)
    }

    pub fn backward_zt_prime(&self) -> Option<&Array3<F>> {
        self.backward.as_ref().map(|(_, zt_prime)| zt_prime)
    }

    /// Computes the displacement of each forward map end point from its start
    /// node, with x and z in index units and y as the given physical step.
    pub fn forward_displacements(&self, dy: F) -> In3D<Array3<F>> {
        let shape = self.forward_xt_prime.raw_dim();
        In3D::new(
            Array3::from_shape_fn(shape.clone(), |(i, j, k)| {
                self.forward_xt_prime[[i, j, k]] - F::from_index(i)
            }),
            Array3::from_elem(shape.clone(), dy),
            Array3::from_shape_fn(shape, |(i, j, k)| {
                self.forward_zt_prime[[i, j, k]] - F::from_index(k)
            }),
        )
    }
}

fn check_same_shape<F: BFloat>(reference: &Array3<F>, other: &Array3<F>) -> Result<(), FciError> {
    if reference.shape() == other.shape() {
        Ok(())
    } else {
        Err(FciError::ShapeMismatch {
            field: other.shape().to_vec(),
            grid: reference.shape().to_vec(),
        })
    }
}
