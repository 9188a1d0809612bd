//! Labelling of magnetic flux surfaces from Poincaré sections.

use crate::{
    error::FciError,
    geometry::{
        Dim3::{X, Y, Z},
        Point2,
    },
    grid::StructuredGrid3,
    io::Verbosity,
    maps::FieldLineTracer,
    num::BFloat,
    scattered::griddata,
};
use indicatif::ParallelProgressIterator;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Value of the surface label outside the outermost traced surface.
pub const OUTSIDE_SURFACE_LABEL: f64 = 1.0;

/// Traces field lines from seed points along the x-axis through the grid centre
/// and interpolates the resulting flux surface labels onto the grid.
///
/// Seeds are placed at `x_centre + [0, 0.5*max(x)]` (evenly spaced) and
/// `z_centre`, and followed through `revs` periods of the y-dimension. Surface `s`
/// gets the label `s/(nsurfaces - 1)`.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the label of every grid node, with value 1 outside the outermost surface.
/// - `Err`: Contains an `FciError` for invalid parameters, a tracing failure or a
///   y-slice where interpolation failed.
pub fn interpolate_flux_surfaces<F, T>(
    grid: &StructuredGrid3<F>,
    tracer: &T,
    nsurfaces: usize,
    revs: usize,
    verbosity: &Verbosity,
) -> Result<Array3<F>, FciError>
where
    F: BFloat,
    T: FieldLineTracer<F>,
{
    check_surface_count(nsurfaces)?;
    if revs == 0 {
        return Err(FciError::InvalidParameter(
            "Number of revolutions must be at least 1".to_string(),
        ));
    }
    let ny = grid.shape()[Y];

    let max_x = grid
        .coords(X)
        .fold(F::neg_infinity(), |max, &x| max.max(x));
    let half = F::from_f64(0.5).unwrap();
    let x_seeds = Array1::linspace(F::zero(), half * max_x, nsurfaces)
        .mapv(|offset| grid.centre(X) + offset)
        .insert_axis(Axis(1));
    let z_seeds = Array2::from_elem((nsurfaces, 1), grid.centre(Z));

    let y_length = grid.y_length();
    let y_targets: Vec<F> = (0..revs)
        .flat_map(|rev| (0..ny).map(move |j| (rev, j)))
        .map(|(rev, j)| F::from_index(rev) * y_length + grid.coord(Y, j))
        .collect();

    if verbosity.print_messages() {
        println!(
            "Tracing {} flux surfaces through {} revolutions",
            nsurfaces, revs
        );
    }
    let positions = tracer.follow_field_lines(x_seeds.view(), z_seeds.view(), &y_targets)?;
    if positions.dim() != (revs * ny, nsurfaces, 1, 2) {
        return Err(FciError::Tracing(format!(
            "Tracer returned positions with shape {:?}, expected {:?}",
            positions.shape(),
            [revs * ny, nsurfaces, 1, 2]
        )));
    }

    let points = Array4::from_shape_fn((revs, ny, nsurfaces, 2), |(rev, j, s, c)| {
        positions[[rev * ny + j, s, 0, c]]
    });

    label_traced_surfaces(grid, points.view(), verbosity)
}

/// Interpolates flux surface labels from traced surface points onto the grid.
///
/// `points` has shape (revs, ny, nsurfaces, 2) and holds the physical x- and
/// z-coordinate where surface `s` crosses y-slice `j` in revolution `rev`.
pub fn label_traced_surfaces<F: BFloat>(
    grid: &StructuredGrid3<F>,
    points: ArrayView4<F>,
    verbosity: &Verbosity,
) -> Result<Array3<F>, FciError> {
    let (nx, ny, nz) = grid.shape().to_tuple();
    let (_, n_slices, nsurfaces, n_components) = points.dim();
    if n_slices != ny || n_components != 2 {
        return Err(FciError::ShapeMismatch {
            field: points.shape().to_vec(),
            grid: vec![nx, ny, nz],
        });
    }
    check_surface_count(nsurfaces)?;

    let max_label = F::from_index(nsurfaces - 1);
    let fill_value = F::from_f64(OUTSIDE_SURFACE_LABEL).unwrap();
    let x_coords = grid.coords(X);
    let z_coords = grid.coords(Z);

    let mut labels = Array3::zeros((nx, ny, nz));

    let slice_results: Vec<Result<(), FciError>> = labels
        .axis_iter_mut(Axis(1))
        .into_par_iter()
        .enumerate()
        .progress_with(verbosity.create_progress_bar(ny))
        .map(|(slice, mut output)| -> Result<(), FciError> {
            let slice_points = points.index_axis(Axis(1), slice);
            let mut scattered_points = Vec::with_capacity(slice_points.len() / 2);
            let mut surface_labels = Vec::with_capacity(slice_points.len() / 2);
            for crossings in slice_points.outer_iter() {
                for (s, position) in crossings.outer_iter().enumerate() {
                    scattered_points.push(Point2::new(position[0], position[1]));
                    surface_labels.push(F::from_index(s) / max_label);
                }
            }
            let interpolated = griddata(
                &scattered_points,
                &surface_labels,
                x_coords.view(),
                z_coords.view(),
                fill_value,
            )
            .map_err(|source| FciError::InterpolationFailure { slice, source })?;
            output.assign(&interpolated);
            Ok(())
        })
        .collect();

    slice_results.into_iter().collect::<Result<(), _>>()?;

    Ok(labels)
}

fn check_surface_count(nsurfaces: usize) -> Result<(), FciError> {
    if nsurfaces < 2 {
        Err(FciError::InvalidParameter(format!(
            "At least 2 flux surfaces are required, got {}",
            nsurfaces
        )))
    } else {
        Ok(())
    }
}
