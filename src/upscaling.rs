//! Increasing the y-resolution of fields by interpolating along field lines.

use crate::{
    error::FciError,
    field::reconcile_field_shape,
    geometry::Point2,
    interpolation::{linear::LinearInterpolator, map_coordinates, IndexInterpolator},
    io::Verbosity,
    maps::FieldLineMaps,
    num::{lerp, BFloat},
    scattered::griddata,
};
use indicatif::ParallelProgressIterator;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Configuration parameters for field line upscaling.
#[derive(Clone, Debug)]
pub struct UpscalerConfig {
    /// Number of output y-slices per input y-slice.
    pub upscale_factor: usize,
    /// Value assigned to output nodes outside the convex hull of the sample points in their slice.
    pub fill_value: f64,
}

impl UpscalerConfig {
    pub const DEFAULT_UPSCALE_FACTOR: usize = 4;
    pub const DEFAULT_FILL_VALUE: f64 = 0.0;

    /// Checks that the configuration parameter values are valid.
    pub fn validate(&self) -> Result<(), FciError> {
        if self.upscale_factor == 0 {
            return Err(FciError::InvalidParameter(
                "Upscale factor must be at least 1".to_string(),
            ));
        }
        if self.fill_value.is_nan() {
            return Err(FciError::InvalidParameter(
                "Fill value must be a number".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for UpscalerConfig {
    fn default() -> Self {
        UpscalerConfig {
            upscale_factor: Self::DEFAULT_UPSCALE_FACTOR,
            fill_value: Self::DEFAULT_FILL_VALUE,
        }
    }
}

/// Field values and index space positions sampled at regular parameter values
/// along the field line segments between neighbouring y-slices.
///
/// All arrays have shape (upscale_factor, nx, ny, nz), where the first index `k`
/// corresponds to the parameter value `k/upscale_factor` along the segment
/// starting at node (i, j, l).
#[derive(Clone, Debug)]
pub struct FieldLineSamples<F: BFloat> {
    values: Array4<F>,
    x_indices: Array4<F>,
    z_indices: Array4<F>,
}

impl<F: BFloat> FieldLineSamples<F> {
    pub fn upscale_factor(&self) -> usize {
        self.values.len_of(Axis(0))
    }

    pub fn values(&self) -> &Array4<F> {
        &self.values
    }

    pub fn x_indices(&self) -> &Array4<F> {
        &self.x_indices
    }

    pub fn z_indices(&self) -> &Array4<F> {
        &self.z_indices
    }

    /// Rearranges the samples into arrays of shape (nx, upscale_factor*ny, nz), so
    /// that sample `k` of the segment starting in y-slice `j` ends up in output
    /// y-slice `j*upscale_factor + k`.
    pub fn into_output_slices(self) -> (Array3<F>, Array3<F>, Array3<F>) {
        (
            twizzle(&self.values),
            twizzle(&self.x_indices),
            twizzle(&self.z_indices),
        )
    }
}

/// Upscales fields in the y-direction by sampling them along field lines and
/// regridding the samples in each new y-slice.
#[derive(Clone, Debug)]
pub struct FieldLineUpscaler<I: IndexInterpolator> {
    config: UpscalerConfig,
    interpolator: I,
}

impl<I: IndexInterpolator> FieldLineUpscaler<I> {
    /// Creates a new upscaler using the given interpolator for evaluating the
    /// field at the field line end points.
    pub fn new(config: UpscalerConfig, interpolator: I) -> Self {
        Self {
            config,
            interpolator,
        }
    }

    pub fn config(&self) -> &UpscalerConfig {
        &self.config
    }

    /// Samples the field, and the x- and z-indices, at `upscale_factor` evenly
    /// spaced points along each forward field line segment, starting at the
    /// segment's start node.
    ///
    /// The field must already have the shape of the maps.
    pub fn sample_along_field_lines<F: BFloat>(
        &self,
        field: ArrayView3<F>,
        maps: &FieldLineMaps<F>,
    ) -> Result<FieldLineSamples<F>, FciError> {
        self.config.validate()?;

        let (nx, ny, nz) = maps.shape().to_tuple();
        if field.dim() != (nx, ny, nz) {
            return Err(FciError::ShapeMismatch {
                field: field.shape().to_vec(),
                grid: vec![nx, ny, nz],
            });
        }
        let xt_prime = maps.forward_xt_prime();
        let zt_prime = maps.forward_zt_prime();

        let next_y_indices =
            Array3::from_shape_fn((nx, ny, nz), |(_, j, _)| F::from_index((j + 1) % ny));

        let field_prime = map_coordinates(
            field,
            &[xt_prime.view(), next_y_indices.view(), zt_prime.view()],
            &self.interpolator,
        )?;

        let factor = F::from_index(self.config.upscale_factor);
        let shape = (self.config.upscale_factor, nx, ny, nz);
        let param = |k: usize| F::from_index(k) / factor;

        let values = Array4::from_shape_fn(shape, |(k, i, j, l)| {
            lerp(field[[i, j, l]], field_prime[[i, j, l]], param(k))
        });
        let x_indices = Array4::from_shape_fn(shape, |(k, i, j, l)| {
            lerp(F::from_index(i), xt_prime[[i, j, l]], param(k))
        });
        let z_indices = Array4::from_shape_fn(shape, |(k, i, j, l)| {
            lerp(F::from_index(l), zt_prime[[i, j, l]], param(k))
        });

        Ok(FieldLineSamples {
            values,
            x_indices,
            z_indices,
        })
    }

    /// Computes the upscaled version of the given field.
    ///
    /// # Parameters
    ///
    /// - `field`: Field to upscale. Must either have the shape of the maps, or
    ///   contain the same number of elements in reversed axis order.
    /// - `maps`: Forward field line maps.
    /// - `verbosity`: Whether and how to report progress.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the upscaled field, with shape (nx, upscale_factor*ny, nz).
    /// - `Err`: Contains an `FciError` for invalid parameters, incompatible shapes or
    ///   a y-slice where regridding failed. The lowest failing slice is reported.
    ///
    /// # Type parameters
    ///
    /// - `F`: Floating point type of the field data.
    /// - `D`: Dimensionality of the input field array.
    pub fn upscale_field<F, D>(
        &self,
        field: ArrayView<F, D>,
        maps: &FieldLineMaps<F>,
        verbosity: &Verbosity,
    ) -> Result<Array3<F>, FciError>
    where
        F: BFloat,
        D: Dimension,
    {
        self.config.validate()?;
        let fill_value = F::from_f64(self.config.fill_value).ok_or_else(|| {
            FciError::InvalidParameter(format!(
                "Fill value {} is not representable",
                self.config.fill_value
            ))
        })?;

        let shape = maps.shape();
        let field = reconcile_field_shape(field, &shape)?;

        if verbosity.print_messages() {
            println!(
                "Sampling field along field lines with upscale factor {}",
                self.config.upscale_factor
            );
        }
        let samples = self.sample_along_field_lines(field.view(), maps)?;
        let (values, x_indices, z_indices) = samples.into_output_slices();

        let (nx, n_slices, nz) = values.dim();
        let x_coords = Array1::from_shape_fn(nx, F::from_index);
        let z_coords = Array1::from_shape_fn(nz, F::from_index);

        if verbosity.print_messages() {
            println!("Regridding {} y-slices", n_slices);
        }

        let mut upscaled_field = Array3::zeros((nx, n_slices, nz));

        let slice_results: Vec<Result<(), FciError>> = upscaled_field
            .axis_iter_mut(Axis(1))
            .into_par_iter()
            .enumerate()
            .progress_with(verbosity.create_progress_bar(n_slices))
            .map(|(slice, mut output)| -> Result<(), FciError> {
                let x_slice = x_indices.index_axis(Axis(1), slice);
                let z_slice = z_indices.index_axis(Axis(1), slice);
                let points: Vec<_> = x_slice
                    .iter()
                    .zip(z_slice.iter())
                    .map(|(&x, &z)| Point2::new(x, z))
                    .collect();
                let slice_values: Vec<_> =
                    values.index_axis(Axis(1), slice).iter().cloned().collect();

                let regridded = griddata(
                    &points,
                    &slice_values,
                    x_coords.view(),
                    z_coords.view(),
                    fill_value,
                )
                .map_err(|source| FciError::InterpolationFailure { slice, source })?;

                output.assign(&regridded);
                Ok(())
            })
            .collect();

        slice_results.into_iter().collect::<Result<(), _>>()?;

        Ok(upscaled_field)
    }
}

/// Upscales the given field by the given factor along the forward field line maps,
/// using linear interpolation and a fill value of zero.
pub fn upscale<F, D>(
    field: ArrayView<F, D>,
    maps: &FieldLineMaps<F>,
    upscale_factor: usize,
    verbosity: &Verbosity,
) -> Result<Array3<F>, FciError>
where
    F: BFloat,
    D: Dimension,
{
    FieldLineUpscaler::new(
        UpscalerConfig {
            upscale_factor,
            ..UpscalerConfig::default()
        },
        LinearInterpolator::default(),
    )
    .upscale_field(field, maps, verbosity)
}

/// Reindexes an array of shape (f, nx, ny, nz) into one of shape (nx, f*ny, nz),
/// with element [k, i, j, l] moved to [i, j*f + k, l].
fn twizzle<F: BFloat>(samples: &Array4<F>) -> Array3<F> {
    let (factor, nx, ny, nz) = samples.dim();
    Array3::from_shape_fn((nx, factor * ny, nz), |(i, jy, l)| {
        samples[[jy % factor, i, jy / factor, l]]
    })
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::geometry::In3D;
    use approx::assert_abs_diff_eq;

    #[test]
    fn twizzle_interleaves_samples_within_slices() {
        let samples = Array4::from_shape_fn((3, 2, 4, 2), |(k, i, j, l)| {
            (1000 * k + 100 * i + 10 * j + l) as f64
        });
        let twizzled = twizzle(&samples);
        assert_eq!(twizzled.dim(), (2, 12, 2));
        assert_eq!(twizzled[[1, 0, 1]], 101.0);
        assert_eq!(twizzled[[1, 1, 1]], 1101.0);
        assert_eq!(twizzled[[0, 5, 1]], 2011.0);
        assert_eq!(twizzled[[1, 11, 0]], 2130.0);
    }

    #[test]
    fn samples_are_evenly_spaced_along_segments() {
        let shape = In3D::new(3, 2, 3);
        let maps = FieldLineMaps::new(
            Array3::from_elem(shape.to_tuple(), 1.0),
            Array3::from_elem(shape.to_tuple(), 2.0),
        )
        .unwrap();
        let field = Array3::from_shape_fn(shape.to_tuple(), |(i, j, l)| (i + j + l) as f64);
        let upscaler = FieldLineUpscaler::new(
            UpscalerConfig {
                upscale_factor: 4,
                fill_value: 0.0,
            },
            LinearInterpolator::default(),
        );

        let samples = upscaler.sample_along_field_lines(field.view(), &maps).unwrap();
        assert_eq!(samples.upscale_factor(), 4);
        assert_eq!(samples.values().dim(), (4, 3, 2, 3));

        // Segment from node (0, 1, 0) ends at (1, 0, 2), where the field is 3
        for k in 0..4 {
            let t = k as f64 / 4.0;
            assert_abs_diff_eq!(samples.x_indices()[[k, 0, 1, 0]], t, epsilon = 1e-12);
            assert_abs_diff_eq!(samples.z_indices()[[k, 0, 1, 0]], 2.0 * t, epsilon = 1e-12);
            assert_abs_diff_eq!(samples.values()[[k, 0, 1, 0]], 1.0 + 2.0 * t, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_upscale_factor_is_rejected_before_shape_checks() {
        let maps = FieldLineMaps::<f64>::straight(&In3D::new(3, 3, 3));
        let field = Array3::<f64>::zeros((2, 2, 2));
        assert!(matches!(
            upscale(field.view(), &maps, 0, &Verbosity::Quiet),
            Err(FciError::InvalidParameter(_))
        ));
    }
}
