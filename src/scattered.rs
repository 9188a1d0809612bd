//! Interpolation of scattered 2D data.

pub mod delaunay;

use self::delaunay::Triangulation;
use crate::{
    geometry::{Dim2, Point2},
    num::BFloat,
};
use ndarray::prelude::*;
use std::cmp::Ordering;
use thiserror::Error;

/// Errors that can occur when setting up a scattered data interpolator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScatteredInterpolationError {
    #[error("Got {points} points but {values} values")]
    LengthMismatch { points: usize, values: usize },

    #[error("Point {index} has non-finite coordinates")]
    NonFinitePoint { index: usize },

    #[error("At least 3 distinct points are required, got {count}")]
    TooFewPoints { count: usize },

    #[error("All {count} distinct points are colinear")]
    Colinear { count: usize },

    #[error("Could not insert point {index} into the triangulation")]
    Triangulation { index: usize },
}

/// A 2D interpolator evaluating the piecewise linear function defined by the
/// Delaunay triangulation of a set of scattered points.
///
/// Values are weighted with the barycentric coordinates of the triangle
/// containing the interpolation point. Points outside the convex hull of the
/// scattered points have no interpolated value.
#[derive(Clone, Debug)]
pub struct LinearScatteredInterpolator2<F: BFloat> {
    triangulation: Triangulation<F>,
    values: Vec<F>,
}

impl<F: BFloat> LinearScatteredInterpolator2<F> {
    /// Creates a new interpolator for the given points and associated values.
    ///
    /// Points occurring more than once are merged, keeping the value of the first
    /// occurrence.
    pub fn new(points: &[Point2<F>], values: &[F]) -> Result<Self, ScatteredInterpolationError> {
        if points.len() != values.len() {
            return Err(ScatteredInterpolationError::LengthMismatch {
                points: points.len(),
                values: values.len(),
            });
        }
        if let Some(index) = points.iter().position(|point| !point.is_finite()) {
            return Err(ScatteredInterpolationError::NonFinitePoint { index });
        }

        let unique_indices = first_occurrence_indices(points);
        let unique_points: Vec<_> = unique_indices.iter().map(|&idx| points[idx]).collect();
        let unique_values: Vec<_> = unique_indices.iter().map(|&idx| values[idx]).collect();

        let triangulation = Triangulation::new(&unique_points)?;

        Ok(Self {
            triangulation,
            values: unique_values,
        })
    }

    /// Returns the underlying triangulation.
    pub fn triangulation(&self) -> &Triangulation<F> {
        &self.triangulation
    }

    /// Computes the interpolated value at the given point, or `None` if the point
    /// is outside the convex hull of the scattered points.
    pub fn interp(&self, point: &Point2<F>) -> Option<F> {
        self.triangulation
            .find_containing_triangle(point)
            .map(|(vertices, weights)| {
                vertices
                    .iter()
                    .zip(weights.iter())
                    .fold(F::zero(), |sum, (&vertex, &weight)| {
                        sum + weight * self.values[vertex]
                    })
            })
    }

    /// Computes the interpolated value at every node of the regular grid spanned
    /// by the given coordinates.
    ///
    /// Nodes outside the convex hull of the scattered points get `fill_value`.
    pub fn interp_onto_grid(
        &self,
        x_coords: ArrayView1<F>,
        y_coords: ArrayView1<F>,
        fill_value: F,
    ) -> Array2<F> {
        Array2::from_shape_fn((x_coords.len(), y_coords.len()), |(i, j)| {
            self.interp(&Point2::new(x_coords[i], y_coords[j]))
                .unwrap_or(fill_value)
        })
    }
}

/// Interpolates scattered 2D data linearly onto a regular grid.
///
/// Grid nodes outside the convex hull of the points get `fill_value`.
pub fn griddata<F: BFloat>(
    points: &[Point2<F>],
    values: &[F],
    x_coords: ArrayView1<F>,
    y_coords: ArrayView1<F>,
    fill_value: F,
) -> Result<Array2<F>, ScatteredInterpolationError> {
    let interpolator = LinearScatteredInterpolator2::new(points, values)?;
    Ok(interpolator.interp_onto_grid(x_coords, y_coords, fill_value))
}

/// Returns the indices of the first occurrence of each distinct point, in
/// ascending order.
fn first_occurrence_indices<F: BFloat>(points: &[Point2<F>]) -> Vec<usize> {
    let compare = |a: &Point2<F>, b: &Point2<F>| {
        a[Dim2::X]
            .partial_cmp(&b[Dim2::X])
            .unwrap_or(Ordering::Equal)
            .then(a[Dim2::Y].partial_cmp(&b[Dim2::Y]).unwrap_or(Ordering::Equal))
    };

    let mut sorted_indices: Vec<usize> = (0..points.len()).collect();
    // Stable sort keeps equal points in order of occurrence
    sorted_indices.sort_by(|&a, &b| compare(&points[a], &points[b]));

    let mut unique_indices: Vec<usize> = Vec::with_capacity(points.len());
    let mut previous: Option<usize> = None;
    for idx in sorted_indices {
        match previous {
            Some(prev) if points[prev] == points[idx] => {}
            _ => {
                unique_indices.push(idx);
                previous = Some(idx);
            }
        }
    }
    unique_indices.sort_unstable();
    unique_indices
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_functions_are_reproduced_inside_hull() {
        let f = |x: f64, y: f64| 2.0 - 0.5 * x + 3.0 * y;
        let points: Vec<_> = (0..40)
            .map(|i| {
                let t = i as f64;
                Point2::new((t * 0.754_877).fract() * 4.0, (t * 0.569_840).fract() * 4.0)
            })
            .chain([
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(0.0, 4.0),
                Point2::new(4.0, 4.0),
            ])
            .collect();
        let values: Vec<_> = points.iter().map(|p| f(p[Dim2::X], p[Dim2::Y])).collect();
        let interpolator = LinearScatteredInterpolator2::new(&points, &values).unwrap();

        for &(x, y) in &[(0.5, 0.5), (2.2, 3.1), (3.9, 0.1), (4.0, 4.0), (0.0, 2.0)] {
            assert_abs_diff_eq!(
                interpolator.interp(&Point2::new(x, y)).unwrap(),
                f(x, y),
                epsilon = 1e-10
            );
        }
        assert!(interpolator.interp(&Point2::new(4.5, 1.0)).is_none());
    }

    #[test]
    fn nodes_outside_hull_get_fill_value() {
        let points = vec![
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(2.0, 2.0),
        ];
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let coords = Array1::linspace(0.0, 3.0, 4);

        let result = griddata(&points, &values, coords.view(), coords.view(), 0.0).unwrap();

        for ((i, j), &value) in result.indexed_iter() {
            match (i, j) {
                (1, 1) => assert_eq!(value, 1.0),
                (2, 1) => assert_eq!(value, 2.0),
                (1, 2) => assert_eq!(value, 3.0),
                (2, 2) => assert_eq!(value, 4.0),
                _ => assert_eq!(value, 0.0),
            }
        }
    }

    #[test]
    fn duplicate_points_keep_first_value() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        let values = vec![5.0, 1.0, -5.0, 1.0];
        let interpolator = LinearScatteredInterpolator2::new(&points, &values).unwrap();
        assert_eq!(interpolator.interp(&Point2::new(0.0, 0.0)), Some(5.0));
        assert_eq!(interpolator.triangulation().n_triangles(), 1);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(1.0, f64::NAN)];
        assert_eq!(
            LinearScatteredInterpolator2::new(&points, &[1.0]).unwrap_err(),
            ScatteredInterpolationError::LengthMismatch {
                points: 2,
                values: 1
            }
        );
        assert_eq!(
            LinearScatteredInterpolator2::new(&points, &[1.0, 2.0]).unwrap_err(),
            ScatteredInterpolationError::NonFinitePoint { index: 1 }
        );
    }
}
