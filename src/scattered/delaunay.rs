//! Delaunay triangulation of scattered 2D points.

use super::ScatteredInterpolationError;
use crate::{
    geometry::{in_circumcircle, orientation, Dim2, Point2},
    num::BFloat,
};
use std::collections::{HashMap, HashSet};

/// A Delaunay triangulation of a set of distinct 2D points.
///
/// Points are stored relative to the lower corner of their bounding box, which
/// keeps the predicates exact for points on integer lattices of moderate size.
#[derive(Clone, Debug)]
pub struct Triangulation<F: BFloat> {
    origin: Point2<F>,
    points: Vec<Point2<F>>,
    triangles: Vec<[usize; 3]>,
    locator: TriangleLocator<F>,
}

impl<F: BFloat> Triangulation<F> {
    /// Factor relating the super triangle size to the extent of the point bounding box.
    const SUPER_TRIANGLE_SCALE: f64 = 8.0;

    /// Triangulates the given distinct, finite points with the Bowyer-Watson algorithm.
    ///
    /// Points are inserted in the order of a Hilbert curve through their bounding
    /// box, so that each insertion only touches a small neighbourhood of the mesh.
    pub fn new(points: &[Point2<F>]) -> Result<Self, ScatteredInterpolationError> {
        let n_points = points.len();
        if n_points < 3 {
            return Err(ScatteredInterpolationError::TooFewPoints { count: n_points });
        }

        let (lower, upper) = bounding_box(points);
        let origin = lower;
        let mut local_points: Vec<_> = points
            .iter()
            .map(|point| point.relative_to(&origin))
            .collect();

        if all_colinear(&local_points) {
            return Err(ScatteredInterpolationError::Colinear { count: n_points });
        }

        let extent = (upper[Dim2::X] - lower[Dim2::X]).max(upper[Dim2::Y] - lower[Dim2::Y]);
        let insertion_order = hilbert_sorted_indices(&local_points, extent);

        let size = (extent * F::from_f64(Self::SUPER_TRIANGLE_SCALE).unwrap())
            .ceil()
            .max(F::one());
        let five = F::from_f64(5.0).unwrap();
        local_points.push(Point2::new(-size, -size));
        local_points.push(Point2::new(five * size, -size));
        local_points.push(Point2::new(-size, five * size));

        let mut mesh = Mesh::new(&local_points, [n_points, n_points + 1, n_points + 2]);
        for idx in insertion_order {
            mesh.insert_point(idx)?;
        }
        let triangles = mesh.into_triangles(n_points);
        local_points.truncate(n_points);

        let locator = TriangleLocator::new(&local_points, &triangles);

        Ok(Self {
            origin,
            points: local_points,
            triangles,
            locator,
        })
    }

    /// Returns the number of triangles.
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the vertex indices of each counterclockwise triangle.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Finds a triangle containing the given point.
    ///
    /// # Returns
    ///
    /// The vertex indices of the triangle and the barycentric weights of the point
    /// with respect to them, or `None` if the point is outside the triangulation.
    pub fn find_containing_triangle(&self, point: &Point2<F>) -> Option<([usize; 3], [F; 3])> {
        let point = point.relative_to(&self.origin);
        let tolerance = -(F::epsilon() * F::from_f64(100.0).unwrap());

        self.locator
            .candidates(&point)
            .iter()
            .find_map(|&triangle_idx| {
                let triangle = self.triangles[triangle_idx];
                let weights = self.barycentric_weights(&triangle, &point);
                if weights.iter().all(|&weight| weight >= tolerance) {
                    Some((triangle, weights))
                } else {
                    None
                }
            })
    }

    fn barycentric_weights(&self, &[a, b, c]: &[usize; 3], point: &Point2<F>) -> [F; 3] {
        let (pa, pb, pc) = (&self.points[a], &self.points[b], &self.points[c]);
        let area = orientation(pa, pb, pc);
        [
            orientation(point, pb, pc) / area,
            orientation(pa, point, pc) / area,
            orientation(pa, pb, point) / area,
        ]
    }
}

/// Adjustment needed to make a cavity star-shaped with respect to the point
/// being inserted.
enum CavityRepair {
    /// Add the triangle across an edge passing through the point.
    Extend(usize),
    /// Remove a triangle with an edge facing away from the point.
    Shrink(usize),
}

/// Start and end vertex of a cavity boundary edge, and the triangle outside it.
type BoundaryEdge = (usize, usize, Option<usize>);

/// Triangle mesh under construction.
///
/// Edge `e` of a triangle runs from vertex `e` to vertex `(e + 1) % 3`, and
/// `neighbours[t][e]` is the triangle on the other side of that edge. Triangles
/// removed by an insertion stay in the arrays but are marked as dead.
struct Mesh<'a, F: BFloat> {
    points: &'a [Point2<F>],
    triangles: Vec<[usize; 3]>,
    neighbours: Vec<[Option<usize>; 3]>,
    alive: Vec<bool>,
    in_cavity: Vec<bool>,
    tested_for: Vec<usize>,
    last_created: usize,
}

impl<'a, F: BFloat> Mesh<'a, F> {
    fn new(points: &'a [Point2<F>], super_triangle: [usize; 3]) -> Self {
        let mut mesh = Self {
            points,
            triangles: Vec::with_capacity(2 * points.len()),
            neighbours: Vec::with_capacity(2 * points.len()),
            alive: Vec::with_capacity(2 * points.len()),
            in_cavity: Vec::with_capacity(2 * points.len()),
            tested_for: Vec::with_capacity(2 * points.len()),
            last_created: 0,
        };
        mesh.push_triangle(super_triangle, [None; 3]);
        mesh
    }

    fn push_triangle(&mut self, vertices: [usize; 3], neighbours: [Option<usize>; 3]) -> usize {
        let triangle_idx = self.triangles.len();
        self.triangles.push(vertices);
        self.neighbours.push(neighbours);
        self.alive.push(true);
        self.in_cavity.push(false);
        self.tested_for.push(usize::MAX);
        triangle_idx
    }

    fn edge_side(&self, triangle_idx: usize, edge: usize, point: &Point2<F>) -> F {
        let vertices = &self.triangles[triangle_idx];
        orientation(
            &self.points[vertices[edge]],
            &self.points[vertices[(edge + 1) % 3]],
            point,
        )
    }

    fn contains(&self, triangle_idx: usize, point: &Point2<F>) -> bool {
        triangle_contains(self.points, &self.triangles[triangle_idx], point)
    }

    fn insert_point(&mut self, idx: usize) -> Result<(), ScatteredInterpolationError> {
        let point = self.points[idx];
        let seed = self.locate(&point, idx)?;

        let mut cavity = self.grow_cavity(seed, &point, idx);
        let mut rejected = Vec::new();

        let boundary = loop {
            match self.cavity_boundary(&cavity, &point, &rejected) {
                Ok(boundary) => break boundary,
                Err(CavityRepair::Extend(triangle_idx)) => {
                    self.in_cavity[triangle_idx] = true;
                    cavity.push(triangle_idx);
                }
                Err(CavityRepair::Shrink(triangle_idx)) => {
                    if triangle_idx == seed {
                        self.clear_cavity(&cavity);
                        return Err(ScatteredInterpolationError::Triangulation { index: idx });
                    }
                    self.in_cavity[triangle_idx] = false;
                    rejected.push(triangle_idx);
                    cavity = self.connected_part(seed, cavity);
                }
            }
        };

        self.clear_cavity(&cavity);
        for &triangle_idx in &cavity {
            self.alive[triangle_idx] = false;
        }

        let first_new = self.triangles.len();
        let mut starting_at = HashMap::with_capacity(boundary.len());
        let mut ending_at = HashMap::with_capacity(boundary.len());
        for (offset, &(start, end, _)) in boundary.iter().enumerate() {
            starting_at.insert(start, first_new + offset);
            ending_at.insert(end, first_new + offset);
        }

        for (start, end, outer) in boundary {
            let triangle_idx = self.push_triangle(
                [start, end, idx],
                [
                    outer,
                    starting_at.get(&end).copied(),
                    ending_at.get(&start).copied(),
                ],
            );
            if let Some(outer) = outer {
                self.replace_neighbour(outer, end, start, triangle_idx);
            }
        }
        self.last_created = first_new;
        Ok(())
    }

    /// Walks from the most recently created triangle towards the point.
    fn locate(&self, point: &Point2<F>, idx: usize) -> Result<usize, ScatteredInterpolationError> {
        let mut current = self.last_created;
        for step in 0..self.triangles.len() {
            let crossed_edge = (0..3)
                .map(|offset| (step + offset) % 3)
                .find(|&edge| self.edge_side(current, edge, point) < F::zero());
            match crossed_edge {
                None => return Ok(current),
                Some(edge) => match self.neighbours[current][edge] {
                    Some(neighbour) => current = neighbour,
                    None => return Err(ScatteredInterpolationError::Triangulation { index: idx }),
                },
            }
        }
        // The walk can cycle in a triangulation that is not quite Delaunay
        (0..self.triangles.len())
            .find(|&triangle_idx| self.alive[triangle_idx] && self.contains(triangle_idx, point))
            .ok_or(ScatteredInterpolationError::Triangulation { index: idx })
    }

    /// Collects the connected triangles whose circumcircle contains the point.
    fn grow_cavity(&mut self, seed: usize, point: &Point2<F>, idx: usize) -> Vec<usize> {
        self.in_cavity[seed] = true;
        let mut cavity = vec![seed];
        let mut next = 0;
        while next < cavity.len() {
            let triangle_idx = cavity[next];
            next += 1;
            for neighbour in self.neighbours[triangle_idx].into_iter().flatten() {
                if self.in_cavity[neighbour] || self.tested_for[neighbour] == idx {
                    continue;
                }
                self.tested_for[neighbour] = idx;
                let [a, b, c] = self.triangles[neighbour];
                if in_circumcircle(&self.points[a], &self.points[b], &self.points[c], point) {
                    self.in_cavity[neighbour] = true;
                    cavity.push(neighbour);
                }
            }
        }
        cavity
    }

    /// Finds the boundary edges of the cavity, each with the triangle outside it.
    ///
    /// Every boundary edge must face the point. An edge passing exactly through
    /// the point is instead absorbed by adding the triangle on its other side.
    fn cavity_boundary(
        &self,
        cavity: &[usize],
        point: &Point2<F>,
        rejected: &[usize],
    ) -> Result<Vec<BoundaryEdge>, CavityRepair> {
        let mut boundary = Vec::with_capacity(cavity.len() + 2);
        for &triangle_idx in cavity {
            let vertices = self.triangles[triangle_idx];
            for edge in 0..3 {
                let outer = self.neighbours[triangle_idx][edge];
                if outer.map_or(false, |outer| self.in_cavity[outer]) {
                    continue;
                }
                let side = self.edge_side(triangle_idx, edge, point);
                if side > F::zero() {
                    boundary.push((vertices[edge], vertices[(edge + 1) % 3], outer));
                } else if side == F::zero() && self.contains(triangle_idx, point) {
                    return Err(match outer {
                        Some(outer) if !rejected.contains(&outer) => CavityRepair::Extend(outer),
                        _ => CavityRepair::Shrink(triangle_idx),
                    });
                } else {
                    return Err(CavityRepair::Shrink(triangle_idx));
                }
            }
        }
        Ok(boundary)
    }

    /// Keeps only the cavity triangles still reachable from the seed triangle.
    fn connected_part(&mut self, seed: usize, cavity: Vec<usize>) -> Vec<usize> {
        let members: HashSet<usize> = cavity
            .iter()
            .copied()
            .filter(|&triangle_idx| self.in_cavity[triangle_idx])
            .collect();
        self.clear_cavity(&cavity);

        self.in_cavity[seed] = true;
        let mut connected = vec![seed];
        let mut next = 0;
        while next < connected.len() {
            let triangle_idx = connected[next];
            next += 1;
            for neighbour in self.neighbours[triangle_idx].into_iter().flatten() {
                if members.contains(&neighbour) && !self.in_cavity[neighbour] {
                    self.in_cavity[neighbour] = true;
                    connected.push(neighbour);
                }
            }
        }
        connected
    }

    fn clear_cavity(&mut self, cavity: &[usize]) {
        for &triangle_idx in cavity {
            self.in_cavity[triangle_idx] = false;
        }
    }

    /// Points the edge (start, end) of the given triangle to a new neighbour.
    fn replace_neighbour(
        &mut self,
        triangle_idx: usize,
        start: usize,
        end: usize,
        neighbour: usize,
    ) {
        let vertices = self.triangles[triangle_idx];
        if let Some(edge) =
            (0..3).find(|&edge| vertices[edge] == start && vertices[(edge + 1) % 3] == end)
        {
            self.neighbours[triangle_idx][edge] = Some(neighbour);
        }
    }

    /// Returns the live, non-degenerate triangles whose vertices are all among
    /// the first `n_points` points.
    fn into_triangles(self, n_points: usize) -> Vec<[usize; 3]> {
        let points = self.points;
        self.triangles
            .into_iter()
            .zip(self.alive)
            .filter_map(|(triangle, alive)| if alive { Some(triangle) } else { None })
            .filter(|&[a, b, c]| {
                a < n_points
                    && b < n_points
                    && c < n_points
                    && orientation(&points[a], &points[b], &points[c]) > F::zero()
            })
            .collect()
    }
}

/// Returns the point indices sorted along a Hilbert curve covering the square
/// `[0, extent]²`.
fn hilbert_sorted_indices<F: BFloat>(points: &[Point2<F>], extent: F) -> Vec<usize> {
    const ORDER: u32 = 16;
    let max_cell = (1_u32 << ORDER) - 1;
    let scale = F::from_index(max_cell as usize) / extent.max(F::min_positive_value());
    let cell = |coord: F| (coord * scale).to_u32().unwrap_or(0).min(max_cell);

    let mut keyed_indices: Vec<(u64, usize)> = points
        .iter()
        .enumerate()
        .map(|(idx, point)| {
            (
                hilbert_index(ORDER, cell(point[Dim2::X]), cell(point[Dim2::Y])),
                idx,
            )
        })
        .collect();
    keyed_indices.sort_unstable();
    keyed_indices.into_iter().map(|(_, idx)| idx).collect()
}

/// Distance along the Hilbert curve of the given order to the cell (x, y).
fn hilbert_index(order: u32, mut x: u32, mut y: u32) -> u64 {
    let n = 1_u32 << order;
    let mut index = 0;
    let mut s = n / 2;
    while s > 0 {
        let rx = u32::from((x & s) > 0);
        let ry = u32::from((y & s) > 0);
        index += u64::from(s) * u64::from(s) * u64::from((3 * rx) ^ ry);
        if ry == 0 {
            if rx == 1 {
                x = n - 1 - x;
                y = n - 1 - y;
            }
            std::mem::swap(&mut x, &mut y);
        }
        s /= 2;
    }
    index
}

/// Whether the point lies inside or on the boundary of the counterclockwise triangle.
fn triangle_contains<F: BFloat>(
    points: &[Point2<F>],
    &[a, b, c]: &[usize; 3],
    point: &Point2<F>,
) -> bool {
    orientation(&points[a], &points[b], point) >= F::zero()
        && orientation(&points[b], &points[c], point) >= F::zero()
        && orientation(&points[c], &points[a], point) >= F::zero()
}

fn bounding_box<F: BFloat>(points: &[Point2<F>]) -> (Point2<F>, Point2<F>) {
    let mut lower = points[0];
    let mut upper = points[0];
    for point in &points[1..] {
        for dim in Dim2::slice() {
            lower[dim] = lower[dim].min(point[dim]);
            upper[dim] = upper[dim].max(point[dim]);
        }
    }
    (lower, upper)
}

fn all_colinear<F: BFloat>(points: &[Point2<F>]) -> bool {
    let first = &points[0];
    match points[1..].iter().find(|point| *point != first) {
        Some(second) => points
            .iter()
            .all(|point| orientation(first, second, point) == F::zero()),
        None => true,
    }
}

/// Uniform grid of bins over the triangulation, each listing the triangles
/// whose bounding box overlaps the bin.
#[derive(Clone, Debug)]
struct TriangleLocator<F: BFloat> {
    lower: Point2<F>,
    upper: Point2<F>,
    bin_extents: [F; 2],
    n_bins: usize,
    bins: Vec<Vec<usize>>,
}

impl<F: BFloat> TriangleLocator<F> {
    const MAX_BINS_PER_AXIS: usize = 512;

    fn new(points: &[Point2<F>], triangles: &[[usize; 3]]) -> Self {
        let (lower, upper) = bounding_box(points);
        let n_bins =
            ((triangles.len() as f64).sqrt().ceil() as usize).clamp(1, Self::MAX_BINS_PER_AXIS);
        let n_bins_float = F::from_index(n_bins);
        let bin_extents = [
            ((upper[Dim2::X] - lower[Dim2::X]) / n_bins_float).max(F::min_positive_value()),
            ((upper[Dim2::Y] - lower[Dim2::Y]) / n_bins_float).max(F::min_positive_value()),
        ];

        let mut locator = Self {
            lower,
            upper,
            bin_extents,
            n_bins,
            bins: vec![Vec::new(); n_bins * n_bins],
        };

        for (triangle_idx, &[a, b, c]) in triangles.iter().enumerate() {
            let (triangle_lower, triangle_upper) =
                bounding_box(&[points[a], points[b], points[c]]);
            let (i_start, j_start) = locator.bin_indices(&triangle_lower);
            let (i_end, j_end) = locator.bin_indices(&triangle_upper);
            for i in i_start..=i_end {
                for j in j_start..=j_end {
                    locator.bins[i * n_bins + j].push(triangle_idx);
                }
            }
        }
        locator
    }

    fn bin_indices(&self, point: &Point2<F>) -> (usize, usize) {
        let max_idx = self.n_bins - 1;
        let idx = |dim: Dim2| {
            ((point[dim] - self.lower[dim]) / self.bin_extents[dim as usize])
                .floor()
                .to_usize()
                .unwrap_or(0)
                .min(max_idx)
        };
        (idx(Dim2::X), idx(Dim2::Y))
    }

    fn candidates(&self, point: &Point2<F>) -> &[usize] {
        let tolerance = F::epsilon() * F::from_f64(100.0).unwrap();
        let outside = Dim2::slice().iter().any(|&dim| {
            let margin = tolerance * (F::one() + self.upper[dim].abs());
            point[dim] < self.lower[dim] - margin || point[dim] > self.upper[dim] + margin
        });
        if outside {
            return &[];
        }
        let (i, j) = self.bin_indices(point);
        &self.bins[i * self.n_bins + j]
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;
    use std::time::{Duration, Instant};

    fn lattice(nx: usize, ny: usize) -> Vec<Point2<f64>> {
        (0..nx)
            .flat_map(|i| (0..ny).map(move |j| Point2::new(i as f64, j as f64)))
            .collect()
    }

    fn total_area(triangulation: &Triangulation<f64>) -> f64 {
        triangulation
            .triangles()
            .iter()
            .map(|&[a, b, c]| {
                0.5 * orientation(
                    &triangulation.points[a],
                    &triangulation.points[b],
                    &triangulation.points[c],
                )
            })
            .sum()
    }

    #[test]
    fn lattice_triangulation_covers_convex_hull() {
        let triangulation = Triangulation::new(&lattice(6, 5)).unwrap();
        assert_eq!(triangulation.n_triangles(), 2 * 5 * 4);
        assert_eq!(total_area(&triangulation), 20.0);
    }

    #[test]
    fn random_like_points_give_delaunay_triangles() {
        let points: Vec<_> = (0..60)
            .map(|i| {
                let t = i as f64;
                Point2::new((t * 0.618_034).fract() * 3.0, (t * 0.414_214).fract() * 2.0)
            })
            .collect();
        let triangulation = Triangulation::new(&points).unwrap();

        for &[a, b, c] in triangulation.triangles() {
            let (pa, pb, pc) = (
                &triangulation.points[a],
                &triangulation.points[b],
                &triangulation.points[c],
            );
            assert!(orientation(pa, pb, pc) > 0.0);
            for (idx, point) in triangulation.points.iter().enumerate() {
                if idx != a && idx != b && idx != c {
                    assert!(!in_circumcircle(pa, pb, pc, point));
                }
            }
        }
    }

    #[test]
    fn large_perturbed_lattice_is_triangulated_quickly() {
        let n = 128;
        let points: Vec<_> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| {
                let (x, y) = (i as f64, j as f64);
                if i == 0 || j == 0 || i == n - 1 || j == n - 1 {
                    Point2::new(x, y)
                } else {
                    Point2::new(
                        x + 0.35 * (12.9898 * x + 78.233 * y).sin(),
                        y + 0.35 * (39.3468 * x + 11.135 * y).cos(),
                    )
                }
            })
            .collect();

        let start = Instant::now();
        let triangulation = Triangulation::new(&points).unwrap();
        assert!(start.elapsed() < Duration::from_secs(30));

        let n_boundary_points = 4 * (n - 1);
        assert_eq!(
            triangulation.n_triangles(),
            2 * n * n - n_boundary_points - 2
        );
        assert_abs_diff_eq!(
            total_area(&triangulation),
            ((n - 1) * (n - 1)) as f64,
            epsilon = 1e-8
        );
        assert!(triangulation.triangles().iter().all(|&[a, b, c]| orientation(
            &triangulation.points[a],
            &triangulation.points[b],
            &triangulation.points[c]
        ) > 0.0));
    }

    #[test]
    fn points_on_existing_edges_are_inserted() {
        let mut points = lattice(5, 5);
        points.extend((0..4).map(|i| Point2::new(i as f64 + 0.5, 2.0)));
        points.extend((0..4).map(|j| Point2::new(1.0, j as f64 + 0.5)));
        let triangulation = Triangulation::new(&points).unwrap();
        assert_eq!(total_area(&triangulation), 16.0);
        for point in &points {
            assert!(triangulation.find_containing_triangle(point).is_some());
        }
    }

    #[test]
    fn hilbert_index_visits_neighbouring_cells_in_sequence() {
        let order = 3;
        let side = 1_u32 << order;
        let mut cells: Vec<_> = (0..side)
            .flat_map(|x| (0..side).map(move |y| (hilbert_index(order, x, y), x, y)))
            .collect();
        cells.sort_unstable();
        for (idx, window) in cells.windows(2).enumerate() {
            let ((_, x0, y0), (_, x1, y1)) = (window[0], window[1]);
            assert_eq!(window[0].0, idx as u64);
            assert_eq!(x0.abs_diff(x1) + y0.abs_diff(y1), 1);
        }
    }

    #[test]
    fn containing_triangle_is_found_for_interior_points() {
        let triangulation = Triangulation::new(&lattice(4, 4)).unwrap();
        let (_, weights) = triangulation
            .find_containing_triangle(&Point2::new(1.25, 2.5))
            .unwrap();
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(triangulation
            .find_containing_triangle(&Point2::new(3.5, 1.0))
            .is_none());
        assert!(triangulation
            .find_containing_triangle(&Point2::new(3.0, 3.0))
            .is_some());
    }

    #[test]
    fn degenerate_point_sets_are_rejected() {
        let colinear: Vec<_> = (0..5).map(|i| Point2::new(i as f64, 2.0 * i as f64)).collect();
        assert_eq!(
            Triangulation::new(&colinear).unwrap_err(),
            ScatteredInterpolationError::Colinear { count: 5 }
        );
        assert_eq!(
            Triangulation::new(&colinear[..2]).unwrap_err(),
            ScatteredInterpolationError::TooFewPoints { count: 2 }
        );
    }
}
