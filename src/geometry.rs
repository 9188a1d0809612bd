//! Geometric utility objects.

use crate::num::BFloat;
use std::{
    fmt,
    ops::{Index, IndexMut},
};

/// Denotes the x-, y- or z-dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dim3 {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Dim3 {
    /// Creates an array for iterating over the x-, y- and z-dimensions.
    pub fn slice() -> [Self; 3] {
        [Self::X, Self::Y, Self::Z]
    }

    /// Creates an array for iterating over the two dimensions perpendicular
    /// to the field line direction.
    pub fn slice_perpendicular() -> [Self; 2] {
        [Self::X, Self::Z]
    }

    /// Returns the number of the dimension.
    pub fn num(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Dim3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::X => "x",
                Self::Y => "y",
                Self::Z => "z",
            }
        )
    }
}

use Dim3::{X, Y, Z};

/// Denotes the first or second dimension of a 2D plane.
///
/// For planes perpendicular to y, `Dim2::X` corresponds to x and
/// `Dim2::Y` corresponds to z.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dim2 {
    X = 0,
    Y = 1,
}

impl Dim2 {
    /// Creates an array for iterating over the x- and y-dimensions.
    pub fn slice() -> [Self; 2] {
        [Self::X, Self::Y]
    }
}

/// Represents any quantity with three dimensional components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct In3D<T>([T; 3]);

impl<T> In3D<T> {
    /// Creates a new 3D quantity given the three components.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Creates a new 3D quantity by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> T,
    {
        Self::new(
            create_component(X),
            create_component(Y),
            create_component(Z),
        )
    }

    /// Creates a new 3D quantity with the given value copied into all components.
    pub fn same(a: T) -> Self
    where
        T: Copy,
    {
        Self([a, a, a])
    }

    /// Creates a new tuple containing copies of the three components.
    pub fn to_tuple(&self) -> (T, T, T)
    where
        T: Copy,
    {
        (self[X], self[Y], self[Z])
    }
}

impl<T> Index<Dim3> for In3D<T> {
    type Output = T;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<T> IndexMut<Dim3> for In3D<T> {
    fn index_mut(&mut self, dim: Dim3) -> &mut Self::Output {
        &mut self.0[dim as usize]
    }
}

impl<T: fmt::Display> fmt::Display for In3D<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        fmt::Display::fmt(&self[X], f)?;
        f.write_str(", ")?;
        fmt::Display::fmt(&self[Y], f)?;
        f.write_str(", ")?;
        fmt::Display::fmt(&self[Z], f)?;
        f.write_str("]")
    }
}

/// A 2D spatial coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point2<F>([F; 2]);

impl<F: BFloat> Point2<F> {
    /// Creates a new 2D point given the two components.
    pub fn new(x: F, y: F) -> Self {
        Self([x, y])
    }

    /// Whether both components are finite.
    pub fn is_finite(&self) -> bool {
        self.0[0].is_finite() && self.0[1].is_finite()
    }

    /// Returns a copy of the point shifted by the negative of the given offset.
    pub fn relative_to(&self, origin: &Self) -> Self {
        Self::new(self.0[0] - origin.0[0], self.0[1] - origin.0[1])
    }
}

impl<F: BFloat> Index<Dim2> for Point2<F> {
    type Output = F;
    fn index(&self, dim: Dim2) -> &Self::Output {
        &self.0[dim as usize]
    }
}

impl<F: BFloat> IndexMut<Dim2> for Point2<F> {
    fn index_mut(&mut self, dim: Dim2) -> &mut Self::Output {
        &mut self.0[dim as usize]
    }
}

/// Twice the signed area of the triangle (a, b, c).
///
/// Positive if the points are in counterclockwise order, negative if they are
/// clockwise and zero if they are colinear.
pub fn orientation<F: BFloat>(a: &Point2<F>, b: &Point2<F>, c: &Point2<F>) -> F {
    use Dim2::{X as U, Y as V};
    (b[U] - a[U]) * (c[V] - a[V]) - (b[V] - a[V]) * (c[U] - a[U])
}

/// Whether `p` lies strictly inside the circumcircle of the counterclockwise
/// triangle (a, b, c).
pub fn in_circumcircle<F: BFloat>(
    a: &Point2<F>,
    b: &Point2<F>,
    c: &Point2<F>,
    p: &Point2<F>,
) -> bool {
    use Dim2::{X as U, Y as V};

    let (adx, ady) = (a[U] - p[U], a[V] - p[V]);
    let (bdx, bdy) = (b[U] - p[U], b[V] - p[V]);
    let (cdx, cdy) = (c[U] - p[U], c[V] - p[V]);

    let det = (adx * adx + ady * ady) * (bdx * cdy - cdx * bdy)
        + (bdx * bdx + bdy * bdy) * (cdx * ady - adx * cdy)
        + (cdx * cdx + cdy * cdy) * (adx * bdy - bdx * ady);

    det > F::zero()
}
