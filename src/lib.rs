//! The `fcimaps` crate provides tools for working with field line maps of
//! flux-coordinate independent grids, most importantly upscaling of fields
//! in the direction along the magnetic field.

pub mod error;
pub mod field;
pub mod geometry;
pub mod grid;
pub mod interpolation;
pub mod io;
pub mod maps;
pub mod num;
pub mod scattered;
pub mod surfaces;
pub mod upscaling;

#[cfg(feature = "cli")]
pub mod cli;
