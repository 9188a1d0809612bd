#![allow(dead_code)]

use fcimaps::{geometry::In3D, maps::FieldLineMaps};
use ndarray::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[cfg(feature = "cli")]
use std::{ffi::OsString, iter};

#[macro_export]
macro_rules! def_test {
    (
        FILES[$($file_ident:ident = $file_str:expr),*]
        fn $name:ident $test_body:expr
    ) => {
        #[test]
        fn $name() {
            let test = common::Test::new();

            $( let $file_ident = test.path($file_str); )*

            let test_body = |$( $file_ident: &std::path::Path, )*| $test_body;

            test_body($( $file_ident.as_path(), )*);
        }
    };
}

#[macro_export]
macro_rules! path_str {
    ($path:expr) => {
        $path.to_string_lossy().as_ref()
    };
}

#[cfg(feature = "cli")]
pub fn run<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    fcimaps::cli::run::run_with_args(
        iter::once(OsString::from("fcimaps")).chain(args.into_iter().map(Into::into)),
    );
}

pub fn assert_file_exists<P: AsRef<Path>>(file_path: P) {
    let file_path = file_path.as_ref();
    assert!(
        file_path.exists(),
        "File {} does not exist",
        file_path.to_string_lossy()
    );
}

pub fn assert_arrays_close<D: Dimension>(
    actual: &Array<f64, D>,
    expected: &Array<f64, D>,
    epsilon: f64,
) {
    assert_eq!(actual.shape(), expected.shape(), "Array shapes differ");
    for ((idx, &a), &e) in actual.indexed_iter().zip(expected.iter()) {
        assert!(
            (a - e).abs() <= epsilon,
            "Arrays differ at {:?}: {} != {}",
            idx,
            a,
            e
        );
    }
}

/// Maps for field lines that are shifted by the given number of cells in x
/// and z over each y-step.
pub fn shifted_maps(shape: In3D<usize>, x_shift: f64, z_shift: f64) -> FieldLineMaps<f64> {
    let shape = shape.to_tuple();
    FieldLineMaps::new(
        Array3::from_shape_fn(shape, |(i, _, _)| i as f64 + x_shift),
        Array3::from_shape_fn(shape, |(_, _, k)| k as f64 + z_shift),
    )
    .unwrap()
}

/// A smooth but otherwise arbitrary test field.
pub fn wavy_field(shape: In3D<usize>) -> Array3<f64> {
    Array3::from_shape_fn(shape.to_tuple(), |(i, j, k)| {
        (0.7 * i as f64).sin() + (1.3 * j as f64).cos() * (0.4 * k as f64 + 0.1).sqrt()
    })
}

pub struct Test {
    output_dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let output_dir = tempfile::tempdir().expect("Could not create temporary directory");
        Self { output_dir }
    }

    pub fn path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.output_dir.path().join(file_name.as_ref())
    }
}
