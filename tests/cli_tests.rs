#![cfg(feature = "cli")]

mod common;

use common::{assert_arrays_close, assert_file_exists, run, shifted_maps, wavy_field};
use fcimaps::{geometry::In3D, io::Verbosity, upscaling::upscale};
use ndarray::prelude::*;
use ndarray_npy::{read_npy, write_npy};
use std::iter;

def_test!(
FILES[
    field = "field.npy",
    xt_prime = "xt_prime.npy",
    zt_prime = "zt_prime.npy",
    output = "upscaled.npy"
]
fn upscale_subcommand_matches_library {
    let shape = In3D::new(5, 4, 6);
    let field_values = wavy_field(shape);
    let maps = shifted_maps(shape, 0.3, -0.2);
    write_npy(field, &field_values).unwrap();
    write_npy(xt_prime, maps.forward_xt_prime()).unwrap();
    write_npy(zt_prime, maps.forward_zt_prime()).unwrap();

    let xt_prime_arg = format!("--xt-prime={}", path_str!(xt_prime));
    let zt_prime_arg = format!("--zt-prime={}", path_str!(zt_prime));
    let output_arg = format!("--output={}", path_str!(output));
    run([
        "upscale",
        path_str!(field),
        xt_prime_arg.as_str(),
        zt_prime_arg.as_str(),
        "--factor=3",
        output_arg.as_str(),
    ]);
    assert_file_exists(output);

    let upscaled: Array3<f64> = read_npy(output).unwrap();
    let expected = upscale(field_values.view(), &maps, 3, &Verbosity::Quiet).unwrap();
    assert_arrays_close(&upscaled, &expected, 0.0);
});

def_test!(
FILES[
    field = "field.npy",
    xt_prime = "xt_prime.npy",
    zt_prime = "zt_prime.npy",
    output = "upscaled.npy"
]
fn existing_output_is_kept_without_overwrite_flag {
    let shape = In3D::new(4, 3, 4);
    let maps = shifted_maps(shape, 0.0, 0.0);
    write_npy(field, &wavy_field(shape)).unwrap();
    write_npy(xt_prime, maps.forward_xt_prime()).unwrap();
    write_npy(zt_prime, maps.forward_zt_prime()).unwrap();

    let placeholder = Array1::<f64>::zeros(2);
    write_npy(output, &placeholder).unwrap();

    let xt_prime_arg = format!("--xt-prime={}", path_str!(xt_prime));
    let zt_prime_arg = format!("--zt-prime={}", path_str!(zt_prime));
    let output_arg = format!("--output={}", path_str!(output));
    let field_arg = field.to_string_lossy().into_owned();
    let args = [
        "upscale",
        field_arg.as_str(),
        xt_prime_arg.as_str(),
        zt_prime_arg.as_str(),
        "--factor=2",
        "--interpolator=cubic",
        output_arg.as_str(),
    ];
    run(args);
    let kept: Array1<f64> = read_npy(output).unwrap();
    assert_eq!(kept, placeholder);

    run(args.iter().copied().chain(iter::once("--overwrite")));
    let upscaled: Array3<f64> = read_npy(output).unwrap();
    assert_eq!(upscaled.dim(), (4, 6, 4));
});

def_test!(
FILES[
    field = "field.npy",
    xt_prime = "xt_prime.npy",
    zt_prime = "zt_prime.npy",
    output = "nested/dir/upscaled.npy"
]
fn transposed_field_file_is_accepted {
    let shape = In3D::new(3, 4, 5);
    let field_values = wavy_field(shape);
    let maps = shifted_maps(shape, 0.0, 0.5);
    write_npy(field, &field_values.t().as_standard_layout().into_owned()).unwrap();
    write_npy(xt_prime, maps.forward_xt_prime()).unwrap();
    write_npy(zt_prime, maps.forward_zt_prime()).unwrap();

    let xt_prime_arg = format!("--xt-prime={}", path_str!(xt_prime));
    let zt_prime_arg = format!("--zt-prime={}", path_str!(zt_prime));
    let output_arg = format!("--output={}", path_str!(output));
    run([
        "upscale",
        path_str!(field),
        xt_prime_arg.as_str(),
        zt_prime_arg.as_str(),
        "--factor=2",
        "--fill-value=-1",
        output_arg.as_str(),
    ]);

    let upscaled: Array3<f64> = read_npy(output).unwrap();
    assert_eq!(upscaled.dim(), (3, 8, 5));
    assert_arrays_close(
        &upscaled.slice(s![.., 0..;2, ..]).to_owned(),
        &field_values,
        1e-12,
    );
});
