//! Command line interface for upscaling a field along field line maps.

use crate::{
    cli::utils as cli_utils,
    error::FciError,
    exit_on_error, exit_on_false, exit_with_error,
    interpolation::{
        cubic_hermite_spline::CubicHermiteSplineInterpolator, linear::LinearInterpolator,
        IndexInterpolator,
    },
    io::{self, OverwriteMode, Verbosity},
    maps::FieldLineMaps,
    upscaling::{FieldLineUpscaler, UpscalerConfig},
};
use clap::{Arg, ArgMatches, Command};
use ndarray::prelude::*;
use std::path::Path;

/// Builds a representation of the `upscale` command line subcommand.
pub fn create_upscale_subcommand(_parent_command_name: &'static str) -> Command<'static> {
    Command::new("upscale")
        .about("Increase the y-resolution of a field along field lines")
        .long_about(
            "Increase the y-resolution of a field along field lines.\n\
             The field is interpolated along the forward field line maps, and the resulting\n\
             samples are regridded onto each new y-slice with linear scattered interpolation.",
        )
        .arg(
            Arg::new("field-file")
                .value_name("FIELD_FILE")
                .help("Path of the .npy file containing the field to upscale")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("xt-prime")
                .long("xt-prime")
                .require_equals(true)
                .value_name("PATH")
                .help("Path of the .npy file containing the forward x-index map")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("zt-prime")
                .long("zt-prime")
                .require_equals(true)
                .value_name("PATH")
                .help("Path of the .npy file containing the forward z-index map")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("output-file")
                .short('o')
                .long("output")
                .require_equals(true)
                .value_name("PATH")
                .help("Path of the .npy file to write the upscaled field to")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("factor")
                .short('f')
                .long("factor")
                .require_equals(true)
                .value_name("NUMBER")
                .help("Number of new y-slices per original y-slice")
                .takes_value(true)
                .default_value("4"),
        )
        .arg(
            Arg::new("fill-value")
                .long("fill-value")
                .require_equals(true)
                .allow_hyphen_values(true)
                .value_name("VALUE")
                .help("Value for grid nodes outside the sampled region of their y-slice")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::new("interpolator")
                .long("interpolator")
                .require_equals(true)
                .value_name("NAME")
                .help("Interpolator for evaluating the field at field line end points")
                .takes_value(true)
                .possible_values(&["linear", "cubic"])
                .default_value("linear"),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Automatically overwrite any existing output file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print status messages"),
        )
        .arg(
            Arg::new("progress")
                .short('p')
                .long("progress")
                .help("Show progress bar for regridding (also implies `verbose`)"),
        )
}

/// Runs the actions for the `upscale` subcommand using the given arguments.
pub fn run_upscale_subcommand(arguments: &ArgMatches) {
    let verbosity = cli_utils::parse_verbosity(arguments, true);

    let overwrite_mode = if arguments.is_present("overwrite") {
        OverwriteMode::Always
    } else {
        OverwriteMode::Never
    };
    let output_file_path = Path::new(
        arguments
            .value_of("output-file")
            .expect("No value for required argument"),
    );
    exit_on_false!(
        output_file_path.extension().map_or(false, |ext| ext == "npy"),
        "Error: Output file must have extension .npy"
    );
    if !io::check_if_write_allowed(output_file_path, overwrite_mode) {
        return;
    }

    let config = UpscalerConfig {
        upscale_factor: cli_utils::get_value_from_required_parseable_argument(arguments, "factor"),
        fill_value: cli_utils::get_finite_float_value_from_required_parseable_argument(
            arguments,
            "fill-value",
        ),
    };
    exit_on_error!(config.validate(), "Error: {}");

    let field = read_input_array::<IxDyn>(arguments, "field-file");
    let xt_prime = read_input_array::<Ix3>(arguments, "xt-prime");
    let zt_prime = read_input_array::<Ix3>(arguments, "zt-prime");

    let maps = exit_on_error!(
        FieldLineMaps::new(xt_prime, zt_prime),
        "Error: Invalid field line maps: {}"
    );

    if verbosity.print_messages() {
        println!(
            "Upscaling field of shape {:?} with maps of shape {}",
            field.shape(),
            maps.shape()
        );
    }

    let upscaled_field = match arguments
        .value_of("interpolator")
        .expect("No value for argument with default")
    {
        "linear" => upscale_with_interpolator(
            config,
            LinearInterpolator::default(),
            &field,
            &maps,
            &verbosity,
        ),
        "cubic" => upscale_with_interpolator(
            config,
            CubicHermiteSplineInterpolator::default(),
            &field,
            &maps,
            &verbosity,
        ),
        name => exit_with_error!("Error: Invalid interpolator {}", name),
    };
    let upscaled_field = exit_on_error!(upscaled_field, "Error: Could not upscale field: {}");

    exit_on_error!(
        io::write_array(output_file_path, &upscaled_field),
        "Error: Could not write upscaled field: {}"
    );

    if verbosity.print_messages() {
        println!(
            "Wrote upscaled field of shape {:?} to {}",
            upscaled_field.shape(),
            output_file_path.display()
        );
    }
}

fn upscale_with_interpolator<I: IndexInterpolator>(
    config: UpscalerConfig,
    interpolator: I,
    field: &ArrayD<f64>,
    maps: &FieldLineMaps<f64>,
    verbosity: &Verbosity,
) -> Result<Array3<f64>, FciError> {
    FieldLineUpscaler::new(config, interpolator).upscale_field(field.view(), maps, verbosity)
}

fn read_input_array<D: Dimension>(arguments: &ArgMatches, argument_name: &str) -> Array<f64, D> {
    let file_path = Path::new(
        arguments
            .value_of(argument_name)
            .expect("No value for required argument"),
    );
    exit_on_error!(
        io::read_array(file_path),
        "Error: Could not read input array: {}"
    )
}
