//! Function for running the command line program.

use super::{build, upscale::run_upscale_subcommand};
use std::{ffi::OsString, time::Instant};

/// Runs the `fcimaps` command line program.
pub fn run() {
    run_with_args(std::env::args_os());
}

/// Runs the `fcimaps` command line program with the given arguments, where
/// the first argument is the program name.
pub fn run_with_args<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let arguments = build::build().get_matches_from(args);

    let start_instant = Instant::now();

    if let Some(upscale_arguments) = arguments.subcommand_matches("upscale") {
        run_upscale_subcommand(upscale_arguments);
    }

    if arguments.is_present("timing") {
        println!("Elapsed time: {} s", start_instant.elapsed().as_secs_f64());
    }
}
