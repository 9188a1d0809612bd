//! Utilities for creating the command line interface.

use crate::{exit_on_error, exit_on_false, io::Verbosity, num::BFloat};
use clap::ArgMatches;
use indicatif::ProgressStyle;
use lazy_static::lazy_static;
use std::str::FromStr;

lazy_static! {
    static ref DEFAULT_PROGRESS_STYLE: ProgressStyle =
        ProgressStyle::default_bar().template("Progress: {bar:40}  {percent}% | ETA: {eta}");
}

pub fn parse_value_string<T>(argument_name: &str, value_string: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    exit_on_error!(
        value_string.parse(),
        "Error: Could not parse value for {0}: {1}",
        argument_name
    )
}

fn verify_finite_float_value<F: BFloat>(argument_name: &str, value: F) {
    exit_on_false!(value.is_finite(), "Error: {} must be finite", argument_name);
}

pub fn get_value_from_required_parseable_argument<T>(
    arguments: &ArgMatches,
    argument_name: &str,
) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    parse_value_string(
        argument_name,
        arguments
            .value_of(argument_name)
            .expect("No value for required argument"),
    )
}

pub fn get_finite_float_value_from_required_parseable_argument<F>(
    arguments: &ArgMatches,
    argument_name: &str,
) -> F
where
    F: BFloat + FromStr,
    <F as FromStr>::Err: std::fmt::Display,
{
    let value: F = get_value_from_required_parseable_argument(arguments, argument_name);
    verify_finite_float_value(argument_name, value);
    value
}

pub fn parse_verbosity(arguments: &ArgMatches, support_progress: bool) -> Verbosity {
    if support_progress && arguments.is_present("progress") {
        Verbosity::Progress(DEFAULT_PROGRESS_STYLE.clone())
    } else if arguments.is_present("verbose") {
        Verbosity::Messages
    } else {
        Verbosity::Quiet
    }
}
