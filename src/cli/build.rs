//! Function for building the command line hierarchy.

use super::upscale::create_upscale_subcommand;
use clap::{self, Arg, Command};

/// Build the `fcimaps` command line hierarchy.
pub fn build() -> Command<'static> {
    let command_name = clap::crate_name!();
    Command::new(command_name)
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("timing")
                .short('t')
                .long("timing")
                .help("Display elapsed time when done"),
        )
        .subcommand(create_upscale_subcommand(command_name))
}
