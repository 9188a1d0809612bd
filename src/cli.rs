//! Command line interface.

pub mod build;
pub mod run;
pub mod upscale;
pub mod utils;
