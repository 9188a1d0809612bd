//! Error types and error reporting macros.

use crate::{interpolation::MapCoordinatesError, scattered::ScatteredInterpolationError};
use thiserror::Error;

/// Errors that can occur while constructing maps or upscaling fields.
#[derive(Debug, Error)]
pub enum FciError {
    #[error("Field shape {field:?} is incompatible with grid shape {grid:?}")]
    ShapeMismatch { field: Vec<usize>, grid: Vec<usize> },

    #[error("Interpolation onto y-slice {slice} failed: {source}")]
    InterpolationFailure {
        slice: usize,
        #[source]
        source: ScatteredInterpolationError,
    },

    #[error("Interpolation at field line end points failed: {0}")]
    EndpointInterpolation(#[from] MapCoordinatesError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Field line tracing failed: {0}")]
    Tracing(String),
}

#[cfg(not(feature = "for-testing"))]
#[macro_export]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        eprintln!($($print_arg)*);
        quit::with_code(1);
    }};
}

#[cfg(feature = "for-testing")]
#[macro_export]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        panic!($($print_arg)*);
    }};
}

#[macro_export]
macro_rules! exit_on_error {
    ($result:expr, $($print_arg:tt)*) => {
        match $result {
            Ok(value) => value,
            Err(err) => {
                $crate::exit_with_error!($($print_arg)*, err)
            }
        }
    };
}

#[macro_export]
macro_rules! exit_on_false {
    ($logic:expr, $($print_arg:tt)*) => {
        if $logic {
            true
        } else {
            $crate::exit_with_error!($($print_arg)*)
        }
    };
}
