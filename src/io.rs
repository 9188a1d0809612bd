//! File input/output and status reporting.

use indicatif::{ProgressBar, ProgressStyle};

#[cfg(feature = "cli")]
use crate::num::BFloat;
#[cfg(feature = "cli")]
use ndarray::{Array, Dimension};
#[cfg(feature = "cli")]
use std::{fs, io, path::Path};

/// How much to report about the progress of an operation.
#[derive(Clone, Debug)]
pub enum Verbosity {
    Quiet,
    Messages,
    Progress(ProgressStyle),
}

impl Verbosity {
    /// Whether non-critical status messages should be printed.
    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Creates a progress bar with the given number of steps, hidden
    /// unless progress was requested.
    pub fn create_progress_bar(&self, size: usize) -> ProgressBar {
        match self {
            Self::Progress(style) => ProgressBar::new(size as u64).with_style(style.clone()),
            _ => ProgressBar::hidden(),
        }
    }
}

/// Whether and how to handle overwriting of existing files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverwriteMode {
    Always,
    Never,
}

/// Checks whether the file at the given path may be written.
///
/// Returns `false` and prints a message if the file exists and overwriting is not allowed.
#[cfg(feature = "cli")]
pub fn check_if_write_allowed(file_path: &Path, overwrite_mode: OverwriteMode) -> bool {
    if file_path.exists() && overwrite_mode == OverwriteMode::Never {
        eprintln!(
            "Warning: Did not write {} because it already exists (use --overwrite to overwrite)",
            file_path.display()
        );
        false
    } else {
        true
    }
}

/// Reads an array of the given dimensionality from a `.npy` file.
#[cfg(feature = "cli")]
pub fn read_array<F, D>(file_path: &Path) -> io::Result<Array<F, D>>
where
    F: BFloat + ndarray_npy::ReadableElement,
    D: Dimension,
{
    ndarray_npy::read_npy(file_path).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Could not read {}: {}", file_path.display(), err),
        )
    })
}

/// Writes the given array to a `.npy` file, creating parent directories if required.
#[cfg(feature = "cli")]
pub fn write_array<F, D>(file_path: &Path, values: &Array<F, D>) -> io::Result<()>
where
    F: BFloat + ndarray_npy::WritableElement,
    D: Dimension,
{
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    ndarray_npy::write_npy(file_path, values).map_err(|err| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Could not write {}: {}", file_path.display(), err),
        )
    })
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn progress_bar_is_only_visible_when_requested() {
        assert!(!Verbosity::Quiet.print_messages());
        assert!(Verbosity::Quiet.create_progress_bar(10).is_hidden());
        assert!(Verbosity::Messages.print_messages());
        assert!(Verbosity::Messages.create_progress_bar(10).is_hidden());

        let progress = Verbosity::Progress(ProgressStyle::default_bar());
        assert!(progress.print_messages());
        assert_eq!(progress.create_progress_bar(10).length(), 10);
    }
}
