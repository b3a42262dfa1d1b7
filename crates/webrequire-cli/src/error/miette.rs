//! Conversion of CLI errors into miette reports.

use crate::error::CliError;
use miette::Report;

/// Convert a [`CliError`] into a report for `main`.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Bundler(e) => bundler_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::Build(e) => miette::miette!("Build error: {}", e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert a bundler error, keeping its diagnostic code and help text.
pub fn bundler_error_to_miette(err: webrequire_bundler::Error) -> Report {
    Report::new(err)
}
