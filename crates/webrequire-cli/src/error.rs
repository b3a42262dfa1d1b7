//! Error types for the webrequire CLI.
//!
//! - [`CliError`] is what every command returns
//! - [`ConfigError`] and [`BuildError`] carry the details and a hint
//! - bundler errors are kept as-is so their diagnostic codes survive
//!
//! ```rust,no_run
//! use webrequire_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_mapping(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Run 'webrequire build' first")
//! }
//! ```

mod miette;

pub use self::miette::{bundler_error_to_miette, cli_error_to_miette};

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Errors from the bundler, including graph errors.
    #[error(transparent)]
    Bundler(#[from] webrequire_bundler::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicit `--config` path does not exist
    #[error("Config file not found: {}\n\nHint: Create a webrequire.config.json file or fix the --config path", .0.display())]
    NotFound(PathBuf),

    /// Missing required configuration field
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// How to provide it
        hint: String,
    },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field
        field: String,
        /// The rejected value
        value: String,
        /// Accepted values
        hint: String,
    },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Build process errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A source path given on the command line does not exist
    #[error("Source not found: {}\n\nHint: Pass existing files or directories below --base", .0.display())]
    SourceNotFound(PathBuf),

    /// Nothing to build
    #[error("No JavaScript sources found in {}\n\nHint: Only .js files are collected from directories", .0.display())]
    NoSources(PathBuf),

    /// The output directory would end up inside the sources
    #[error("Output directory {} is the base directory\n\nHint: Pick a separate --out-dir", .0.display())]
    OutputIsBase(PathBuf),

    /// Generic build error
    #[error("{0}")]
    Custom(String),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_not_found() {
        let err = ConfigError::NotFound(PathBuf::from("webrequire.config.json"));
        let msg = err.to_string();
        assert!(msg.contains("Config file not found"));
        assert!(msg.contains("webrequire.config.json"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "packNaming".to_string(),
            value: "random".to_string(),
            hint: "Use position or content-hash".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid value for 'packNaming': random"));
        assert!(msg.contains("Hint: Use position"));
    }

    #[test]
    fn test_build_error_source_not_found() {
        let err = BuildError::SourceNotFound(PathBuf::from("src/app.js"));
        let msg = err.to_string();
        assert!(msg.contains("Source not found"));
        assert!(msg.contains("src/app.js"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn test_cli_error_from_bundler_error_keeps_message() {
        let err: CliError = webrequire_bundler::Error::UnresolvedEntryFile("app.js".into()).into();
        assert!(matches!(err, CliError::Bundler(_)));
        assert_eq!(err.to_string(), "Unresolved entry file: app.js");
    }

    #[test]
    fn test_cli_error_from_config_error() {
        let cli_err: CliError = ConfigError::NotFound(PathBuf::from("test.json")).into();
        assert!(matches!(cli_err, CliError::Config(_)));
    }

    #[test]
    fn test_result_ext_with_path() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let err = result.with_path("/test/mappings.json").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[test]
    fn test_result_ext_with_path_keeps_other_errors() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));

        let err = result.with_path("/test/mappings.json").unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_result_ext_with_hint() {
        let result: std::result::Result<(), BuildError> =
            Err(BuildError::Custom("no packs".to_string()));

        let err = result.with_hint("Check the file list").unwrap_err();
        assert!(err.to_string().contains("Hint: Check the file list"));
    }

    #[test]
    fn test_result_ext_context() {
        let result: std::result::Result<(), ConfigError> =
            Err(ConfigError::NotFound(PathBuf::from("test.json")));

        let err = result.context("Failed to load").unwrap_err();
        assert!(err.to_string().starts_with("Failed to load: "));
    }
}
