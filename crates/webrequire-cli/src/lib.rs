//! webrequire CLI - packs `require()`-style JavaScript for the browser.
//!
//! This crate provides the `webrequire` binary on top of
//! [`webrequire_bundler`]:
//!
//! - `webrequire build` links a set of source files, partitions them into
//!   packs and writes the packs, their source maps and the mapping artifact.
//! - `webrequire tags` reads a mapping artifact and prints the `<script>` tags
//!   a page needs for its entry files.
//!
//! # Architecture
//!
//! - [`error`] - Error types with actionable hints
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Terminal status messages
//! - `commands` - Command implementations
//! - `config` - Layered configuration (defaults, file, environment, flags)
//!
//! # Example
//!
//! ```rust
//! use webrequire_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, ResultExt};
