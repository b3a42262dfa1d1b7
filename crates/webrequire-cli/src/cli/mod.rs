//! Command-line interface definition.
//!
//! - `webrequire build` - Pack source files for the browser
//! - `webrequire tags` - Print the script tags for entry files

mod commands;

use clap::Parser;

pub use commands::{BuildArgs, Command, NamingArg, MinifyArg, TagsArgs};

/// webrequire - require() for the browser, without a single bundle
#[derive(Parser, Debug)]
#[command(
    name = "webrequire",
    version,
    about = "Pack require()-style JavaScript for the browser",
    long_about = "webrequire analyzes the require() calls of your sources, partitions them into\n\
                  packs so that no file is shipped twice, and tells you which <script> tags\n\
                  each page needs."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
