use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Available webrequire subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pack source files for the browser
    ///
    /// Reads every given file (directories are searched for .js files),
    /// links their require() calls and writes packs, source maps and the
    /// mapping file to the output directory.
    Build(BuildArgs),

    /// Print the script tags a page needs
    ///
    /// Reads the mapping file written by `build` and prints the inline
    /// bootstrap snippet followed by one <script> tag per required pack.
    Tags(TagsArgs),
}

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Source files or directories
    ///
    /// Examples:
    ///   webrequire build src
    ///   webrequire build src/app.js src/lib --base src
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Root of the output namespace; every source must live below it
    #[arg(short, long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Directory packs are written to [default: dist]
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Directory external packages are emitted to [default: module]
    #[arg(long, value_name = "DIR")]
    pub modules_dir: Option<String>,

    /// Give a file its own pack even if another file requires it
    ///
    /// Paths are relative to --base. Can be repeated.
    #[arg(short, long, value_name = "FILE")]
    pub entry: Vec<String>,

    /// Emit one pack per file instead of computing shared packs
    #[arg(long)]
    pub no_smart_packing: bool,

    /// How packs are named
    #[arg(long, value_enum)]
    pub naming: Option<NamingArg>,

    /// Do not emit source maps
    #[arg(long)]
    pub no_sourcemap: bool,

    /// Minify the runtime loader
    #[arg(long, value_enum)]
    pub minify_runtime: Option<MinifyArg>,

    /// Name of the mapping file inside the output directory [default: mappings.json]
    #[arg(long, value_name = "NAME")]
    pub mappings_file: Option<String>,

    /// Replace files already present in the output directory
    #[arg(short, long)]
    pub force: bool,

    /// Path to a config file [default: webrequire.config.json]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the tags command
#[derive(Args, Debug)]
pub struct TagsArgs {
    /// Entry files, relative to the base directory of the build
    #[arg(required = true, value_name = "ENTRIES")]
    pub entries: Vec<String>,

    /// Mapping file written by `build` [default: dist/mappings.json]
    #[arg(short, long, value_name = "FILE")]
    pub mappings: Option<PathBuf>,

    /// String put in front of every pack path [default: /]
    ///
    /// By default URLs look like "/0.js". With a prefix of
    /// "https://example.com/static" they become "https://example.com/static/0.js".
    #[arg(long)]
    pub prefix: Option<String>,

    /// String appended to every URL, e.g. "?v=3"
    #[arg(long)]
    pub suffix: Option<String>,

    /// Hide the message printed before the tags
    #[arg(long)]
    pub no_hint: bool,

    /// Leave out the inline bootstrap snippet
    #[arg(long)]
    pub no_snippet: bool,

    /// Custom tag; {src} is replaced by the pack URL
    ///
    /// Example: '<script src="{src}" defer></script>'
    #[arg(long, value_name = "TEMPLATE")]
    pub tag_template: Option<String>,
}

/// Pack naming scheme
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum NamingArg {
    /// 0.js, 1.js, ...
    Position,
    /// First 16 hex characters of the content hash
    ContentHash,
}

/// Runtime loader minification
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum MinifyArg {
    None,
    Whitespace,
    Full,
}

impl From<NamingArg> for webrequire_bundler::PackNaming {
    fn from(arg: NamingArg) -> Self {
        match arg {
            NamingArg::Position => Self::Position,
            NamingArg::ContentHash => Self::ContentHash,
        }
    }
}

impl From<MinifyArg> for webrequire_bundler::MinifyLevel {
    fn from(arg: MinifyArg) -> Self {
        match arg {
            MinifyArg::None => Self::None,
            MinifyArg::Whitespace => Self::Whitespace,
            MinifyArg::Full => Self::Full,
        }
    }
}
