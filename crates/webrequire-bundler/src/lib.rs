//! # webrequire-bundler
//!
//! Turns a [`webrequire_graph::DependencyGraph`] into browser-ready packs.
//!
//! A build links the graph, partitions it into packs so that no file is
//! emitted twice, wraps every file in a `registerModule` call, concatenates
//! the wrapped files of each pack together with their source maps and
//! records which packs each file needs (the mapping artifact). At page
//! generation time a [`TagGenerator`] turns that mapping into `<script>` tags.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use webrequire_bundler::{NativeRuntime, Project, ProjectOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut options = ProjectOptions::new("./src");
//! options.entries = vec!["app.js".into()];
//!
//! let project = Project::new(options, Arc::new(NativeRuntime::new()))?;
//! project.add_path("./src/app.js").await?;
//! project.add_path("./src/lib/util.js").await?;
//!
//! let output = project.build()?;
//! output.write_to("dist", "mappings.json", true)?;
//! # Ok(()) }
//! ```
//!
//! ### Script tags for a page
//!
//! ```no_run
//! use webrequire_bundler::{MappingArtifact, TagGenerator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mapping = MappingArtifact::from_json(&std::fs::read_to_string("dist/mappings.json")?)?;
//! let tags = TagGenerator::new().prefix("/static").generate(&mapping, &["app.js"])?;
//! println!("{tags}");
//! # Ok(()) }
//! ```

// Re-export the graph crate
pub use webrequire_graph::*;
pub use webrequire_graph::Error as GraphError;

pub mod assets;
pub mod concat;
pub mod mapping;
pub mod minify;
pub mod options;
pub mod output;
pub mod packer;
pub mod project;
pub mod registry;
pub mod tags;
pub mod wrapper;

pub use concat::{ConcatPart, ConcatResult, concat};
pub use mapping::MappingArtifact;
pub use minify::MinifyLevel;
pub use options::{PackNaming, ProjectOptions};
pub use output::{BuildOutput, PackArtifact};
pub use packer::{Pack, PackPlan, plan};
pub use project::Project;
pub use registry::{LocalRequire, ModuleBody, ModuleRegistry, Registration};
pub use tags::{DefaultTag, TagFormatter, TagGenerator, TemplateTag};

/// Error types for webrequire-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the dependency graph.
    #[error(transparent)]
    Graph(#[from] webrequire_graph::Error),

    /// An entry handed to the tag generator is missing from the mapping.
    #[error("Unresolved entry file: {0}")]
    UnresolvedEntryFile(String),

    /// A tag formatter produced no tag.
    #[error("Tag generator returned no tag for '{0}'")]
    InvalidTagGeneratorResult(String),

    /// A source map could not be merged or serialized.
    #[error("Source map error: {0}")]
    SourceMap(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A JSON artifact could not be read or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// Output file already exists and overwrite is disabled.
    #[error("Output exists: {0}")]
    OutputExists(String),
}

/// Result type alias for webrequire-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Graph(inner) => graph_error_code(inner),
            Error::UnresolvedEntryFile(_) => "UNRESOLVED_ENTRY_FILE",
            Error::InvalidTagGeneratorResult(_) => "INVALID_TAG_GENERATOR_RESULT",
            Error::SourceMap(_) => "SOURCE_MAP_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            Error::WriteFailure(_) => "WRITE_FAILURE",
            Error::OutputExists(_) => "OUTPUT_EXISTS",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Graph(webrequire_graph::Error::UnsupportedSyntax { .. }) => Some(Box::new(
                "Only synchronous require(\"...\") calls are understood. Replace import/export with require() and module.exports.",
            )),
            Error::Graph(webrequire_graph::Error::UnresolvedRequirement { .. }) => Some(Box::new(
                "Every required file must be passed to the build. Check the file list and the spelling of the specifier.",
            )),
            Error::Graph(webrequire_graph::Error::NestedExternalRequire { .. }) => Some(Box::new(
                "Modules from node_modules are emitted as-is and must not require anything. Use a prebuilt browser distribution of the package.",
            )),
            Error::Graph(webrequire_graph::Error::OutsideBase { .. }) => Some(Box::new(
                "All sources must live under the base directory. Pass a wider --base.",
            )),
            Error::UnresolvedEntryFile(entry) => Some(Box::new(format!(
                "'{}' does not appear in the mappings file. Was it part of the last build?",
                entry
            ))),
            Error::InvalidTagGeneratorResult(_) => Some(Box::new(
                "A custom tag template must contain the {src} placeholder.",
            )),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your configuration file for syntax errors.\nError: {}",
                msg
            ))),
            Error::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it doesn't contain '..' components.",
                path
            ))),
            Error::WriteFailure(msg) => Some(Box::new(format!(
                "Failed to write file. Check disk space and permissions.\nError: {}",
                msg
            ))),
            Error::OutputExists(msg) => Some(Box::new(format!(
                "Output file already exists: {}\nUse --force to replace existing files.",
                msg
            ))),
            _ => None,
        }
    }
}

fn graph_error_code(error: &webrequire_graph::Error) -> &'static str {
    use webrequire_graph::Error as G;
    match error {
        G::InvalidSpecifier { .. } => "INVALID_SPECIFIER",
        G::UnsupportedSyntax { .. } => "UNSUPPORTED_SYNTAX",
        G::OutsideBase { .. } => "OUTSIDE_BASE",
        G::SelfReference { .. } => "SELF_REFERENCE",
        G::NestedExternalRequire { .. } => "NESTED_EXTERNAL_REQUIRE",
        G::UnresolvedRequirement { .. } => "UNRESOLVED_REQUIREMENT",
        G::UnknownEntry(_) => "UNKNOWN_ENTRY",
        G::ReservedIdentity(_) => "RESERVED_IDENTITY",
        G::Parse { .. } => "PARSE_ERROR",
        G::FileId(_) => "INVALID_PATH",
        G::Runtime(_) => "RUNTIME_ERROR",
        G::SourceMap { .. } => "SOURCE_MAP_ERROR",
        G::InternalInvariant(_) => "INTERNAL_ERROR",
    }
}

#[cfg(test)]
mod tests;
