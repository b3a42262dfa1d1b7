//! Error types for graph construction.

use std::path::PathBuf;

use crate::file_id::{FileId, FileIdError};
use crate::runtime::RuntimeError;

/// Errors raised while scanning, resolving or linking files.
///
/// Every variant is fatal to the operation that produced it. A graph update
/// that fails leaves the graph exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An absolute path (or an empty string) was used as a specifier.
    #[error("Invalid specifier '{specifier}' in '{origin}': absolute paths are not allowed")]
    InvalidSpecifier { specifier: String, origin: PathBuf },

    /// A module form other than `require("...")` was found.
    #[error("Unsupported syntax in '{origin}' at offset {offset}: {form} is not supported, use require()")]
    UnsupportedSyntax {
        form: &'static str,
        origin: PathBuf,
        offset: u32,
    },

    /// A resolved path escapes the base directory.
    #[error("'{path}' is outside of the base directory '{base}'")]
    OutsideBase { path: PathBuf, base: PathBuf },

    /// A specifier resolves back to the file that contains it, or to itself.
    #[error("'{specifier}' in '{origin}' refers to itself and cannot be imported")]
    SelfReference { specifier: String, origin: PathBuf },

    /// An external module declares requirements of its own.
    #[error("External module '{id}' requires '{specifier}': external modules are not allowed to require other modules")]
    NestedExternalRequire { id: FileId, specifier: String },

    /// A requirement could not be linked to a known file at build time.
    #[error("Cannot find '{specifier}' required in '{from}'. Make sure all files are passed to the build")]
    UnresolvedRequirement { from: FileId, specifier: String },

    /// An explicitly declared entry point is not part of the graph.
    #[error("Entry point '{0}' is not part of the graph")]
    UnknownEntry(FileId),

    /// A source file tried to take the identity of the module loader.
    #[error("'{0}' is reserved for the module loader")]
    ReservedIdentity(FileId),

    /// The source text could not be parsed.
    #[error("Failed to parse '{origin}': {message}")]
    Parse { origin: PathBuf, message: String },

    /// A file identity could not be derived from a path.
    #[error(transparent)]
    FileId(#[from] FileIdError),

    /// The platform runtime failed (I/O or package resolution).
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A source map attached to a file could not be read.
    #[error("Invalid source map for '{origin}': {message}")]
    SourceMap { origin: PathBuf, message: String },

    /// An internal consistency check failed.
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;
