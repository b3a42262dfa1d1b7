//! Platform runtime abstraction.
//!
//! The graph never touches the filesystem directly. Reading source text and
//! looking up bare specifiers in `node_modules` go through the `Runtime`
//! trait, so the same graph code runs against the real filesystem
//! ([`native::NativeRuntime`]) or an in-memory file table in tests.

pub mod native;

// Test utilities (available in test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Module resolution failed
    #[error("Failed to resolve module '{specifier}' from '{from}': {reason}")]
    ResolutionFailed {
        specifier: String,
        from: PathBuf,
        reason: String,
    },

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// Platform runtime trait
///
/// Implementations provide file reads and the host's package resolution
/// convention. `resolve` is only ever called with bare specifiers; relative
/// specifiers are resolved by the graph itself.
///
/// # Example
///
/// ```rust,ignore
/// use webrequire_graph::{Runtime, RuntimeError, RuntimeResult};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct MyRuntime;
///
/// #[async_trait]
/// impl Runtime for MyRuntime {
///     async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
///         std::fs::read(path).map_err(|e| RuntimeError::Io(e.to_string()))
///     }
///
///     // ... implement other methods
/// }
/// ```
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file.
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read a file as UTF-8 text.
    async fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes)
            .map_err(|e| RuntimeError::Io(format!("{} is not valid UTF-8: {}", path.display(), e)))
    }

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Resolve a bare specifier as seen from the file `from`.
    ///
    /// Returns the absolute path of the file the package resolution lands on.
    /// Built-in modules that have no file resolve to the specifier itself.
    fn resolve(&self, specifier: &str, from: &Path) -> RuntimeResult<PathBuf>;
}
