//! Native Runtime Implementation
//!
//! Reads go through `tokio::task::spawn_blocking` so large files never stall
//! the executor. Bare specifiers are resolved with `oxc_resolver`, preferring
//! each package's `browser` entry over `main`.
//!
//! ```text
//! ┌─────────────────┐
//! │ NativeRuntime   │
//! │  .read_file()   │────▶ std::fs::read()   (blocking pool)
//! │  .exists()      │────▶ Path::exists()
//! │  .resolve()     │────▶ oxc_resolver::Resolver
//! └─────────────────┘
//! ```

use async_trait::async_trait;
use oxc_resolver::{ResolveError, ResolveOptions, Resolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

use super::{Runtime, RuntimeError, RuntimeResult};

/// Filesystem-backed [`Runtime`].
#[derive(Clone)]
pub struct NativeRuntime {
    resolver: Arc<Resolver>,
}

impl std::fmt::Debug for NativeRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeRuntime").finish_non_exhaustive()
    }
}

impl NativeRuntime {
    /// Create a runtime with browser-oriented resolution options.
    pub fn new() -> Self {
        Self::with_options(Self::browser_resolve_options())
    }

    /// Create a runtime with custom resolution options.
    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            resolver: Arc::new(Resolver::new(options)),
        }
    }

    /// Resolution options used by [`NativeRuntime::new`].
    ///
    /// Packages are looked up through `node_modules`, honouring the `browser`
    /// field (both as main field and as alias map) before `main`.
    pub fn browser_resolve_options() -> ResolveOptions {
        ResolveOptions {
            extensions: vec![".js".into(), ".json".into()],
            main_fields: vec!["browser".into(), "main".into()],
            alias_fields: vec![vec!["browser".into()]],
            condition_names: vec!["browser".into(), "require".into(), "default".into()],
            builtin_modules: true,
            ..ResolveOptions::default()
        }
    }
}

impl Default for NativeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = path.to_path_buf();

        task::spawn_blocking(move || {
            std::fs::read(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RuntimeError::FileNotFound(path.clone())
                } else {
                    RuntimeError::Io(format!("Failed to read {}: {}", path.display(), e))
                }
            })
        })
        .await
        .map_err(|e| RuntimeError::Other(format!("Task join error: {}", e)))?
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn resolve(&self, specifier: &str, from: &Path) -> RuntimeResult<PathBuf> {
        let directory = from.parent().unwrap_or(from);

        match self.resolver.resolve(directory, specifier) {
            Ok(resolution) => Ok(resolution.into_path_buf()),
            // Built-ins such as `fs` have no file to bundle.
            Err(ResolveError::Builtin { .. }) => Ok(PathBuf::from(specifier)),
            Err(e) => Err(RuntimeError::ResolutionFailed {
                specifier: specifier.to_string(),
                from: from.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}
