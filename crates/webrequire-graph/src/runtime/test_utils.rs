//! Test utilities for webrequire-graph.
//!
//! `TestRuntime` is an in-memory file table. It resolves bare specifiers the
//! way a minimal `node_modules` lookup would and counts reads per path, which
//! lets tests assert that external modules are fetched only once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;

use super::{Runtime, RuntimeError, RuntimeResult};

/// In-memory runtime for tests.
///
/// ```rust,ignore
/// use webrequire_graph::test_utils::TestRuntime;
///
/// let runtime = TestRuntime::new("/project")
///     .with_file("/project/src/a.js", "var b = require('./b')")
///     .with_file("/project/node_modules/left-pad/index.js", "module.exports = 1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestRuntime {
    root: PathBuf,
    files: Arc<RwLock<FxHashMap<PathBuf, Vec<u8>>>>,
    reads: Arc<RwLock<FxHashMap<PathBuf, usize>>>,
}

impl TestRuntime {
    /// Create an empty runtime whose `node_modules` lookup starts at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Add a file, builder style.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files
            .write()
            .insert(path.into().clean(), contents.into());
    }

    /// How many times `path` has been read.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref().to_path_buf().clean();
        self.reads.read().get(&path).copied().unwrap_or(0)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files.read().keys().any(|file| file.starts_with(path) && file != path)
    }
}

#[async_trait]
impl Runtime for TestRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let path = path.to_path_buf().clean();
        *self.reads.write().entry(path.clone()).or_default() += 1;
        self.files
            .read()
            .get(&path)
            .cloned()
            .ok_or(RuntimeError::FileNotFound(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let path = path.to_path_buf().clean();
        self.is_file(&path) || self.is_dir(&path)
    }

    fn resolve(&self, specifier: &str, from: &Path) -> RuntimeResult<PathBuf> {
        const BUILTINS: &[&str] = &["fs", "path", "os", "crypto"];
        if BUILTINS.contains(&specifier) {
            return Ok(PathBuf::from(specifier));
        }

        let package = self.root.join("node_modules").join(specifier).clean();
        let candidates = [
            package.clone(),
            package.with_extension("js"),
            package.join("index.js"),
        ];

        candidates
            .into_iter()
            .find(|candidate| self.is_file(candidate))
            .ok_or_else(|| RuntimeError::ResolutionFailed {
                specifier: specifier.to_string(),
                from: from.to_path_buf(),
                reason: "package not found in node_modules".to_string(),
            })
    }
}
