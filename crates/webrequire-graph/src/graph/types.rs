use std::path::PathBuf;
use std::sync::Arc;

use oxc_sourcemap::SourceMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::file_id::FileId;
use crate::ordered_set::OrderedSet;
use crate::resolver::FileDescriptor;
use crate::{DEFAULT_MODULES_DIR, Error, Result};

/// What a graph node holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A file fed to the graph by the caller.
    Source,
    /// A leaf module fetched from `node_modules`.
    External,
    /// The browser-side module loader.
    Loader,
}

/// A file entering the graph: its path, text and optional prior source map.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub contents: Arc<str>,
    pub source_map: Option<Arc<SourceMap>>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            source_map: None,
        }
    }

    pub fn with_source_map(mut self, map: SourceMap) -> Self {
        self.source_map = Some(Arc::new(map));
        self
    }

    /// Attach a source map given as JSON text.
    pub fn with_source_map_json(self, json: &str) -> Result<Self> {
        let map = SourceMap::from_json_string(json).map_err(|e| Error::SourceMap {
            origin: self.path.clone(),
            message: e.to_string(),
        })?;
        Ok(self.with_source_map(map))
    }
}

/// One file in the graph.
#[derive(Debug, Clone)]
pub struct FileNode {
    pub id: FileId,
    pub kind: NodeKind,
    pub source_path: PathBuf,
    pub contents: Arc<str>,
    pub source_map: Option<Arc<SourceMap>>,
    /// One descriptor per distinct specifier, in order of first appearance.
    pub links: Vec<FileDescriptor>,
    /// Distinct required identities in order of first appearance. Every
    /// node except the loader requires the loader last.
    pub requirements: OrderedSet<FileId>,
}

impl FileNode {
    pub(crate) fn source(
        id: FileId,
        file: SourceFile,
        links: Vec<FileDescriptor>,
        loader: &FileId,
    ) -> Self {
        let mut requirements: OrderedSet<FileId> = links
            .iter()
            .map(|link| link.final_output_path.clone())
            .collect();
        requirements.insert(loader.clone());

        Self {
            id,
            kind: NodeKind::Source,
            source_path: file.path,
            contents: file.contents,
            source_map: file.source_map,
            links,
            requirements,
        }
    }

    pub(crate) fn external(link: &FileDescriptor, contents: Arc<str>, loader: &FileId) -> Self {
        Self {
            id: link.final_output_path.clone(),
            kind: NodeKind::External,
            source_path: link.resolved_source_path.clone(),
            contents,
            source_map: None,
            links: Vec::new(),
            requirements: std::iter::once(loader.clone()).collect(),
        }
    }

    pub(crate) fn loader(id: FileId, source_path: PathBuf, contents: Arc<str>) -> Self {
        Self {
            id,
            kind: NodeKind::Loader,
            source_path,
            contents,
            source_map: None,
            links: Vec::new(),
            requirements: OrderedSet::new(),
        }
    }

    /// `[mention, final name]` pairs for the module wrapper.
    ///
    /// The loader edge is implicit and never listed.
    pub fn wrapper_pairs(&self) -> Vec<(String, String)> {
        self.links.iter().map(FileDescriptor::wrapper_pair).collect()
    }

    /// Whether the node is emitted inside a registration wrapper.
    pub fn is_wrapped(&self) -> bool {
        self.kind != NodeKind::Loader
    }
}

/// Configuration of a [`DependencyGraph`](super::DependencyGraph).
#[derive(Debug, Clone)]
pub struct GraphOptions {
    pub base_dir: PathBuf,
    pub modules_dir: String,
    pub loader_source: Arc<str>,
}

impl GraphOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            modules_dir: DEFAULT_MODULES_DIR.to_string(),
            loader_source: Arc::from(""),
        }
    }

    pub fn modules_dir(mut self, modules_dir: impl Into<String>) -> Self {
        self.modules_dir = modules_dir.into();
        self
    }

    pub fn loader_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.loader_source = source.into();
        self
    }
}

/// A consistent, immutable copy of the graph taken under one read lock.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    pub(crate) order: Vec<FileId>,
    pub(crate) nodes: FxHashMap<FileId, Arc<FileNode>>,
    pub(crate) dependents: FxHashMap<FileId, OrderedSet<FileId>>,
}

impl GraphSnapshot {
    /// Identities in the order they were first added.
    pub fn ids(&self) -> impl Iterator<Item = &FileId> {
        self.order.iter()
    }

    pub fn node(&self, id: &FileId) -> Option<&Arc<FileNode>> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Files currently requiring `id`.
    pub fn dependents(&self, id: &FileId) -> impl Iterator<Item = &FileId> {
        self.dependents.get(id).into_iter().flat_map(|set| set.iter())
    }

    pub fn has_dependents(&self, id: &FileId) -> bool {
        self.dependents.get(id).is_some_and(|set| !set.is_empty())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
