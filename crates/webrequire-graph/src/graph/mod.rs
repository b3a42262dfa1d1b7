//! In-memory dependency graph.
//!
//! Forward edges live on each [`FileNode`] (`requirements`), reverse edges in
//! a separate index. Both are only ever changed together, under one write
//! lock, so the reverse index is always the exact transpose of the forward
//! edges.

mod mutations;
mod queries;
mod types;

pub use types::{FileNode, GraphOptions, GraphSnapshot, NodeKind, SourceFile};

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use tokio::sync::OnceCell;
use tokio::sync::mpsc::UnboundedSender;

use crate::events::GraphEvent;
use crate::file_id::FileId;
use crate::ordered_set::OrderedSet;
use crate::resolver::SpecifierResolver;
use crate::runtime::{Runtime, RuntimeError};
use crate::{Error, LOADER_FILE_NAME, Result};

/// Incrementally maintained dependency graph.
///
/// Cloning is cheap; clones share state.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub(crate) inner: Arc<RwLock<GraphInner>>,
    pub(crate) resolver: Arc<SpecifierResolver>,
    pub(crate) runtime: Arc<dyn Runtime>,
    pub(crate) loader: Arc<FileNode>,
    /// External modules fetched during this session, keyed by identity.
    pub(crate) externals: Arc<DashMap<FileId, Arc<OnceCell<Arc<FileNode>>>>>,
    pub(crate) listeners: Arc<Mutex<Vec<UnboundedSender<GraphEvent>>>>,
}

#[derive(Debug, Default)]
pub(crate) struct GraphInner {
    pub(crate) nodes: FxHashMap<FileId, Arc<FileNode>>,
    pub(crate) order: OrderedSet<FileId>,
    pub(crate) dependents: FxHashMap<FileId, OrderedSet<FileId>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    ///
    /// A relative `base_dir` is taken relative to the current directory.
    pub fn new(options: GraphOptions, runtime: Arc<dyn Runtime>) -> Result<Self> {
        let base_dir = if options.base_dir.is_absolute() {
            options.base_dir.clean()
        } else {
            std::env::current_dir()
                .map_err(|e| {
                    Error::Runtime(RuntimeError::Io(format!(
                        "Failed to get current directory: {}",
                        e
                    )))
                })?
                .join(&options.base_dir)
                .clean()
        };

        let resolver = SpecifierResolver::new(&base_dir, options.modules_dir, runtime.clone());
        let loader_path = Path::new(resolver.modules_dir()).join(LOADER_FILE_NAME);
        let loader_id = FileId::from_relative(&loader_path)?;
        let loader = FileNode::loader(
            loader_id,
            base_dir.join(loader_path),
            options.loader_source,
        );

        Ok(Self {
            inner: Arc::new(RwLock::new(GraphInner::default())),
            resolver: Arc::new(resolver),
            runtime,
            loader: Arc::new(loader),
            externals: Arc::new(DashMap::new()),
            listeners: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Identity of the module loader file.
    pub fn loader_id(&self) -> &FileId {
        &self.loader.id
    }

    pub fn resolver(&self) -> &SpecifierResolver {
        &self.resolver
    }

    pub fn base_dir(&self) -> &Path {
        self.resolver.base_dir()
    }
}

impl GraphInner {
    /// Insert or replace a node, moving its reverse edges along with it.
    pub(crate) fn insert_node(&mut self, node: Arc<FileNode>) {
        let previous = self
            .nodes
            .get(&node.id)
            .map(|n| n.requirements.clone())
            .unwrap_or_default();

        for stale in previous.difference(&node.requirements) {
            self.unlink(&stale, &node.id);
        }
        for added in node.requirements.difference(&previous) {
            self.dependents
                .entry(added)
                .or_default()
                .insert(node.id.clone());
        }

        self.order.insert(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn remove_node(&mut self, id: &FileId) -> Option<Arc<FileNode>> {
        let node = self.nodes.remove(id)?;
        for requirement in node.requirements.iter() {
            self.unlink(requirement, id);
        }
        self.order.remove(id);
        Some(node)
    }

    fn unlink(&mut self, requirement: &FileId, dependent: &FileId) {
        if let Some(set) = self.dependents.get_mut(requirement) {
            set.remove(dependent);
            if set.is_empty() {
                self.dependents.remove(requirement);
            }
        }
    }

    /// Drop external nodes in `candidates` that nothing requires anymore.
    pub(crate) fn prune_orphans(&mut self, candidates: &OrderedSet<FileId>) -> Vec<FileId> {
        let mut pruned = Vec::new();
        for id in candidates.iter() {
            let is_external = self
                .nodes
                .get(id)
                .is_some_and(|n| n.kind == NodeKind::External);
            let orphaned = !self.dependents.contains_key(id);
            if is_external && orphaned && self.remove_node(id).is_some() {
                pruned.push(id.clone());
            }
        }
        pruned
    }
}
