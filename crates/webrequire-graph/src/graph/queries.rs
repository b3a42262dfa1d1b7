//! Read-only queries for DependencyGraph.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use super::{DependencyGraph, FileNode, GraphSnapshot};
use crate::events::GraphEvent;
use crate::file_id::FileId;
use crate::ordered_set::OrderedSet;
use crate::{Error, Result};

impl DependencyGraph {
    /// Take a consistent copy of the whole graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        let inner = self.inner.read();
        GraphSnapshot {
            order: inner.order.to_vec(),
            nodes: inner.nodes.clone(),
            dependents: inner.dependents.clone(),
        }
    }

    pub fn node(&self, id: &FileId) -> Option<Arc<FileNode>> {
        self.inner.read().nodes.get(id).cloned()
    }

    pub fn contains(&self, id: &FileId) -> bool {
        self.inner.read().nodes.contains_key(id)
    }

    /// Identities required by `id`, in order of first appearance.
    pub fn requirements(&self, id: &FileId) -> Vec<FileId> {
        self.inner
            .read()
            .nodes
            .get(id)
            .map(|node| node.requirements.to_vec())
            .unwrap_or_default()
    }

    /// Files that currently require `id`.
    pub fn dependents(&self, id: &FileId) -> Vec<FileId> {
        self.inner
            .read()
            .dependents
            .get(id)
            .map(OrderedSet::to_vec)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().nodes.is_empty()
    }

    /// Receive a [`GraphEvent`] for every file resolved from now on.
    pub fn subscribe(&self) -> UnboundedReceiver<GraphEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.lock().push(tx);
        rx
    }

    /// Check that the reverse index is the exact transpose of the forward edges.
    pub fn verify_edges(&self) -> Result<()> {
        let inner = self.inner.read();

        let mut expected: FxHashMap<&FileId, Vec<&FileId>> = FxHashMap::default();
        for node in inner.nodes.values() {
            for requirement in node.requirements.iter() {
                expected.entry(requirement).or_default().push(&node.id);
            }
        }

        if expected.len() != inner.dependents.len() {
            return Err(Error::InternalInvariant(format!(
                "reverse index has {} targets, forward edges have {}",
                inner.dependents.len(),
                expected.len()
            )));
        }

        for (target, sources) in expected {
            let actual = inner.dependents.get(target).ok_or_else(|| {
                Error::InternalInvariant(format!("'{}' is missing from the reverse index", target))
            })?;
            if actual.len() != sources.len() || !sources.iter().all(|s| actual.contains(s)) {
                return Err(Error::InternalInvariant(format!(
                    "reverse edges of '{}' do not match its dependents",
                    target
                )));
            }
        }

        Ok(())
    }
}
