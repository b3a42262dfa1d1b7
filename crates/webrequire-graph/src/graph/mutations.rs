//! Update and link operations for DependencyGraph.

use std::sync::Arc;

use path_clean::PathClean;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::task::JoinSet;
use tracing::{debug, trace};

use super::{DependencyGraph, FileNode, NodeKind, SourceFile};
use crate::events::GraphEvent;
use crate::file_id::FileId;
use crate::resolver::FileDescriptor;
use crate::runtime::RuntimeError;
use crate::scanner::scan;
use crate::{Error, Result};

impl DependencyGraph {
    /// Add a file or replace a known one.
    ///
    /// Scans the text, resolves every specifier and fetches newly seen
    /// external modules before taking the write lock. The commit then
    /// replaces the file's forward edges and the matching reverse edges in
    /// one step. On error the graph is left untouched.
    pub async fn update(&self, file: SourceFile) -> Result<FileId> {
        let mut file = file;
        file.path = if file.path.is_absolute() {
            file.path.clean()
        } else {
            self.base_dir().join(&file.path).clean()
        };

        let id = self.resolver.identity_of(&file.path)?;
        if &id == self.loader_id() {
            return Err(Error::ReservedIdentity(id));
        }

        let occurrences = scan(&file.contents, &file.path)?;
        let mut seen = FxHashSet::default();
        let mut links = Vec::new();
        for occurrence in occurrences {
            if seen.insert(occurrence.specifier.clone()) {
                links.push(self.resolver.resolve(&file.path, &occurrence.specifier)?);
            }
        }

        let externals = self.fetch_externals(&links).await?;

        let node = FileNode::source(id.clone(), file, links, self.loader_id());
        let requirements = node.requirements.len();
        let added_externals = self.commit(node, externals);

        debug!(
            file = %id,
            requirements,
            new_externals = added_externals,
            "file resolved"
        );

        Ok(id)
    }

    /// Apply one update under the write lock.
    ///
    /// Listeners are notified before the lock is released, so events from
    /// concurrent updates arrive in commit order. Returns the number of
    /// external nodes that were not in the graph before.
    fn commit(&self, node: FileNode, externals: Vec<Arc<FileNode>>) -> usize {
        let mut inner = self.inner.write();

        if !inner.nodes.contains_key(self.loader_id()) {
            inner.insert_node(self.loader.clone());
        }

        let mut added = Vec::new();
        for external in externals {
            if !inner.nodes.contains_key(&external.id) {
                inner.insert_node(external.clone());
                added.push(external);
            }
        }

        let previous = inner
            .nodes
            .get(&node.id)
            .map(|n| n.requirements.clone())
            .unwrap_or_default();
        let removed = previous.difference(&node.requirements);

        let mut events: Vec<GraphEvent> = added
            .iter()
            .map(|external| GraphEvent::FileResolved {
                id: external.id.clone(),
                kind: NodeKind::External,
                requirements: external.requirements.to_vec(),
            })
            .collect();
        events.push(GraphEvent::FileResolved {
            id: node.id.clone(),
            kind: NodeKind::Source,
            requirements: node.requirements.to_vec(),
        });

        inner.insert_node(Arc::new(node));

        for pruned in inner.prune_orphans(&removed) {
            trace!(external = %pruned, "dropped unused external module");
        }

        self.emit(events);
        added.len()
    }

    /// Fetch every distinct external module among `links`, concurrently.
    async fn fetch_externals(&self, links: &[FileDescriptor]) -> Result<Vec<Arc<FileNode>>> {
        let mut tasks = JoinSet::new();
        let mut wanted = Vec::new();

        for link in links.iter().filter(|link| link.is_external) {
            if wanted.contains(&link.final_output_path) {
                continue;
            }
            wanted.push(link.final_output_path.clone());

            let graph = self.clone();
            let link = link.clone();
            tasks.spawn(async move { graph.fetch_external(link).await });
        }

        let mut fetched = FxHashMap::default();
        while let Some(joined) = tasks.join_next().await {
            let node = joined
                .map_err(|e| RuntimeError::Other(format!("Task join error: {}", e)))??;
            fetched.insert(node.id.clone(), node);
        }

        Ok(wanted
            .iter()
            .filter_map(|id| fetched.remove(id))
            .collect())
    }

    /// Read and scan one external module, at most once per session.
    async fn fetch_external(&self, link: FileDescriptor) -> Result<Arc<FileNode>> {
        let cell = self
            .externals
            .entry(link.final_output_path.clone())
            .or_default()
            .clone();

        let node = cell
            .get_or_try_init(|| async {
                debug!(
                    external = %link.final_output_path,
                    path = %link.resolved_source_path.display(),
                    "fetching external module"
                );
                let contents = self
                    .runtime
                    .read_to_string(&link.resolved_source_path)
                    .await?;

                let found = scan(&contents, &link.resolved_source_path)?;
                if let Some(first) = found.first() {
                    return Err(Error::NestedExternalRequire {
                        id: link.final_output_path.clone(),
                        specifier: first.specifier.clone(),
                    });
                }

                Ok::<_, Error>(Arc::new(FileNode::external(
                    &link,
                    Arc::from(contents),
                    self.loader_id(),
                )))
            })
            .await?;

        Ok(node.clone())
    }

    /// Check every relative requirement against the known files.
    ///
    /// A requirement whose target is unknown and whose specifier has no
    /// extension is retried as a directory import (`<target>/index.js`) and
    /// re-linked when that file is known. A plain file therefore always wins
    /// over a directory of the same name. Anything else that is still
    /// unknown fails with [`Error::UnresolvedRequirement`], and in that case
    /// nothing is re-linked. Directory imports from an earlier `link` are
    /// switched back to the plain file once it is known, so the result only
    /// depends on the files currently in the graph.
    ///
    /// Returns the number of re-linked requirements.
    pub fn link(&self) -> Result<usize> {
        let mut inner = self.inner.write();
        let mut relinked: FxHashMap<FileId, FileNode> = FxHashMap::default();
        let mut count = 0;

        for id in inner.order.iter() {
            let Some(node) = inner.nodes.get(id) else {
                continue;
            };

            for (index, link) in node.links.iter().enumerate() {
                let unresolved = || Error::UnresolvedRequirement {
                    from: id.clone(),
                    specifier: link.mention.clone(),
                };

                let target = if link.is_directory_import {
                    let plain = self
                        .resolver
                        .resolve(&link.origin_path, &link.mention)
                        .map_err(|_| unresolved())?;
                    if inner.nodes.contains_key(&plain.final_output_path) {
                        plain
                    } else if inner.nodes.contains_key(&link.final_output_path) {
                        continue;
                    } else {
                        return Err(unresolved());
                    }
                } else {
                    if inner.nodes.contains_key(&link.final_output_path) {
                        continue;
                    }
                    if link.is_external {
                        return Err(unresolved());
                    }
                    let fallback = self
                        .resolver
                        .resolve_directory(link)
                        .map_err(|_| unresolved())?;
                    if !inner.nodes.contains_key(&fallback.final_output_path) {
                        return Err(unresolved());
                    }
                    fallback
                };

                debug!(
                    file = %id,
                    specifier = %link.mention,
                    target = %target.final_output_path,
                    directory = target.is_directory_import,
                    "re-linked requirement"
                );

                let updated = relinked
                    .entry(id.clone())
                    .or_insert_with(|| (**node).clone());
                updated
                    .requirements
                    .replace(&link.final_output_path, target.final_output_path.clone());
                updated.links[index] = target;
                count += 1;
            }
        }

        for (_, node) in relinked {
            inner.insert_node(Arc::new(node));
        }

        Ok(count)
    }

    fn emit(&self, events: Vec<GraphEvent>) {
        let mut listeners = self.listeners.lock();
        listeners.retain(|listener| events.iter().all(|event| listener.send(event.clone()).is_ok()));
    }
}
