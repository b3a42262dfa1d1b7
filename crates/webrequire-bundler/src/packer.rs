//! Partitioning the graph into packs.
//!
//! Every entry point gets the files reachable from it without passing through
//! another entry point. Files that end up in more than one pack are promoted
//! to entry points of their own and the partition is recomputed until no file
//! is shared.
//!
//! ```text
//!   a ─▶ b ─▶ c ◀─ d        round 1: {a,b,c}  {d,c}      c is shared
//!                           round 2: {a,b}  {d}  {c}     done
//! ```
//!
//! Promotion only ever adds entry points, so the number of rounds is bounded
//! by the number of files.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use webrequire_graph::{Error as GraphError, FileId, GraphSnapshot, NodeKind, OrderedSet};

use crate::Result;

/// One output artifact: the files it holds, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pack {
    /// The entry point the pack was grown from.
    pub entry: FileId,
    pub files: Vec<FileId>,
    /// Initial entry points whose dependency closure reaches this pack.
    pub covered_by: Vec<FileId>,
}

/// Result of packing a graph snapshot.
#[derive(Debug, Clone, Default)]
pub struct PackPlan {
    pub packs: Vec<Pack>,
    /// Pack index of every file.
    pub locations: FxHashMap<FileId, usize>,
    /// For every file, the packs its transitive closure needs, in
    /// breadth-first order starting with its own pack.
    pub mapping: IndexMap<FileId, Vec<usize>>,
    /// Number of partition rounds that were needed.
    pub rounds: usize,
}

impl PackPlan {
    pub fn pack_of(&self, id: &FileId) -> Option<&Pack> {
        self.locations.get(id).and_then(|&index| self.packs.get(index))
    }
}

/// Compute packs for `snapshot`.
///
/// With `smart_packing` off every file is its own pack.
pub fn plan(
    snapshot: &GraphSnapshot,
    explicit_entries: &[FileId],
    smart_packing: bool,
) -> Result<PackPlan> {
    for entry in explicit_entries {
        if !snapshot.contains(entry) {
            return Err(GraphError::UnknownEntry(entry.clone()).into());
        }
    }

    let initial: OrderedSet<FileId> = snapshot
        .ids()
        .filter(|id| !snapshot.has_dependents(id))
        .chain(explicit_entries.iter())
        .cloned()
        .collect();

    let (packs, rounds) = if smart_packing {
        partition(snapshot, initial.clone())?
    } else {
        let packs = snapshot
            .ids()
            .map(|id| (id.clone(), vec![id.clone()]))
            .collect();
        (packs, 1)
    };

    let mut packs: Vec<Pack> = packs
        .into_iter()
        .map(|(entry, files)| Pack {
            entry,
            files: loader_first(snapshot, files),
            covered_by: Vec::new(),
        })
        .collect();

    let mut locations = FxHashMap::default();
    for (index, pack) in packs.iter().enumerate() {
        for id in &pack.files {
            locations.insert(id.clone(), index);
        }
    }

    let mut mapping = IndexMap::new();
    for id in snapshot.ids() {
        mapping.insert(id.clone(), closure_packs(snapshot, &locations, id)?);
    }

    for entry in initial.iter() {
        for index in mapping.get(entry).into_iter().flatten() {
            packs[*index].covered_by.push(entry.clone());
        }
    }

    tracing::debug!(packs = packs.len(), rounds, "packing complete");

    Ok(PackPlan {
        packs,
        locations,
        mapping,
        rounds,
    })
}

type Partition = Vec<(FileId, Vec<FileId>)>;

/// Grow packs from `entries` and promote shared files until none remain.
fn partition(snapshot: &GraphSnapshot, mut entries: OrderedSet<FileId>) -> Result<(Partition, usize)> {
    let ceiling = snapshot.len() + 1;

    for round in 1..=ceiling {
        let mut packs: Partition = Vec::with_capacity(entries.len());
        for entry in entries.iter() {
            packs.push((entry.clone(), reach(snapshot, entry, &entries)?));
        }

        let mut seen: FxHashSet<&FileId> = FxHashSet::default();
        let mut duplicates: OrderedSet<FileId> = OrderedSet::new();
        for (_, files) in &packs {
            for id in files {
                if !seen.insert(id) {
                    duplicates.insert(id.clone());
                }
            }
        }

        if duplicates.is_empty() {
            // Files only reachable through a cycle have no entry yet.
            match snapshot.ids().find(|id| !seen.contains(id)) {
                None => return Ok((packs, round)),
                Some(orphan) => {
                    tracing::debug!(file = %orphan, "promoting unreached file");
                    entries.insert(orphan.clone());
                    continue;
                }
            }
        }

        let promoted: Vec<FileId> = duplicates
            .iter()
            .filter(|id| {
                snapshot
                    .dependents(id)
                    .any(|dependent| !duplicates.contains(dependent))
            })
            .cloned()
            .collect();

        if promoted.is_empty() {
            return Err(GraphError::InternalInvariant(format!(
                "{} shared files but none can be promoted",
                duplicates.len()
            ))
            .into());
        }

        for id in promoted {
            tracing::debug!(file = %id, round, "promoting shared file to entry point");
            entries.insert(id);
        }
    }

    Err(GraphError::InternalInvariant(format!(
        "packing did not settle within {} rounds",
        ceiling
    ))
    .into())
}

/// Files reachable from `entry` without entering another entry point,
/// in depth-first discovery order.
fn reach(snapshot: &GraphSnapshot, entry: &FileId, entries: &OrderedSet<FileId>) -> Result<Vec<FileId>> {
    let mut files = Vec::new();
    let mut visited: FxHashSet<&FileId> = FxHashSet::default();
    let mut stack = vec![entry];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        files.push(id.clone());

        let node = snapshot.node(id).ok_or_else(|| unknown(id))?;
        for requirement in node.requirements.iter().rev() {
            if !snapshot.contains(requirement) {
                return Err(GraphError::UnresolvedRequirement {
                    from: id.clone(),
                    specifier: requirement.to_string(),
                }
                .into());
            }
            if !visited.contains(requirement) && !entries.contains(requirement) {
                stack.push(requirement);
            }
        }
    }

    Ok(files)
}

/// Pack indices needed by `id`, breadth-first over its requirements.
fn closure_packs(
    snapshot: &GraphSnapshot,
    locations: &FxHashMap<FileId, usize>,
    id: &FileId,
) -> Result<Vec<usize>> {
    let mut packs = OrderedSet::new();
    let mut visited: FxHashSet<&FileId> = FxHashSet::default();
    let mut queue = std::collections::VecDeque::from([id]);
    visited.insert(id);

    while let Some(current) = queue.pop_front() {
        let index = locations.get(current).ok_or_else(|| unknown(current))?;
        packs.insert(*index);

        let node = snapshot.node(current).ok_or_else(|| unknown(current))?;
        for requirement in node.requirements.iter() {
            if visited.insert(requirement) {
                queue.push_back(requirement);
            }
        }
    }

    Ok(packs.to_vec())
}

fn loader_first(snapshot: &GraphSnapshot, mut files: Vec<FileId>) -> Vec<FileId> {
    let loader = files.iter().position(|id| {
        snapshot
            .node(id)
            .is_some_and(|node| node.kind == NodeKind::Loader)
    });
    if let Some(position) = loader {
        let id = files.remove(position);
        files.insert(0, id);
    }
    files
}

fn unknown(id: &FileId) -> crate::Error {
    GraphError::InternalInvariant(format!("'{}' is not in the graph snapshot", id)).into()
}
