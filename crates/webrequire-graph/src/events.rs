//! Notifications pushed by the graph after each successful update.

use crate::file_id::FileId;
use crate::graph::NodeKind;

/// A discrete change to the graph.
///
/// Events are sent after the update that caused them has been committed, in
/// commit order. External modules discovered by an update are announced
/// before the file that required them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    FileResolved {
        id: FileId,
        kind: NodeKind,
        requirements: Vec<FileId>,
    },
}

impl GraphEvent {
    pub fn id(&self) -> &FileId {
        match self {
            GraphEvent::FileResolved { id, .. } => id,
        }
    }
}
