//! # webrequire-graph
//!
//! Dependency graph primitives for browser code written against a synchronous
//! `require("...")` statement.
//!
//! ## Overview
//!
//! This crate turns `(path, text)` pairs into an incrementally maintained
//! dependency graph:
//!
//! - **Scanner**: finds `require("x")` calls on the token stream and rejects
//!   every ES module form (`import`, `import()`, `import.meta`, `export`)
//! - **Resolver**: maps a specifier to a [`FileDescriptor`] carrying the
//!   canonical output identity ([`FileId`]) the bundle addresses it by
//! - **Graph**: [`DependencyGraph`] keeps forward and reverse edges per file,
//!   fetches external (`node_modules`) leaves once per session and replaces a
//!   file's edges atomically when it is updated
//!
//! ## Architecture
//!
//! ```text
//!   (path, text) ──▶ scan() ──▶ SpecifierResolver ──▶ DependencyGraph
//!                                      │                    │
//!                                      ▼                    ▼
//!                               Runtime (I/O,         GraphSnapshot ──▶ packer
//!                               package lookup)       GraphEvent    ──▶ listeners
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use webrequire_graph::{DependencyGraph, GraphOptions, NativeRuntime, SourceFile};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = GraphOptions::new("/project/src").loader_source("/* loader */");
//! let graph = DependencyGraph::new(options, Arc::new(NativeRuntime::new()))?;
//!
//! graph
//!     .update(SourceFile::new("/project/src/a.js", "var b = require('./b')"))
//!     .await?;
//!
//! for dependent in graph.dependents(&"b.js".parse()?) {
//!     println!("b.js is required by {dependent}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! `DependencyGraph` is cheap to clone and every clone shares the same state.
//! Updates for different files may run concurrently; each one reads and
//! resolves outside the lock and commits its edges under a single write lock.

pub mod error;
pub mod events;
pub mod file_id;
pub mod ordered_set;
pub mod resolver;
pub mod runtime;
pub mod scanner;

mod graph;

pub use error::{Error, Result};
pub use events::GraphEvent;
pub use file_id::{FileId, FileIdError};
pub use graph::{DependencyGraph, FileNode, GraphOptions, GraphSnapshot, NodeKind, SourceFile};
pub use ordered_set::OrderedSet;
pub use resolver::{FileDescriptor, SpecifierKind, SpecifierResolver};
pub use scanner::{RequireOccurrence, scan};

// Re-export runtime types
pub use runtime::native::NativeRuntime;
pub use runtime::{Runtime, RuntimeError, RuntimeResult};

#[cfg(any(test, feature = "test-utils"))]
pub use runtime::test_utils::TestRuntime;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    pub use super::runtime::test_utils::*;
}

/// Source map type carried by graph nodes.
pub use oxc_sourcemap::SourceMap;

/// Name of the loader file emitted inside the modules directory.
pub const LOADER_FILE_NAME: &str = "webrequire.js";

/// Default directory that external modules are emitted into.
pub const DEFAULT_MODULES_DIR: &str = "module";
