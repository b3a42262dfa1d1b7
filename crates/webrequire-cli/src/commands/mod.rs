//! Command implementations.
//!
//! - [`build`] - Pack sources and write the output directory
//! - [`tags`] - Print script tags from a mapping file

pub mod build;
pub mod tags;
pub(crate) mod utils;

pub use build::execute as build_execute;
pub use tags::execute as tags_execute;
