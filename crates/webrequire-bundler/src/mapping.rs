//! The mapping artifact: which packs a page needs for a given entry file.
//!
//! Serialized as a plain JSON object, `{ "app.js": ["0.js", "3.js"], ... }`,
//! and read back at page-render time by the tag generator.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use webrequire_graph::OrderedSet;

use crate::packer::PackPlan;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingArtifact(IndexMap<String, Vec<String>>);

impl MappingArtifact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the mapping from a pack plan and the names given to its packs.
    pub fn from_plan(plan: &PackPlan, pack_names: &[String]) -> Self {
        let entries = plan
            .mapping
            .iter()
            .map(|(id, packs)| {
                let names = packs
                    .iter()
                    .filter_map(|index| pack_names.get(*index).cloned())
                    .collect();
                (id.as_str().to_string(), names)
            })
            .collect();
        Self(entries)
    }

    pub fn insert(&mut self, entry: impl Into<String>, packs: Vec<String>) {
        self.0.insert(entry.into(), packs);
    }

    /// Packs recorded for one entry file.
    pub fn get(&self, entry: &str) -> Option<&[String]> {
        self.0.get(normalize(entry).as_str()).map(Vec::as_slice)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The de-duplicated packs needed by `entries`.
    ///
    /// Lists are walked breadth-first: the first pack of every entry, then
    /// the second of every entry, and so on.
    pub fn related_packs<S: AsRef<str>>(&self, entries: &[S]) -> Result<Vec<String>> {
        let mut lists = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_ref();
            let packs = self
                .get(entry)
                .ok_or_else(|| Error::UnresolvedEntryFile(entry.to_string()))?;
            lists.push(packs);
        }

        let depth = lists.iter().map(|packs| packs.len()).max().unwrap_or(0);
        let mut related = OrderedSet::new();
        for level in 0..depth {
            for packs in &lists {
                if let Some(pack) = packs.get(level) {
                    related.insert(pack.clone());
                }
            }
        }

        Ok(related.to_vec())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a mapping file written by a build.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }
}

fn normalize(entry: &str) -> String {
    let entry = entry.replace('\\', "/");
    entry.trim_start_matches("./").to_string()
}
