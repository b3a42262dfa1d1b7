//! Build results and writing them to disk.

pub mod writer;

use std::path::Path;

use webrequire_graph::FileId;

use crate::Result;
use crate::mapping::MappingArtifact;

/// One emitted pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackArtifact {
    /// File name inside the output directory (`0.js`, `3f9a...e1.js`).
    pub name: String,
    pub code: String,
    /// Merged source map JSON, written next to the pack as `<name>.map`.
    pub map: Option<String>,
    /// Entry point the pack was grown from.
    pub entry: FileId,
    /// Member files in emission order.
    pub files: Vec<FileId>,
}

impl PackArtifact {
    pub fn map_name(&self) -> String {
        format!("{}.map", self.name)
    }
}

/// Everything a build produces.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub packs: Vec<PackArtifact>,
    pub mapping: MappingArtifact,
}

impl BuildOutput {
    pub fn pack(&self, name: &str) -> Option<&PackArtifact> {
        self.packs.iter().find(|pack| pack.name == name)
    }

    /// The pack holding `file`.
    pub fn pack_containing(&self, file: &FileId) -> Option<&PackArtifact> {
        self.packs.iter().find(|pack| pack.files.contains(file))
    }

    /// Write packs, maps and the mapping artifact into `dir`.
    ///
    /// Either every file is written or none is.
    pub fn write_to(
        &self,
        dir: impl AsRef<Path>,
        mappings_file: &str,
        overwrite: bool,
    ) -> Result<Vec<std::path::PathBuf>> {
        writer::write_build_to(self, dir.as_ref(), mappings_file, overwrite)
    }
}
