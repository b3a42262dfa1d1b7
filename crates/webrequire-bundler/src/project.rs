//! Build orchestration: feed files in, get packs out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use webrequire_graph::{
    DependencyGraph, Error as GraphError, FileId, GraphOptions, GraphSnapshot, Runtime,
    RuntimeError, SourceFile,
};

use crate::assets::{LOADER_SOURCE, PACK_PROLOGUE};
use crate::concat::{ConcatPart, concat};
use crate::mapping::MappingArtifact;
use crate::minify::minify;
use crate::options::{PackNaming, ProjectOptions};
use crate::output::{BuildOutput, PackArtifact};
use crate::packer::{Pack, plan};
use crate::wrapper::module_parts;
use crate::Result;

/// A bundling session.
///
/// Files are added with [`update`](Self::update) or
/// [`add_path`](Self::add_path), possibly concurrently and possibly more
/// than once; [`build`](Self::build) links the graph and emits packs for
/// whatever it holds at that moment. External modules are fetched once per
/// project, so keeping a project around between builds (watch mode) saves
/// the lookups.
#[derive(Debug, Clone)]
pub struct Project {
    options: ProjectOptions,
    graph: DependencyGraph,
    runtime: Arc<dyn Runtime>,
    entries: Vec<FileId>,
    prologue: Arc<str>,
}

impl Project {
    pub fn new(options: ProjectOptions, runtime: Arc<dyn Runtime>) -> Result<Self> {
        options.validate()?;

        let loader = minify(LOADER_SOURCE, options.minify_runtime)?;
        let prologue = minify(PACK_PROLOGUE, options.minify_runtime)?;

        let graph = DependencyGraph::new(
            GraphOptions::new(&options.base_dir)
                .modules_dir(options.modules_dir.trim_matches('/'))
                .loader_source(loader),
            runtime.clone(),
        )?;

        let entries = options
            .entries
            .iter()
            .map(|entry| entry.trim_start_matches("./").parse::<FileId>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(GraphError::from)?;

        Ok(Self {
            options,
            graph,
            runtime,
            entries,
            prologue: prologue.into(),
        })
    }

    pub fn options(&self) -> &ProjectOptions {
        &self.options
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Add or re-analyze a file.
    pub async fn update(&self, file: SourceFile) -> Result<FileId> {
        Ok(self.graph.update(file).await?)
    }

    /// Read a file through the runtime and add it.
    ///
    /// A sibling `<file>.map` is picked up as the file's prior source map
    /// when source maps are enabled.
    pub async fn add_path(&self, path: impl AsRef<Path>) -> Result<FileId> {
        let path = absolute(path.as_ref())?;
        let contents = self
            .runtime
            .read_to_string(&path)
            .await
            .map_err(GraphError::from)?;
        let mut file = SourceFile::new(&path, contents);

        if self.options.sourcemap {
            let map_path = sibling_map(&path);
            if self.runtime.exists(&map_path) {
                let json = self
                    .runtime
                    .read_to_string(&map_path)
                    .await
                    .map_err(GraphError::from)?;
                file = file.with_source_map_json(&json)?;
            }
        }

        self.update(file).await
    }

    /// Link the graph and emit every pack plus the mapping artifact.
    pub fn build(&self) -> Result<BuildOutput> {
        let relinked = self.graph.link()?;
        let snapshot = self.graph.snapshot();
        let plan = plan(&snapshot, &self.entries, self.options.smart_packing)?;

        let mut packs = Vec::with_capacity(plan.packs.len());
        for (index, pack) in plan.packs.iter().enumerate() {
            packs.push(self.emit(&snapshot, index, pack)?);
        }

        let names: Vec<String> = packs.iter().map(|pack| pack.name.clone()).collect();
        let mapping = MappingArtifact::from_plan(&plan, &names);

        tracing::info!(
            files = snapshot.len(),
            packs = packs.len(),
            rounds = plan.rounds,
            relinked,
            "build complete"
        );

        Ok(BuildOutput { packs, mapping })
    }

    fn emit(&self, snapshot: &GraphSnapshot, index: usize, pack: &Pack) -> Result<PackArtifact> {
        let mut parts = vec![ConcatPart::text(self.prologue.clone())];
        for id in &pack.files {
            let node = snapshot.node(id).ok_or_else(|| {
                GraphError::InternalInvariant(format!("packed file '{}' is not in the graph", id))
            })?;
            parts.extend(module_parts(node)?);
        }
        if !self.options.sourcemap {
            for part in &mut parts {
                part.source_map = None;
            }
        }

        let joined = concat(&parts, "")?;
        let mut code = joined.code.clone();
        if !code.ends_with('\n') {
            code.push('\n');
        }

        let name = match self.options.pack_naming {
            PackNaming::Position => format!("{}.js", base62(index)),
            PackNaming::ContentHash => {
                let hash = blake3::hash(code.as_bytes());
                format!("{}.js", &hash.to_hex().as_str()[..16])
            }
        };

        let map = joined.map_json(&name)?;
        if map.is_some() {
            code.push_str(&format!("//# sourceMappingURL={}.map\n", name));
        }

        tracing::debug!(pack = %name, entry = %pack.entry, files = pack.files.len(), "pack emitted");

        Ok(PackArtifact {
            name,
            code,
            map,
            entry: pack.entry.clone(),
            files: pack.files.clone(),
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| {
        GraphError::Runtime(RuntimeError::Io(format!(
            "Failed to get current directory: {}",
            e
        )))
    })?;
    Ok(cwd.join(path))
}

fn sibling_map(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".map");
    path.with_file_name(name)
}

/// `0`-`9`, `a`-`z`, `A`-`Z`.
pub(crate) fn base62(mut n: usize) -> String {
    const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut digits = Vec::new();
    loop {
        digits.push(ALPHABET[n % 62]);
        n /= 62;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base62_names() {
        assert_eq!(base62(0), "0");
        assert_eq!(base62(9), "9");
        assert_eq!(base62(10), "a");
        assert_eq!(base62(61), "Z");
        assert_eq!(base62(62), "10");
        assert_eq!(base62(62 * 62 + 1), "101");
    }

    #[test]
    fn map_files_sit_next_to_sources() {
        assert_eq!(
            sibling_map(Path::new("/app/lib/a.js")),
            PathBuf::from("/app/lib/a.js.map")
        );
    }
}
