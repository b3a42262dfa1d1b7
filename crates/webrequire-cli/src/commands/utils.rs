//! Path helpers shared by the commands.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// Resolve `path` against `cwd` and drop `.`/`..` components.
pub(crate) fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.clean()
    } else {
        cwd.join(path).clean()
    }
}

/// Expand files and directories into a sorted list of `.js` sources.
///
/// Directories are walked recursively, skipping `node_modules` and the
/// output directory. Files named explicitly are taken whatever their
/// extension.
pub(crate) fn collect_sources(paths: &[PathBuf], cwd: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = BTreeSet::new();

    for path in paths {
        let path = resolve_path(path, cwd);
        if path.is_file() {
            sources.insert(path);
            continue;
        }
        if !path.is_dir() {
            return Err(BuildError::SourceNotFound(path).into());
        }

        let walker = WalkDir::new(&path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.file_type().is_dir()
                    && (entry.file_name() == "node_modules" || entry.path() == out_dir))
            });

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            let is_js = entry.path().extension().is_some_and(|ext| ext == "js");
            if entry.file_type().is_file() && is_js {
                sources.insert(entry.into_path());
            }
        }
    }

    if sources.is_empty() {
        let searched = paths
            .first()
            .map(|path| resolve_path(path, cwd))
            .unwrap_or_else(|| cwd.to_path_buf());
        return Err(BuildError::NoSources(searched).into());
    }

    Ok(sources.into_iter().collect())
}
