//! Atomic file writing for build output.
//!
//! All files of a build are first written next to their targets with a
//! `.tmp` suffix and only renamed into place once every write succeeded.
//! If anything fails the temporary files are removed, so a build directory
//! never holds a partial set of packs.
//!
//! Every target is validated to stay inside the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

use super::BuildOutput;
use crate::{Error, Result};

/// Write a build to `dir`.
///
/// Returns the written paths in write order: packs (each followed by its
/// map) and then the mapping artifact.
///
/// # Errors
///
/// - [`Error::InvalidOutputPath`] when a file name would escape `dir`
/// - [`Error::OutputExists`] when a target exists and `overwrite` is `false`
/// - [`Error::WriteFailure`] when any write or rename fails
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use webrequire_bundler::output::writer::write_build_to;
/// # use webrequire_bundler::{BuildOutput, Result};
///
/// # fn example(output: &BuildOutput) -> Result<()> {
/// write_build_to(output, Path::new("dist"), "mappings.json", true)?;
/// # Ok(())
/// # }
/// ```
pub fn write_build_to(
    output: &BuildOutput,
    dir: &Path,
    mappings_file: &str,
    overwrite: bool,
) -> Result<Vec<PathBuf>> {
    let dir = validate_and_normalize_dir(dir)?;

    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mapping = output.mapping.to_json_pretty()?;

    let mut contents: Vec<(String, &[u8])> = Vec::new();
    for pack in &output.packs {
        contents.push((pack.name.clone(), pack.code.as_bytes()));
        if let Some(map) = &pack.map {
            contents.push((pack.map_name(), map.as_bytes()));
        }
    }
    contents.push((mappings_file.to_string(), mapping.as_bytes()));

    let mut operations = Vec::with_capacity(contents.len());
    for (filename, bytes) in contents {
        let target_path = validate_output_path(&dir, &filename)?;

        if !overwrite && target_path.exists() {
            return Err(Error::OutputExists(format!(
                "File already exists: '{}'. Use overwrite=true to replace.",
                target_path.display()
            )));
        }

        operations.push((target_path, bytes));
    }

    write_files_atomic(&operations)?;

    tracing::info!(
        files = operations.len(),
        dir = %dir.display(),
        "build written"
    );

    Ok(operations.into_iter().map(|(path, _)| path).collect())
}

fn validate_and_normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();

    let absolute = if cleaned.is_absolute() {
        cleaned
    } else {
        std::env::current_dir()
            .map_err(|e| {
                Error::InvalidOutputPath(format!("Failed to get current directory: {}", e))
            })?
            .join(&cleaned)
            .clean()
    };

    Ok(absolute)
}

/// Resolve `filename` inside `base_dir`, refusing anything that escapes it.
fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() {
        return Err(Error::InvalidOutputPath("Filename is empty".to_string()));
    }
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();

    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }

    Ok(full_path)
}

/// `0.js` and `0.js.map` must not share a temporary file, so the suffix is
/// appended to the whole name.
fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    target.with_file_name(name)
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut temp_files = Vec::new();

    for (target_path, content) in operations {
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_temp_files(&temp_files);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = temp_path_for(target_path);
        fs::write(&temp_path, content).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp_path.display(),
                e
            ))
        })?;

        temp_files.push((temp_path, target_path.clone()));
    }

    for (temp_path, target_path) in &temp_files {
        fs::rename(temp_path, target_path).map_err(|e| {
            cleanup_temp_files(&temp_files);
            Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp_path.display(),
                target_path.display(),
                e
            ))
        })?;
    }

    Ok(())
}

fn cleanup_temp_files(temp_files: &[(PathBuf, PathBuf)]) {
    for (temp_path, _) in temp_files {
        if temp_path.exists() {
            if let Err(e) = fs::remove_file(temp_path) {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %e,
                    "failed to clean up temporary file"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingArtifact;
    use crate::output::PackArtifact;

    fn output() -> BuildOutput {
        let mut mapping = MappingArtifact::new();
        mapping.insert("a.js", vec!["0.js".into()]);
        BuildOutput {
            packs: vec![PackArtifact {
                name: "0.js".into(),
                code: "a();\n//# sourceMappingURL=0.js.map\n".into(),
                map: Some("{\"version\":3}".into()),
                entry: "a.js".parse().unwrap(),
                files: vec!["a.js".parse().unwrap()],
            }],
            mapping,
        }
    }

    #[test]
    fn test_validate_output_path_normal() {
        let base = Path::new("/tmp/output");
        assert_eq!(
            validate_output_path(base, "./0.js").unwrap(),
            Path::new("/tmp/output/0.js")
        );
    }

    #[test]
    fn test_validate_output_path_traversal() {
        let base = Path::new("/tmp/output");
        assert!(matches!(
            validate_output_path(base, "../etc/passwd"),
            Err(Error::InvalidOutputPath(_))
        ));
        assert!(validate_output_path(base, "safe/../../../etc/passwd").is_err());
        assert!(validate_output_path(base, "file\0name.js").is_err());
        assert!(validate_output_path(base, ".").is_err());
    }

    #[test]
    fn test_temp_names_do_not_collide() {
        assert_ne!(
            temp_path_for(Path::new("/out/0.js")),
            temp_path_for(Path::new("/out/0.js.map"))
        );
    }

    #[test]
    fn test_writes_packs_maps_and_mapping() {
        let temp = tempfile::TempDir::new().unwrap();
        let written = write_build_to(&output(), temp.path(), "mappings.json", false).unwrap();

        assert_eq!(written.len(), 3);
        assert!(temp.path().join("0.js").exists());
        assert!(temp.path().join("0.js.map").exists());
        let mapping = MappingArtifact::load(temp.path().join("mappings.json")).unwrap();
        assert_eq!(mapping.get("a.js").unwrap(), &["0.js".to_string()]);

        let leftovers = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let temp = tempfile::TempDir::new().unwrap();
        write_build_to(&output(), temp.path(), "mappings.json", false).unwrap();

        let err = write_build_to(&output(), temp.path(), "mappings.json", false).unwrap_err();
        assert!(matches!(err, Error::OutputExists(_)));

        write_build_to(&output(), temp.path(), "mappings.json", true).unwrap();
    }
}
