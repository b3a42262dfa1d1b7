//! Specifier resolution.
//!
//! A specifier is either relative (`./x`, `../x`) or bare (`left-pad`,
//! `jquery/dist/jquery`). Relative specifiers are joined onto the requiring
//! file's directory; bare ones go through the runtime's package lookup and
//! are re-homed under the modules directory of the output namespace.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;

use crate::file_id::FileId;
use crate::runtime::{Runtime, RuntimeError};
use crate::{Error, Result};

/// Classification of a raw specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// Begins with a `.` or `..` segment.
    Relative,
    /// Resolved through `node_modules`.
    External,
}

impl SpecifierKind {
    /// Classify a specifier. Absolute and empty specifiers are invalid.
    pub fn of(specifier: &str, origin: &Path) -> Result<Self> {
        if specifier.is_empty()
            || specifier.starts_with('/')
            || specifier.starts_with('\\')
            || Path::new(specifier).is_absolute()
        {
            return Err(Error::InvalidSpecifier {
                specifier: specifier.to_string(),
                origin: origin.to_path_buf(),
            });
        }

        let first = specifier.split(['/', '\\']).next().unwrap_or_default();
        if first == "." || first == ".." {
            Ok(Self::Relative)
        } else {
            Ok(Self::External)
        }
    }
}

/// A resolved requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// The specifier exactly as written.
    pub mention: String,
    /// Absolute path of the file containing the specifier.
    pub origin_path: PathBuf,
    /// Absolute path of the dependency on disk.
    pub resolved_source_path: PathBuf,
    pub is_external: bool,
    /// Whether `index` was inserted before extension inference.
    pub is_directory_import: bool,
    /// Identity of the dependency in the output namespace.
    pub final_output_path: FileId,
}

impl FileDescriptor {
    /// The `[mention, final name]` pair carried by the module wrapper.
    pub fn wrapper_pair(&self) -> (String, String) {
        (
            self.mention.clone(),
            self.final_output_path.as_str().to_string(),
        )
    }

    fn mention_has_extension(&self) -> bool {
        has_extension(&self.mention)
    }
}

/// Resolves specifiers against one base directory.
#[derive(Debug, Clone)]
pub struct SpecifierResolver {
    base_dir: PathBuf,
    modules_dir: String,
    runtime: Arc<dyn Runtime>,
}

impl SpecifierResolver {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        modules_dir: impl Into<String>,
        runtime: Arc<dyn Runtime>,
    ) -> Self {
        Self {
            base_dir: base_dir.into().clean(),
            modules_dir: modules_dir.into().trim_matches('/').to_string(),
            runtime,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn modules_dir(&self) -> &str {
        &self.modules_dir
    }

    /// Identity of an absolute (or base-relative) path.
    ///
    /// Fails with [`Error::OutsideBase`] when the path escapes the base.
    pub fn identity_of(&self, path: &Path) -> Result<FileId> {
        let absolute = if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.base_dir.join(path).clean()
        };

        let relative = absolute
            .strip_prefix(&self.base_dir)
            .map_err(|_| Error::OutsideBase {
                path: absolute.clone(),
                base: self.base_dir.clone(),
            })?;

        Ok(FileId::from_relative(relative)?)
    }

    /// Resolve `specifier` as written in `origin`.
    pub fn resolve(&self, origin: &Path, specifier: &str) -> Result<FileDescriptor> {
        match SpecifierKind::of(specifier, origin)? {
            SpecifierKind::Relative => self.resolve_relative(origin, specifier, false),
            SpecifierKind::External => self.resolve_external(origin, specifier),
        }
    }

    /// Re-resolve a relative requirement as a directory import (`<path>/index.js`).
    ///
    /// Only valid for relative specifiers written without an extension.
    pub fn resolve_directory(&self, descriptor: &FileDescriptor) -> Result<FileDescriptor> {
        if descriptor.is_external || descriptor.mention_has_extension() {
            return Err(Error::UnresolvedRequirement {
                from: self.identity_of(&descriptor.origin_path)?,
                specifier: descriptor.mention.clone(),
            });
        }
        self.resolve_relative(&descriptor.origin_path, &descriptor.mention, true)
    }

    fn resolve_relative(
        &self,
        origin: &Path,
        specifier: &str,
        is_directory_import: bool,
    ) -> Result<FileDescriptor> {
        let origin_dir = origin.parent().unwrap_or(&self.base_dir);
        let mut resolved = origin_dir.join(specifier);
        if is_directory_import {
            resolved.push("index");
        }
        if !has_extension(resolved.to_string_lossy().as_ref()) {
            resolved.set_extension("js");
        }
        let resolved = resolved.clean();

        if resolved == origin.to_path_buf().clean() {
            return Err(Error::SelfReference {
                specifier: specifier.to_string(),
                origin: origin.to_path_buf(),
            });
        }

        let final_output_path = self.identity_of(&resolved)?;

        Ok(FileDescriptor {
            mention: specifier.to_string(),
            origin_path: origin.to_path_buf(),
            resolved_source_path: resolved,
            is_external: false,
            is_directory_import,
            final_output_path,
        })
    }

    fn resolve_external(&self, origin: &Path, specifier: &str) -> Result<FileDescriptor> {
        let resolved = self.runtime.resolve(specifier, origin)?;

        if resolved.as_os_str() == specifier {
            return Err(Error::SelfReference {
                specifier: specifier.to_string(),
                origin: origin.to_path_buf(),
            });
        }

        let package_path = after_node_modules(&resolved).ok_or_else(|| {
            RuntimeError::ResolutionFailed {
                specifier: specifier.to_string(),
                from: origin.to_path_buf(),
                reason: format!(
                    "resolved to '{}', which is not inside a node_modules directory",
                    resolved.display()
                ),
            }
        })?;

        let final_output_path =
            FileId::from_relative(Path::new(&self.modules_dir).join(package_path))?;

        Ok(FileDescriptor {
            mention: specifier.to_string(),
            origin_path: origin.to_path_buf(),
            resolved_source_path: resolved,
            is_external: true,
            is_directory_import: false,
            final_output_path,
        })
    }
}

/// The part of `path` after its last `node_modules` component.
fn after_node_modules(path: &Path) -> Option<PathBuf> {
    let components: Vec<Component<'_>> = path.components().collect();
    let index = components
        .iter()
        .rposition(|c| c.as_os_str() == "node_modules")?;
    let rest: PathBuf = components[index + 1..].iter().collect();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Whether the last segment of a `/`-separated path carries an extension.
fn has_extension(path: &str) -> bool {
    let name = path.rsplit(['/', '\\']).next().unwrap_or_default();
    if name == "." || name == ".." {
        return false;
    }
    Path::new(name).extension().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestRuntime;

    fn resolver() -> SpecifierResolver {
        let runtime = TestRuntime::new("/project")
            .with_file("/project/node_modules/left-pad/index.js", "")
            .with_file("/elsewhere/vendor.js", "");
        SpecifierResolver::new("/project/src", "module", Arc::new(runtime))
    }

    #[test]
    fn classifies_specifiers() {
        let origin = Path::new("/project/src/a.js");
        assert_eq!(SpecifierKind::of("./b", origin).unwrap(), SpecifierKind::Relative);
        assert_eq!(SpecifierKind::of("../b", origin).unwrap(), SpecifierKind::Relative);
        assert_eq!(SpecifierKind::of("left-pad", origin).unwrap(), SpecifierKind::External);
        assert_eq!(SpecifierKind::of(".hidden", origin).unwrap(), SpecifierKind::External);
        assert!(matches!(
            SpecifierKind::of("/etc/passwd", origin),
            Err(Error::InvalidSpecifier { .. })
        ));
        assert!(matches!(
            SpecifierKind::of("", origin),
            Err(Error::InvalidSpecifier { .. })
        ));
    }

    #[test]
    fn appends_js_to_extensionless_relative_specifiers() {
        let d = resolver().resolve(Path::new("/project/src/lib/a.js"), "../b").unwrap();
        assert_eq!(d.resolved_source_path, PathBuf::from("/project/src/b.js"));
        assert_eq!(d.final_output_path.as_str(), "b.js");
        assert!(!d.is_external);
        assert_eq!(d.wrapper_pair(), ("../b".to_string(), "b.js".to_string()));
    }

    #[test]
    fn keeps_explicit_extensions() {
        let d = resolver().resolve(Path::new("/project/src/a.js"), "./data.json").unwrap();
        assert_eq!(d.final_output_path.as_str(), "data.json");
    }

    #[test]
    fn rejects_paths_outside_base() {
        let err = resolver()
            .resolve(Path::new("/project/src/a.js"), "../../secret")
            .unwrap_err();
        assert!(matches!(err, Error::OutsideBase { .. }));
    }

    #[test]
    fn rejects_self_reference() {
        let err = resolver()
            .resolve(Path::new("/project/src/a.js"), "./a")
            .unwrap_err();
        assert!(matches!(err, Error::SelfReference { .. }));

        let err = resolver()
            .resolve(Path::new("/project/src/a.js"), "fs")
            .unwrap_err();
        assert!(matches!(err, Error::SelfReference { .. }));
    }

    #[test]
    fn maps_externals_into_modules_dir() {
        let d = resolver().resolve(Path::new("/project/src/a.js"), "left-pad").unwrap();
        assert!(d.is_external);
        assert_eq!(d.final_output_path.as_str(), "module/left-pad/index.js");
        assert_eq!(
            d.resolved_source_path,
            PathBuf::from("/project/node_modules/left-pad/index.js")
        );
    }

    #[test]
    fn directory_fallback_inserts_index() {
        let r = resolver();
        let plain = r.resolve(Path::new("/project/src/a.js"), "./widgets").unwrap();
        assert_eq!(plain.final_output_path.as_str(), "widgets.js");

        let dir = r.resolve_directory(&plain).unwrap();
        assert!(dir.is_directory_import);
        assert_eq!(dir.final_output_path.as_str(), "widgets/index.js");
        assert_eq!(dir.mention, "./widgets");
    }

    #[test]
    fn directory_fallback_requires_extensionless_mention() {
        let r = resolver();
        let plain = r.resolve(Path::new("/project/src/a.js"), "./widgets.js").unwrap();
        assert!(matches!(
            r.resolve_directory(&plain),
            Err(Error::UnresolvedRequirement { .. })
        ));
    }

    #[test]
    fn identity_of_rejects_foreign_paths() {
        let r = resolver();
        assert_eq!(
            r.identity_of(Path::new("/project/src/x/y.js")).unwrap().as_str(),
            "x/y.js"
        );
        assert!(matches!(
            r.identity_of(Path::new("/elsewhere/vendor.js")),
            Err(Error::OutsideBase { .. })
        ));
    }

    #[test]
    fn finds_path_after_last_node_modules() {
        let p = Path::new("/a/node_modules/x/node_modules/y/lib/y.js");
        assert_eq!(after_node_modules(p), Some(PathBuf::from("y/lib/y.js")));
        assert_eq!(after_node_modules(Path::new("/a/b.js")), None);
    }
}
