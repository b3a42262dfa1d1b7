use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Canonical identity of a file in the bundle's output namespace.
///
/// The identity is the file's path relative to the shared base directory,
/// always using `/` as separator (`lib/util.js`, `module/jquery/dist/jquery.js`).
/// It doubles as the name a module registers itself under in the browser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(String);

impl FileId {
    /// Build an identity from a path relative to the base directory.
    ///
    /// `.` components are dropped. `..`, root and prefix components are
    /// rejected because an identity can never point above the base.
    pub fn from_relative(path: impl AsRef<Path>) -> Result<Self, FileIdError> {
        let path = path.as_ref();
        let mut segments = Vec::new();

        for component in path.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment
                        .to_str()
                        .ok_or_else(|| FileIdError::NonUtf8(path.to_path_buf()))?;
                    segments.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(FileIdError::NotRelative(path.to_path_buf()));
                }
            }
        }

        if segments.is_empty() {
            return Err(FileIdError::Empty);
        }

        Ok(Self(segments.join("/")))
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join the identity onto a directory.
    pub fn to_path(&self, base: &Path) -> PathBuf {
        self.0.split('/').fold(base.to_path_buf(), |acc, s| acc.join(s))
    }

    /// The identity with `.ts` in place of its extension.
    pub fn typescript_variant(&self) -> Option<String> {
        let (stem, ext) = self.0.rsplit_once('.')?;
        if ext == "ts" || ext.contains('/') || stem.ends_with('/') || stem.is_empty() {
            return None;
        }
        Some(format!("{stem}.ts"))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for FileId {
    type Err = FileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_relative(s.replace('\\', "/"))
    }
}

impl Serialize for FileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors produced when deriving a [`FileId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileIdError {
    #[error("file identity cannot be empty")]
    Empty,

    #[error("file identity must be relative to the base directory: '{0}'")]
    NotRelative(PathBuf),

    #[error("file identity is not valid UTF-8: '{0}'")]
    NonUtf8(PathBuf),
}
