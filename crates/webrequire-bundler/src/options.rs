//! Build options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use webrequire_graph::DEFAULT_MODULES_DIR;

use crate::minify::MinifyLevel;
use crate::{Error, Result};

/// How packs are named in the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackNaming {
    /// Base62 index of the pack: `0.js`, `1.js`, ... `Z.js`, `10.js`.
    #[default]
    Position,
    /// First 16 hex characters of the blake3 hash of the pack text.
    ContentHash,
}

impl PackNaming {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "position" => Ok(Self::Position),
            "content-hash" | "hash" => Ok(Self::ContentHash),
            _ => Err(Error::InvalidConfig(format!(
                "Invalid pack naming: '{}'. Expected: position, content-hash",
                s
            ))),
        }
    }
}

impl std::fmt::Display for PackNaming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::ContentHash => write!(f, "content-hash"),
        }
    }
}

/// Options of a [`Project`](crate::Project).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectOptions {
    /// Root of the output namespace. Every source must live below it.
    pub base_dir: PathBuf,
    /// Directory (inside the namespace) that external modules are emitted to.
    pub modules_dir: String,
    /// Files that get their own pack even when something requires them.
    pub entries: Vec<String>,
    pub smart_packing: bool,
    pub pack_naming: PackNaming,
    pub sourcemap: bool,
    #[serde(with = "minify_level")]
    pub minify_runtime: MinifyLevel,
    /// File name of the mapping artifact inside the output directory.
    pub mappings_file: String,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            modules_dir: DEFAULT_MODULES_DIR.to_string(),
            entries: Vec::new(),
            smart_packing: true,
            pack_naming: PackNaming::default(),
            sourcemap: true,
            minify_runtime: MinifyLevel::None,
            mappings_file: "mappings.json".to_string(),
        }
    }
}

impl ProjectOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Check the options before a project is created.
    pub fn validate(&self) -> Result<()> {
        let modules_dir = self.modules_dir.trim_matches('/');
        if modules_dir.is_empty() {
            return Err(Error::InvalidConfig("modulesDir must not be empty".into()));
        }
        if modules_dir
            .split('/')
            .any(|segment| segment == ".." || segment == "." || segment.is_empty())
            || modules_dir.contains('\\')
        {
            return Err(Error::InvalidConfig(format!(
                "modulesDir '{}' must be a plain relative directory",
                self.modules_dir
            )));
        }

        if self.mappings_file.is_empty()
            || self.mappings_file.contains('/')
            || self.mappings_file.contains('\\')
        {
            return Err(Error::InvalidConfig(format!(
                "mappingsFile '{}' must be a plain file name",
                self.mappings_file
            )));
        }

        for entry in &self.entries {
            if entry.is_empty() || entry.starts_with('/') || entry.split('/').any(|s| s == "..") {
                return Err(Error::InvalidConfig(format!(
                    "entry '{}' must be a path relative to the base directory",
                    entry
                )));
            }
        }

        Ok(())
    }
}

mod minify_level {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use crate::minify::MinifyLevel;

    pub fn serialize<S: Serializer>(level: &MinifyLevel, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(level)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MinifyLevel, D::Error> {
        let value = String::deserialize(deserializer)?;
        MinifyLevel::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ProjectOptions::new("/app");
        assert_eq!(options.modules_dir, "module");
        assert!(options.smart_packing);
        assert!(options.sourcemap);
        assert_eq!(options.pack_naming, PackNaming::Position);
        assert_eq!(options.mappings_file, "mappings.json");
        options.validate().unwrap();
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let options: ProjectOptions = serde_json::from_str(
            r#"{"baseDir": "src", "packNaming": "content-hash", "minifyRuntime": "full"}"#,
        )
        .unwrap();
        assert_eq!(options.base_dir, PathBuf::from("src"));
        assert_eq!(options.pack_naming, PackNaming::ContentHash);
        assert_eq!(options.minify_runtime, MinifyLevel::Full);
        assert!(options.smart_packing);
    }

    #[test]
    fn rejects_escaping_directories() {
        let mut options = ProjectOptions::new("/app");
        options.modules_dir = "../vendor".into();
        assert!(matches!(options.validate(), Err(Error::InvalidConfig(_))));

        let mut options = ProjectOptions::new("/app");
        options.mappings_file = "out/mappings.json".into();
        assert!(options.validate().is_err());

        let mut options = ProjectOptions::new("/app");
        options.entries = vec!["../a.js".into()];
        assert!(options.validate().is_err());
    }

    #[test]
    fn naming_parses() {
        assert_eq!(PackNaming::parse("hash").unwrap(), PackNaming::ContentHash);
        assert!(PackNaming::parse("random").is_err());
    }
}
