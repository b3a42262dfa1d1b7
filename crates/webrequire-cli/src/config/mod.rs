//! Layered configuration for `webrequire build`.
//!
//! Priority: CLI flags > `WEBREQUIRE_*` environment variables >
//! `webrequire.config.json` > defaults

mod loading;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use webrequire_bundler::{MinifyLevel, PackNaming, ProjectOptions};

use crate::commands::utils::resolve_path;
use crate::error::{ConfigError, Result};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "webrequire.config.json";

/// Build configuration, as found in `webrequire.config.json`.
///
/// ```json
/// {
///   "files": ["src"],
///   "base": "src",
///   "out_dir": "public/js",
///   "entries": ["app.js"],
///   "pack_naming": "content-hash"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebrequireConfig {
    /// Source files or directories
    pub files: Vec<PathBuf>,

    /// Root of the output namespace (defaults to the working directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<PathBuf>,

    pub out_dir: PathBuf,
    pub modules_dir: String,
    pub entries: Vec<String>,
    pub smart_packing: bool,
    pub pack_naming: PackNaming,
    pub sourcemap: bool,

    /// none, whitespace or full
    pub minify_runtime: String,

    pub mappings_file: String,

    /// Replace existing output files
    pub force: bool,
}

impl Default for WebrequireConfig {
    fn default() -> Self {
        let project = ProjectOptions::default();
        Self {
            files: Vec::new(),
            base: None,
            out_dir: PathBuf::from("dist"),
            modules_dir: project.modules_dir,
            entries: Vec::new(),
            smart_packing: project.smart_packing,
            pack_naming: project.pack_naming,
            sourcemap: project.sourcemap,
            minify_runtime: project.minify_runtime.to_string(),
            mappings_file: project.mappings_file,
            force: false,
        }
    }
}

impl WebrequireConfig {
    /// Check what the bundler cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(ConfigError::MissingField {
                field: "files".to_string(),
                hint: "Pass source files or directories, e.g. 'webrequire build src'".to_string(),
            }
            .into());
        }
        self.minify_level()?;
        Ok(())
    }

    fn minify_level(&self) -> Result<MinifyLevel> {
        MinifyLevel::parse(&self.minify_runtime).map_err(|_| {
            ConfigError::InvalidValue {
                field: "minify_runtime".to_string(),
                value: self.minify_runtime.clone(),
                hint: "Use none, whitespace or full".to_string(),
            }
            .into()
        })
    }

    /// Base directory, absolute.
    pub fn base_dir(&self, cwd: &Path) -> PathBuf {
        match &self.base {
            Some(base) => resolve_path(base, cwd),
            None => cwd.to_path_buf(),
        }
    }

    /// Output directory, absolute.
    pub fn out_dir(&self, cwd: &Path) -> PathBuf {
        resolve_path(&self.out_dir, cwd)
    }

    /// Bundler options for this configuration.
    pub fn project_options(&self, cwd: &Path) -> Result<ProjectOptions> {
        Ok(ProjectOptions {
            base_dir: self.base_dir(cwd),
            modules_dir: self.modules_dir.clone(),
            entries: self.entries.clone(),
            smart_packing: self.smart_packing,
            pack_naming: self.pack_naming,
            sourcemap: self.sourcemap,
            minify_runtime: self.minify_level()?,
            mappings_file: self.mappings_file.clone(),
        })
    }
}
