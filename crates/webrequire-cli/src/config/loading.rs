use crate::cli::BuildArgs;
use crate::config::{CONFIG_FILE_NAME, WebrequireConfig};
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use webrequire_bundler::{MinifyLevel, PackNaming};

/// Flags the user actually passed. Unset flags leave lower layers alone.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modules_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    smart_packing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pack_naming: Option<PackNaming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sourcemap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minify_runtime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mappings_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    force: Option<bool>,
}

impl CliOverrides {
    fn from_build_args(args: &BuildArgs) -> Self {
        Self {
            files: (!args.files.is_empty()).then(|| args.files.clone()),
            base: args.base.clone(),
            out_dir: args.out_dir.clone(),
            modules_dir: args.modules_dir.clone(),
            entries: (!args.entry.is_empty()).then(|| args.entry.clone()),
            smart_packing: args.no_smart_packing.then_some(false),
            pack_naming: args.naming.map(Into::into),
            sourcemap: args.no_sourcemap.then_some(false),
            minify_runtime: args
                .minify_runtime
                .map(|level| MinifyLevel::from(level).to_string()),
            mappings_file: args.mappings_file.clone(),
            force: args.force.then_some(true),
        }
    }
}

impl WebrequireConfig {
    /// Load configuration from every layer.
    ///
    /// An explicit `--config` must exist; the default file is optional.
    pub fn load(args: &BuildArgs, cwd: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match &args.config {
            Some(path) => {
                let path = crate::commands::utils::resolve_path(path, cwd);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let path = cwd.join(CONFIG_FILE_NAME);
                path.is_file().then_some(path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Json::file(path));
        }

        // WEBREQUIRE_OUT_DIR, WEBREQUIRE_SMART_PACKING, ...
        figment = figment.merge(Env::prefixed("WEBREQUIRE_"));

        figment = figment.merge(Serialized::defaults(CliOverrides::from_build_args(args)));

        figment.extract().map_err(|e| {
            ConfigError::InvalidValue {
                field: "configuration".to_string(),
                value: e.to_string(),
                hint: format!("Check {} syntax and field types", CONFIG_FILE_NAME),
            }
            .into()
        })
    }
}
