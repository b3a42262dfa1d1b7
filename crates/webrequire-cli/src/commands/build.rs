//! `webrequire build`: pack sources and write the output directory.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use webrequire_bundler::{BuildOutput, NativeRuntime, Project};

use crate::cli::BuildArgs;
use crate::commands::utils;
use crate::config::WebrequireConfig;
use crate::error::{BuildError, Result};
use crate::ui;

/// Execute the build command.
///
/// 1. Load configuration (flags > env > file > defaults)
/// 2. Collect the source files
/// 3. Analyze every file, link and pack
/// 4. Write packs, maps and the mapping file
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start = Instant::now();
    let cwd = std::env::current_dir()?;

    let config = WebrequireConfig::load(&args, &cwd)?;
    config.validate()?;

    let output = build(&config, &cwd).await?;
    let out_dir = config.out_dir(&cwd);
    let written = output.write_to(&out_dir, &config.mappings_file, config.force)?;
    tracing::debug!(files = written.len(), "output written");

    for pack in &output.packs {
        ui::info(&format!(
            "{:<20} {:>3} files  {}",
            pack.name,
            pack.files.len(),
            ui::format_size(pack.code.len() as u64)
        ));
    }
    ui::success(&format!(
        "Wrote {} packs to {} in {}",
        output.packs.len(),
        out_dir.display(),
        ui::format_duration(start.elapsed())
    ));

    Ok(())
}

/// Run a build without touching the output directory.
pub async fn build(config: &WebrequireConfig, cwd: &Path) -> Result<BuildOutput> {
    let options = config.project_options(cwd)?;
    let out_dir = config.out_dir(cwd);
    if out_dir == options.base_dir {
        return Err(BuildError::OutputIsBase(out_dir).into());
    }

    let sources = utils::collect_sources(&config.files, cwd, &out_dir)?;
    ui::info(&format!(
        "Building {} files from {}",
        sources.len(),
        options.base_dir.display()
    ));

    let project = Project::new(options, Arc::new(NativeRuntime::new()))?;
    for source in &sources {
        let id = project.add_path(source).await?;
        tracing::debug!(file = %id, "analyzed");
    }

    Ok(project.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, contents: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn config(files: &[&str]) -> WebrequireConfig {
        WebrequireConfig {
            files: files.iter().map(PathBuf::from).collect(),
            base: Some(PathBuf::from("src")),
            ..WebrequireConfig::default()
        }
    }

    #[tokio::test]
    async fn test_build_shares_common_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/home.js", "var util = require('./util');");
        write(root, "src/about.js", "var util = require('./util');");
        write(root, "src/util.js", "module.exports = {};");

        let output = build(&config(&["src"]), root).await.unwrap();

        // about, home, util, loader
        assert_eq!(output.packs.len(), 4);
        let home = output.mapping.get("home.js").unwrap();
        let about = output.mapping.get("about.js").unwrap();
        let util = output.pack_containing(&"util.js".parse().unwrap()).unwrap();
        assert!(home.contains(&util.name));
        assert!(about.contains(&util.name));
    }

    #[tokio::test]
    async fn test_output_inside_base_is_refused() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/app.js", "");

        let mut config = config(&["src"]);
        config.out_dir = PathBuf::from("src");
        let err = build(&config, root).await.unwrap_err();
        assert!(matches!(err, crate::CliError::Build(BuildError::OutputIsBase(_))));
    }

    #[tokio::test]
    async fn test_missing_requirement_fails_the_build() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/app.js", "require('./gone')");

        let err = build(&config(&["src"]), root).await.unwrap_err();
        assert!(matches!(
            err,
            crate::CliError::Bundler(webrequire_bundler::Error::Graph(
                webrequire_bundler::GraphError::UnresolvedRequirement { .. }
            ))
        ));
    }
}
