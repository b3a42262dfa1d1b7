//! `webrequire tags`: print the script tags for a set of entry files.

use std::path::{Path, PathBuf};

use webrequire_bundler::{MappingArtifact, TagGenerator, TemplateTag};

use crate::cli::TagsArgs;
use crate::commands::utils;
use crate::error::{Result, ResultExt};

/// Printed before the tags unless `--no-hint` is given.
pub const HINT: &str = "The dependencies of the given file(s) have been analyzed.\n\
                        Include the following <script> tags in the <head> section of your page:\n";

/// Mapping file used when `--mappings` is not given.
pub const DEFAULT_MAPPINGS: &str = "dist/mappings.json";

/// Execute the tags command. Tags go to stdout.
pub fn execute(args: TagsArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let path = mappings_path(&args, &cwd);
    let mapping = load_mapping(&path)?;

    println!("{}", render(&args, &mapping)?);
    Ok(())
}

fn mappings_path(args: &TagsArgs, cwd: &Path) -> PathBuf {
    let path = args
        .mappings
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MAPPINGS));
    utils::resolve_path(&path, cwd)
}

fn load_mapping(path: &Path) -> Result<MappingArtifact> {
    let text = std::fs::read_to_string(path)
        .with_path(path)
        .with_hint("Run 'webrequire build' first or point --mappings at its mapping file")?;
    Ok(MappingArtifact::from_json(&text)?)
}

/// Everything `tags` prints: the hint, the inline snippet and the tags.
pub fn render(args: &TagsArgs, mapping: &MappingArtifact) -> Result<String> {
    let mut generator = TagGenerator::new()
        .prefix(args.prefix.clone().unwrap_or_else(|| "/".to_string()))
        .suffix(args.suffix.clone().unwrap_or_default())
        .inline_snippet(!args.no_snippet);
    if let Some(template) = &args.tag_template {
        generator = generator.formatter(TemplateTag::new(template.clone()));
    }

    let tags = generator.generate(mapping, &args.entries)?;
    tracing::debug!(entries = args.entries.len(), "tags generated");

    if args.no_hint {
        Ok(tags)
    } else {
        Ok(format!("{}\n{}", HINT, tags))
    }
}
