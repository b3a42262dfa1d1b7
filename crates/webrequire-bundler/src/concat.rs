//! Joining text parts into one artifact with a merged source map.
//!
//! Parts are joined on line boundaries: when a part does not end with a
//! newline one is inserted before the next part. Every part therefore starts
//! at column 0 and merging maps is a matter of line offsets.

use std::sync::Arc;

use oxc_sourcemap::{ConcatSourceMapBuilder, SourceMap, SourceMapBuilder};
use serde_json::Value;
use webrequire_graph::FileId;

use crate::{Error, Result};

/// One piece of an artifact.
#[derive(Debug, Clone)]
pub struct ConcatPart {
    pub text: Arc<str>,
    pub source_map: Option<Arc<SourceMap>>,
    /// Output-relative name of the file the text comes from. Unnamed parts
    /// (prologues, wrapper lines) only ever contribute lines.
    pub name: Option<String>,
}

impl ConcatPart {
    /// A part that is never source mapped.
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            source_map: None,
            name: None,
        }
    }

    pub fn named(text: impl Into<Arc<str>>, name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_map: None,
            name: Some(name.into()),
        }
    }

    pub fn with_source_map(mut self, map: Option<Arc<SourceMap>>) -> Self {
        self.source_map = map;
        self
    }
}

/// Joined text plus the merged map, if any part had one.
#[derive(Debug)]
pub struct ConcatResult {
    pub code: String,
    pub map: Option<SourceMap>,
}

impl ConcatResult {
    /// The merged map as JSON with its `file` set.
    pub fn map_json(&self, file: &str) -> Result<Option<String>> {
        let Some(map) = &self.map else {
            return Ok(None);
        };
        let mut json: Value = serde_json::from_str(&map.to_json_string())?;
        if let Some(object) = json.as_object_mut() {
            object.insert("file".to_string(), Value::String(file.to_string()));
        }
        Ok(Some(serde_json::to_string(&json)?))
    }
}

/// Concatenate `parts` into one artifact living in `artifact_dir`
/// (relative to the output root, `""` for the root itself).
///
/// No map is produced unless at least one part carries one. When one does,
/// named parts without a map get an identity map so their lines still point
/// at their own file; the sources of every map are made relative to
/// `artifact_dir`.
pub fn concat(parts: &[ConcatPart], artifact_dir: &str) -> Result<ConcatResult> {
    let mut builder = parts
        .iter()
        .any(|part| part.source_map.is_some())
        .then(ConcatSourceMapBuilder::default);

    let mut code = String::new();
    let mut line: u32 = 0;

    for part in parts {
        if !code.is_empty() && !code.ends_with('\n') {
            code.push('\n');
            line += 1;
        }

        if let Some(builder) = builder.as_mut() {
            if let Some(map) = part_map(part, artifact_dir)? {
                builder.add_sourcemap(&map, line);
            }
        }

        code.push_str(&part.text);
        line += count_lines(&part.text);
    }

    Ok(ConcatResult {
        code,
        map: builder.map(ConcatSourceMapBuilder::into_sourcemap),
    })
}

fn count_lines(text: &str) -> u32 {
    u32::try_from(text.bytes().filter(|b| *b == b'\n').count()).unwrap_or(u32::MAX)
}

fn part_map(part: &ConcatPart, artifact_dir: &str) -> Result<Option<SourceMap>> {
    match (&part.source_map, &part.name) {
        (Some(map), Some(name)) => fixup(map, name, artifact_dir).map(Some),
        (Some(map), None) => Ok(Some(SourceMap::clone(map))),
        (None, Some(name)) => Ok(Some(identity_map(&part.text, name, artifact_dir))),
        (None, None) => Ok(None),
    }
}

/// One token per line, mapping each line onto itself.
fn identity_map(text: &str, name: &str, artifact_dir: &str) -> SourceMap {
    let mut builder = SourceMapBuilder::default();
    let source_id = builder.set_source_and_content(&relative_to(artifact_dir, name), text);
    for (index, _) in text.lines().enumerate() {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        builder.add_token(index, 0, index, 0, Some(source_id), None);
    }
    builder.into_sourcemap()
}

/// Point the source matching `name` at the file relative to `artifact_dir`.
///
/// A map produced from a `.ts` file is matched through the `.ts` variant of
/// the name. A map without a matching source is kept as is.
fn fixup(map: &SourceMap, name: &str, artifact_dir: &str) -> Result<SourceMap> {
    let mut json: Value = serde_json::from_str(&map.to_json_string())?;

    let typescript = name
        .parse::<FileId>()
        .ok()
        .and_then(|id| id.typescript_variant());

    let Some(object) = json.as_object_mut() else {
        return Ok(map.clone());
    };

    let matched = object
        .get("sources")
        .and_then(Value::as_array)
        .and_then(|sources| {
            find_source(sources, name)
                .map(|index| (index, name.to_string()))
                .or_else(|| {
                    let variant = typescript?;
                    find_source(sources, &variant).map(|index| (index, variant))
                })
        });

    let Some((index, target)) = matched else {
        tracing::debug!(name, "source map has no matching source, left unmapped");
        return Ok(map.clone());
    };

    let source_root = object
        .remove("sourceRoot")
        .and_then(|root| root.as_str().map(str::to_string))
        .filter(|root| !root.is_empty());

    if let Some(sources) = object.get_mut("sources").and_then(Value::as_array_mut) {
        for (position, source) in sources.iter_mut().enumerate() {
            if position == index {
                *source = Value::String(relative_to(artifact_dir, &target));
            } else if let (Some(root), Some(path)) = (&source_root, source.as_str()) {
                *source = Value::String(format!("{}/{}", root.trim_end_matches('/'), path));
            }
        }
    }

    SourceMap::from_json_string(&json.to_string()).map_err(|e| Error::SourceMap(e.to_string()))
}

/// Index of the source naming `target`: as written, relative to the
/// directory of `target` (where a sibling map lives) or as a path suffix.
fn find_source(sources: &[Value], target: &str) -> Option<usize> {
    let dir = target.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    sources.iter().position(|source| {
        source.as_str().is_some_and(|source| {
            let source = source.trim_start_matches("./");
            source == target
                || join(dir, source).as_deref() == Some(target)
                || source.ends_with(&format!("/{target}"))
        })
    })
}

/// `dir/path` with `.` and `..` applied; `None` if it climbs above the root.
fn join(dir: &str, path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in dir.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// `target` as seen from `dir`; both are `/`-separated and relative to the
/// same root.
fn relative_to(dir: &str, target: &str) -> String {
    let segments = |path: &'_ str| -> Vec<String> {
        path.split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string)
            .collect()
    };
    let dir = segments(dir);
    let target = segments(target);

    let common = dir
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts = vec!["..".to_string(); dir.len() - common];
    parts.extend(target[common..].iter().cloned());
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with_sources(sources: &[&str], lines: u32) -> Arc<SourceMap> {
        let mut builder = SourceMapBuilder::default();
        let mut ids = Vec::new();
        for source in sources {
            ids.push(builder.set_source_and_content(source, ""));
        }
        for line in 0..lines {
            builder.add_token(line, 0, line, 0, Some(ids[0]), None);
        }
        Arc::new(builder.into_sourcemap())
    }

    fn sources_of(map: &SourceMap) -> Vec<String> {
        let json: Value = serde_json::from_str(&map.to_json_string()).unwrap();
        json["sources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn no_maps_means_no_joined_map() {
        let result = concat(
            &[ConcatPart::text("a\n"), ConcatPart::named("b", "b.js")],
            "",
        )
        .unwrap();
        assert_eq!(result.code, "a\nb");
        assert!(result.map.is_none());
        assert!(result.map_json("0.js").unwrap().is_none());
    }

    #[test]
    fn parts_start_on_their_own_line() {
        let result = concat(
            &[
                ConcatPart::text("one"),
                ConcatPart::text("two\n"),
                ConcatPart::text("three"),
            ],
            "",
        )
        .unwrap();
        assert_eq!(result.code, "one\ntwo\nthree");
    }

    #[test]
    fn unmapped_named_parts_keep_their_lines() {
        let mapped = ConcatPart::named("x;\ny;\n", "b.js")
            .with_source_map(Some(map_with_sources(&["b.js"], 2)));
        let result = concat(
            &[
                ConcatPart::text("prologue\n"),
                ConcatPart::named("a1;\na2;\n", "a.js"),
                mapped,
            ],
            "",
        )
        .unwrap();

        let map = result.map.expect("a map is produced");
        assert_eq!(sources_of(&map), vec!["a.js", "b.js"]);

        let lines: Vec<(u32, u32)> = map
            .get_tokens()
            .map(|token| (token.get_dst_line(), token.get_src_line()))
            .collect();
        assert_eq!(lines, vec![(1, 0), (2, 1), (3, 0), (4, 1)]);
    }

    #[test]
    fn sources_become_relative_to_the_artifact() {
        let part = ConcatPart::named("x;\n", "lib/a.js")
            .with_source_map(Some(map_with_sources(&["../src/lib/a.js", "vendor.js"], 1)));
        let result = concat(&[part], "packs").unwrap();
        assert_eq!(
            sources_of(&result.map.unwrap()),
            vec!["../lib/a.js", "vendor.js"]
        );
    }

    #[test]
    fn typescript_sources_are_found_through_the_ts_variant() {
        let part = ConcatPart::named("x;\n", "lib/a.js")
            .with_source_map(Some(map_with_sources(&["lib/a.ts"], 1)));
        let result = concat(&[part], "").unwrap();
        assert_eq!(sources_of(&result.map.unwrap()), vec!["lib/a.ts"]);
    }

    #[test]
    fn sources_relative_to_a_sibling_map_are_found() {
        let part = ConcatPart::named("x;\n", "lib/a.js")
            .with_source_map(Some(map_with_sources(&["a.ts"], 1)));
        let result = concat(&[part], "").unwrap();
        assert_eq!(sources_of(&result.map.unwrap()), vec!["lib/a.ts"]);
    }

    #[test]
    fn unmatched_sources_are_tolerated() {
        let part = ConcatPart::named("x;\n", "a.js")
            .with_source_map(Some(map_with_sources(&["something-else.coffee"], 1)));
        let result = concat(&[part], "").unwrap();
        assert_eq!(
            sources_of(&result.map.unwrap()),
            vec!["something-else.coffee"]
        );
    }

    #[test]
    fn map_json_sets_file() {
        let part = ConcatPart::named("x;\n", "a.js")
            .with_source_map(Some(map_with_sources(&["a.js"], 1)));
        let result = concat(&[part], "").unwrap();
        let json: Value = serde_json::from_str(&result.map_json("0.js").unwrap().unwrap()).unwrap();
        assert_eq!(json["file"], "0.js");
    }

    #[test]
    fn relative_paths() {
        assert_eq!(relative_to("", "a/b.js"), "a/b.js");
        assert_eq!(relative_to("a", "a/b.js"), "b.js");
        assert_eq!(relative_to("x/y", "a/b.js"), "../../a/b.js");
        assert_eq!(join("lib", "../a.js").as_deref(), Some("a.js"));
        assert_eq!(join("", "../a.js"), None);
    }
}
