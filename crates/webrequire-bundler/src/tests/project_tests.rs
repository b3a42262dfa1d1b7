//! Whole builds against an in-memory runtime.

use std::sync::Arc;

use serde_json::{Value, json};
use webrequire_graph::test_utils::TestRuntime;

use crate::assets::LOADER_SOURCE;
use crate::registry::{LocalRequire, ModuleRegistry};
use crate::wrapper::parse_wrapper_header;
use crate::{BuildOutput, Error, FileId, PackNaming, Project, ProjectOptions, SourceFile};

const INPUT_MAP: &str = r#"{"version":3,"sources":["lib/b.ts"],"names":[],"mappings":"AAAA;AACA"}"#;

fn id(s: &str) -> FileId {
    s.parse().expect("valid file id")
}

fn runtime() -> TestRuntime {
    TestRuntime::new("/app")
        .with_file("/app/a.js", "var b = require('./lib/b');\nmodule.exports = b + 1;\n")
        .with_file("/app/lib/b.js", "var c = require('../c');\nmodule.exports = c * 2;\n")
        .with_file("/app/c.js", "module.exports = 20;\n")
        .with_file("/app/d.js", "var c = require('./c');\nvar pad = require('left-pad');\n")
        .with_file("/app/node_modules/left-pad/index.js", "module.exports = 'pad';\n")
}

async fn project_with(options: ProjectOptions, runtime: TestRuntime) -> Project {
    let project = Project::new(options, Arc::new(runtime)).unwrap();
    for path in ["/app/a.js", "/app/lib/b.js", "/app/c.js", "/app/d.js"] {
        project.add_path(path).await.unwrap();
    }
    project
}

async fn default_build() -> BuildOutput {
    project_with(ProjectOptions::new("/app"), runtime())
        .await
        .build()
        .unwrap()
}

#[tokio::test]
async fn packs_are_wrapped_and_prefixed() {
    let output = default_build().await;

    let names: Vec<&str> = output.packs.iter().map(|pack| pack.name.as_str()).collect();
    assert_eq!(names, vec!["0.js", "1.js", "2.js", "3.js"]);

    let first = output.pack_containing(&id("a.js")).unwrap();
    assert_eq!(first.files, vec![id("a.js"), id("lib/b.js")]);
    assert!(first.code.starts_with("window.moduleQueue = window.moduleQueue || [];"));
    assert!(first.code.contains(
        "window.registerModule([[\"./lib/b\",\"lib/b.js\"]], \"a.js\", function (module, exports, require) {\nvar b = require('./lib/b');"
    ));
    assert!(first.map.is_none());

    let loader = output.pack_containing(&id("module/webrequire.js")).unwrap();
    assert_eq!(loader.files[0], id("module/webrequire.js"));
    assert!(loader.code.contains(LOADER_SOURCE));
    assert!(!loader.code.contains("\"module/webrequire.js\", function"));

    let external = output.pack_containing(&id("module/left-pad/index.js")).unwrap();
    assert!(external.code.contains("[], \"module/left-pad/index.js\", function"));
}

#[tokio::test]
async fn mapping_lists_every_needed_pack() {
    let output = default_build().await;
    let mapping = &output.mapping;

    let c_pack = output.pack_containing(&id("c.js")).unwrap().name.clone();
    let a_packs = mapping.get("a.js").unwrap();
    assert_eq!(a_packs[0], output.pack_containing(&id("a.js")).unwrap().name);
    assert!(a_packs.contains(&c_pack));

    let d_packs = mapping.get("d.js").unwrap();
    assert!(d_packs.contains(&c_pack));
    assert!(
        d_packs.contains(&output.pack_containing(&id("module/webrequire.js")).unwrap().name)
    );
    assert_eq!(mapping.len(), 6);
}

#[tokio::test]
async fn every_module_runs_once_whatever_the_pack_order() {
    let output = default_build().await;
    let mut registry = ModuleRegistry::new();

    let mut registrations = Vec::new();
    for pack in output.packs.iter().rev() {
        for line in pack.code.lines() {
            if let Some(registration) = parse_wrapper_header(line) {
                registrations.push(registration);
            }
        }
    }
    assert_eq!(registrations.len(), 5);

    for (requirements, name) in registrations.iter().cloned().chain(registrations.clone()) {
        let label = name.clone();
        registry.register(
            requirements,
            name,
            Box::new(move |require: &LocalRequire<'_>| {
                assert_eq!(require.module_name(), label);
                Value::String(label.clone())
            }),
        );
    }

    assert_eq!(registry.executions().len(), 5);
    assert!(registry.pending().is_empty());
    assert_eq!(registry.exports("a.js"), Some(&json!("a.js")));

    let order = registry.executions();
    let position = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(position("c.js") < position("lib/b.js"));
    assert!(position("lib/b.js") < position("a.js"));
}

#[tokio::test]
async fn input_source_maps_are_merged() {
    let runtime = runtime().with_file("/app/lib/b.js.map", INPUT_MAP);
    let output = project_with(ProjectOptions::new("/app"), runtime)
        .await
        .build()
        .unwrap();

    let pack = output.pack_containing(&id("lib/b.js")).unwrap();
    assert!(pack.code.ends_with(&format!("//# sourceMappingURL={}.map\n", pack.name)));

    let map: Value = serde_json::from_str(pack.map.as_deref().unwrap()).unwrap();
    assert_eq!(map["file"], json!(pack.name));
    let sources: Vec<&str> = map["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(sources, vec!["a.js", "lib/b.ts"]);

    let other = output.pack_containing(&id("c.js")).unwrap();
    assert!(other.map.is_none());
    assert!(!other.code.contains("sourceMappingURL"));
}

#[tokio::test]
async fn source_maps_can_be_switched_off() {
    let runtime = runtime().with_file("/app/lib/b.js.map", INPUT_MAP);
    let mut options = ProjectOptions::new("/app");
    options.sourcemap = false;

    let output = project_with(options, runtime).await.build().unwrap();
    assert!(output.packs.iter().all(|pack| pack.map.is_none()));
}

#[tokio::test]
async fn content_hash_names() {
    let mut options = ProjectOptions::new("/app");
    options.pack_naming = PackNaming::ContentHash;

    let output = project_with(options, runtime()).await.build().unwrap();
    for pack in &output.packs {
        let (hash, ext) = pack.name.split_once('.').unwrap();
        assert_eq!(ext, "js");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    let again = project_with(
        ProjectOptions {
            pack_naming: PackNaming::ContentHash,
            ..ProjectOptions::new("/app")
        },
        runtime(),
    )
    .await
    .build()
    .unwrap();
    let first: Vec<&str> = output.packs.iter().map(|p| p.name.as_str()).collect();
    let second: Vec<&str> = again.packs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn plain_packing_emits_one_pack_per_file() {
    let mut options = ProjectOptions::new("/app");
    options.smart_packing = false;

    let output = project_with(options, runtime()).await.build().unwrap();
    assert_eq!(output.packs.len(), 6);
    assert!(output.packs.iter().all(|pack| pack.files.len() == 1));
}

#[tokio::test]
async fn explicit_entries_are_honoured() {
    let mut options = ProjectOptions::new("/app");
    options.entries = vec!["./lib/b.js".into()];

    let output = project_with(options, runtime()).await.build().unwrap();
    assert_eq!(output.pack_containing(&id("lib/b.js")).unwrap().files, vec![id("lib/b.js")]);
}

#[tokio::test]
async fn missing_files_fail_the_build() {
    let project = Project::new(ProjectOptions::new("/app"), Arc::new(runtime())).unwrap();
    project.add_path("/app/a.js").await.unwrap();

    let err = project.build().unwrap_err();
    assert!(matches!(
        err,
        Error::Graph(webrequire_graph::Error::UnresolvedRequirement { ref specifier, .. })
            if specifier == "./lib/b"
    ));
}

#[tokio::test]
async fn rebuilds_reflect_updates() {
    let project = project_with(ProjectOptions::new("/app"), runtime()).await;
    project.build().unwrap();

    project
        .update(SourceFile::new("/app/d.js", "module.exports = 'no deps';"))
        .await
        .unwrap();
    let output = project.build().unwrap();

    assert!(output.pack_containing(&id("module/left-pad/index.js")).is_none());
    assert_eq!(output.pack_containing(&id("c.js")).unwrap().entry, id("a.js"));
}

#[tokio::test]
async fn unsupported_syntax_is_reported() {
    let project = Project::new(ProjectOptions::new("/app"), Arc::new(runtime())).unwrap();
    let err = project
        .update(SourceFile::new("/app/e.js", "import x from './x';"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Graph(webrequire_graph::Error::UnsupportedSyntax { .. })
    ));
    let code = miette::Diagnostic::code(&err).unwrap().to_string();
    assert_eq!(code, "UNSUPPORTED_SYNTAX");
}
