//! Full builds against the real filesystem.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use webrequire_bundler::{
    MappingArtifact, NativeRuntime, PackNaming, Project, ProjectOptions, TagGenerator,
};

fn write(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn sources(root: &Path) {
    write(root, "src/app.js", "var widgets = require('./widgets');\nwidgets.render();\n");
    write(root, "src/admin.js", "var util = require('./lib/util');\n");
    write(root, "src/widgets/index.js", "var util = require('../lib/util');\nmodule.exports = { render: util };\n");
    write(root, "src/lib/util.js", "module.exports = function () {};\n");
}

async fn build(root: &Path, options: ProjectOptions) -> webrequire_bundler::BuildOutput {
    let project = Project::new(options, Arc::new(NativeRuntime::new())).unwrap();
    for file in ["app.js", "admin.js", "widgets/index.js", "lib/util.js"] {
        project.add_path(root.join("src").join(file)).await.unwrap();
    }
    project.build().unwrap()
}

#[tokio::test]
async fn build_writes_packs_and_mapping() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    sources(root);

    let output = build(root, ProjectOptions::new(root.join("src"))).await;
    let out_dir = root.join("dist");
    let written = output.write_to(&out_dir, "mappings.json", false).unwrap();
    assert_eq!(written.len(), output.packs.len() + 1);

    let mapping = MappingArtifact::load(out_dir.join("mappings.json")).unwrap();
    for pack in mapping.related_packs(&["app.js"]).unwrap() {
        assert!(out_dir.join(&pack).exists(), "{pack} was written");
    }

    // the directory import was linked to its index file
    let app_pack = fs::read_to_string(out_dir.join(&mapping.get("app.js").unwrap()[0])).unwrap();
    assert!(app_pack.contains("[[\"./widgets\",\"widgets/index.js\"]], \"app.js\""));

    let loader = fs::read_dir(&out_dir)
        .unwrap()
        .filter_map(|entry| fs::read_to_string(entry.unwrap().path()).ok())
        .filter(|text| text.contains("function registerModule("))
        .count();
    assert_eq!(loader, 1);
}

#[tokio::test]
async fn tags_come_from_the_written_mapping() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    sources(root);

    let mut options = ProjectOptions::new(root.join("src"));
    options.pack_naming = PackNaming::ContentHash;
    let output = build(root, options).await;
    output.write_to(root.join("dist"), "mappings.json", false).unwrap();

    let mapping = MappingArtifact::load(root.join("dist/mappings.json")).unwrap();
    let tags = TagGenerator::new()
        .prefix("/static")
        .inline_snippet(true)
        .generate(&mapping, &["app.js", "admin.js"])
        .unwrap();

    let lines: Vec<&str> = tags.lines().collect();
    assert!(lines[0].starts_with("<script>"));
    let expected = mapping.related_packs(&["app.js", "admin.js"]).unwrap();
    assert_eq!(lines.len(), expected.len() + 1);
    for (line, pack) in lines[1..].iter().zip(&expected) {
        assert_eq!(*line, format!("<script src=\"/static/{pack}\" async></script>"));
    }
}

#[tokio::test]
async fn sibling_source_maps_are_used() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    sources(root);
    write(
        root,
        "src/lib/util.js.map",
        r#"{"version":3,"sources":["util.ts"],"names":[],"mappings":"AAAA"}"#,
    );

    let output = build(root, ProjectOptions::new(root.join("src"))).await;
    let pack = output
        .pack_containing(&"lib/util.js".parse().unwrap())
        .unwrap();
    let map: serde_json::Value = serde_json::from_str(pack.map.as_deref().unwrap()).unwrap();
    assert_eq!(map["sources"][0], "lib/util.ts");
}
