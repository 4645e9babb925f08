//! Integration tests for the `blockpm build` command.

use predicates::prelude::*;
use serde_json::Value;

use crate::common::TestWorkspace;

fn block<'a>(manifest: &'a Value, category: &str, name: &str) -> &'a Value {
    manifest
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == category)
        .and_then(|c| c["blocks"].as_array().unwrap().iter().find(|b| b["name"] == name))
        .unwrap_or_else(|| panic!("block {category}/{name} missing"))
}

#[test]
fn test_build_writes_manifest() {
    let ws = TestWorkspace::new();

    ws.blockpm("tree")
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Published 4 blocks in 2 categories"));

    let manifest: Value = serde_json::from_str(&ws.read("tree/blockpm-manifest.json")).unwrap();

    let math = block(&manifest, "utils", "math");
    assert_eq!(math["directory"], "blocks/utils/math");
    assert_eq!(math["subdirectory"], true);
    assert_eq!(math["localDependencies"], serde_json::json!(["utils/gcf"]));
    assert_eq!(math["_imports_"]["../gcf"], "{{utils/gcf}}");

    let print = block(&manifest, "format", "print");
    assert_eq!(print["dependencies"], serde_json::json!(["clsx@2.1.0"]));
    assert_eq!(print["_imports_"]["../utils/math/add"], "{{utils/math}}/add");

    let gcf = block(&manifest, "utils", "gcf");
    assert_eq!(gcf["tests"], true);
    assert_eq!(gcf["files"], serde_json::json!(["gcf.ts", "gcf.test.ts"]));
    assert_eq!(gcf["devDependencies"], serde_json::json!([]));

    assert_eq!(block(&manifest, "utils", "internal")["list"], false);
}

#[test]
fn test_build_is_deterministic() {
    let ws = TestWorkspace::new();
    ws.publish();
    let first = ws.read("tree/blockpm-manifest.json");
    ws.publish();
    assert_eq!(first, ws.read("tree/blockpm-manifest.json"));
}

#[test]
fn test_build_dry_run_prints_manifest() {
    let ws = TestWorkspace::new();

    ws.blockpm("tree")
        .args(["build", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"_imports_\""));
    assert!(!ws.path("tree/blockpm-manifest.json").exists());
}

#[test]
fn test_build_rejects_escaping_reference() {
    let ws = TestWorkspace::new();
    ws.write("tree/blocks/utils/leak.ts", "import { x } from '../../../outside/x';\n");

    ws.blockpm("tree")
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot resolve '../../../outside/x'"));
    assert!(!ws.path("tree/blockpm-manifest.json").exists());
}

#[test]
fn test_build_reports_parse_errors() {
    let ws = TestWorkspace::new();
    ws.write("tree/blocks/utils/broken.ts", "const ok = 1;\nconst s = 'unterminated;\n");

    ws.blockpm("tree")
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse").and(predicate::str::contains("broken.ts:2")));
}

#[test]
fn test_build_strict_rejects_nested_directories() {
    let ws = TestWorkspace::new();
    ws.write("tree/blocks/utils/math/nested/deep.ts", "export {};\n");

    ws.blockpm("tree").arg("build").assert().success();
    ws.blockpm("tree")
        .args(["build", "--strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported layout in block 'utils/math'"));
}

#[test]
fn test_build_without_config() {
    let ws = TestWorkspace::new();
    std::fs::create_dir_all(ws.path("elsewhere")).unwrap();

    ws.blockpm("elsewhere")
        .args(["--config", "missing.toml", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("blockpm.toml not found"));
}
