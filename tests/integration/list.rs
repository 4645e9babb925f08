//! Integration tests for the `blockpm list` command.

use predicates::prelude::*;
use serde_json::Value;

use crate::common::TestWorkspace;

#[test]
fn test_list_hides_unlisted_blocks() {
    let ws = TestWorkspace::new();
    ws.publish();

    ws.blockpm("app")
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("utils (github/acme/blocks)")
                .and(predicate::str::contains("math → utils/gcf"))
                .and(predicate::str::contains("internal").not()),
        );

    ws.blockpm("app").args(["list", "--all"]).assert().success().stdout(predicate::str::contains("internal"));
}

#[test]
fn test_list_json() {
    let ws = TestWorkspace::new();
    ws.publish();

    let output = ws.blockpm("app").args(["list", "--format", "json", "--category", "utils"]).output().unwrap();
    assert!(output.status.success());

    let entries: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = entries.as_array().unwrap().iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["github/acme/blocks/utils/gcf", "github/acme/blocks/utils/math"]);
}

#[test]
fn test_list_without_published_manifest() {
    let ws = TestWorkspace::new();

    ws.blockpm("app")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("blockpm-manifest.json"));
}

#[test]
fn test_list_unconfigured_tree() {
    let ws = TestWorkspace::new();
    ws.publish();
    ws.write("app/blockpm.toml", "repos = [\"github/acme/other\"]\n[paths]\n\"*\" = \"./src\"\n");

    ws.blockpm("app")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Tree 'github/acme/other' is not configured"));
}
