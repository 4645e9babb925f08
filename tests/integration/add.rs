//! Integration tests for the `blockpm add` command.

use predicates::prelude::*;

use crate::common::TestWorkspace;

#[test]
fn test_add_installs_closure_with_rewritten_references() {
    let ws = TestWorkspace::new();
    ws.publish();

    ws.blockpm("app")
        .args(["add", "format/print"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Resolved 3 blocks (1 requested, 2 dependencies)")
                .and(predicate::str::contains("clsx@2.1.0")),
        );

    assert_eq!(
        ws.read("app/src/blocks/format/print.ts"),
        "import { add } from '../../lib/utils/math/add';\nimport clsx from 'clsx';\nexport const print = () => clsx(add(1, 2));\n"
    );
    assert_eq!(ws.read("app/src/lib/utils/math/index.ts"), "export * from './add';\nexport { gcf } from '../gcf';\n");
    assert!(ws.path("app/src/lib/utils/math/add.ts").is_file());
    assert!(ws.path("app/src/lib/utils/gcf.ts").is_file());
    assert!(!ws.path("app/src/lib/utils/gcf.test.ts").exists());
}

#[test]
fn test_add_with_tests() {
    let ws = TestWorkspace::new();
    ws.publish();

    ws.blockpm("app").args(["add", "utils/gcf", "--include-tests"]).assert().success();
    assert!(ws.path("app/src/lib/utils/gcf.test.ts").is_file());
}

#[test]
fn test_add_qualified_specifier() {
    let ws = TestWorkspace::new();
    ws.publish();

    ws.blockpm("app").args(["add", "github/acme/blocks/utils/math"]).assert().success();
    assert!(ws.path("app/src/lib/utils/math/index.ts").is_file());
    assert!(ws.path("app/src/lib/utils/gcf.ts").is_file());
}

#[test]
fn test_add_unknown_block_suggests_alternatives() {
    let ws = TestWorkspace::new();
    ws.publish();

    ws.blockpm("app")
        .args(["add", "utils/mth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Block 'utils/mth' not found").and(predicate::str::contains("utils/math")));
    assert!(!ws.path("app/src").exists());
}

#[test]
fn test_add_dry_run_writes_nothing() {
    let ws = TestWorkspace::new();
    ws.publish();

    ws.blockpm("app")
        .args(["add", "utils/math", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would write src/lib/utils/math/index.ts"));
    assert!(!ws.path("app/src").exists());
}

#[test]
fn test_add_keeps_existing_files() {
    let ws = TestWorkspace::new();
    ws.publish();
    ws.write("app/src/lib/utils/gcf.ts", "// local edits\n");

    ws.blockpm("app")
        .args(["add", "utils/gcf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped src/lib/utils/gcf.ts (exists)"));
    assert_eq!(ws.read("app/src/lib/utils/gcf.ts"), "// local edits\n");

    ws.blockpm("app").args(["add", "utils/gcf", "--overwrite"]).assert().success();
    assert!(ws.read("app/src/lib/utils/gcf.ts").starts_with("export const gcf"));
}

#[test]
fn test_add_cyclic_blocks() {
    let ws = TestWorkspace::new();
    ws.write("tree/blocks/cycle/a.ts", "import { b } from './b';\nexport const a = 1;\n")
        .write("tree/blocks/cycle/b.ts", "import { a } from './a';\nexport const b = 2;\n");
    ws.publish();

    ws.blockpm("app")
        .args(["add", "cycle/a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolved 2 blocks"));
    assert_eq!(ws.read("app/src/blocks/cycle/a.ts"), "import { b } from './b';\nexport const a = 1;\n");
}

#[test]
fn test_add_requires_default_path() {
    let ws = TestWorkspace::new();
    ws.publish();
    ws.write(
        "app/blockpm.toml",
        "repos = [\"github/acme/blocks\"]\n[paths]\nutils = \"./src/utils\"\n[trees]\n\"github/acme/blocks\" = \"../tree\"\n",
    );

    ws.blockpm("app")
        .args(["add", "utils/gcf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("default \"*\" entry"));
}

#[test]
fn test_add_with_explicit_config() {
    let ws = TestWorkspace::new();
    ws.publish();

    let config = ws.path("app/blockpm.toml");
    ws.blockpm("tree")
        .arg("--config")
        .arg(&config)
        .args(["add", "utils/gcf", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(ws.root().join("app/src/lib/utils/gcf.ts").is_file());
}
