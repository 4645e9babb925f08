//! Integration tests for the `blockpm tree` command.

use predicates::prelude::*;

use crate::common::TestWorkspace;

#[test]
fn test_tree_shows_transitive_dependencies() {
    let ws = TestWorkspace::new();
    ws.publish();

    ws.blockpm("app")
        .args(["tree", "format/print"])
        .assert()
        .success()
        .stdout("format/print (github/acme/blocks)\n└── utils/math\n    └── utils/gcf\n");
}

#[test]
fn test_tree_marks_cycles() {
    let ws = TestWorkspace::new();
    ws.write("tree/blocks/cycle/a.ts", "import { b } from './b';\n")
        .write("tree/blocks/cycle/b.ts", "import { a } from './a';\n");
    ws.publish();

    ws.blockpm("app")
        .args(["tree", "cycle/a"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("└── cycle/a (see above)").and(predicate::str::contains("cycle: cycle/a → cycle/b")),
        );
}

#[test]
fn test_tree_unknown_block() {
    let ws = TestWorkspace::new();
    ws.publish();

    ws.blockpm("app").args(["tree", "nope/nothing"]).assert().failure();
}
