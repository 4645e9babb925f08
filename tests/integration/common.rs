//! Shared setup for CLI tests.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TREE_CONFIG: &str = r#"
[build]
dirs = ["./blocks"]
do-not-list-blocks = ["internal"]
"#;

pub const APP_CONFIG: &str = r#"
repos = ["github/acme/blocks"]

[paths]
"*" = "./src/blocks"
utils = "./src/lib/utils"

[trees]
"github/acme/blocks" = "../tree"
"#;

/// A block tree (`tree/`) and a consuming project (`app/`) in one temp dir.
pub struct TestWorkspace {
    temp: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let workspace = Self {
            temp: TempDir::new().unwrap(),
        };
        workspace
            .write("tree/blockpm.toml", TREE_CONFIG)
            .write("tree/package.json", r#"{"dependencies": {"clsx": "2.1.0"}, "devDependencies": {"vitest": "1.6.0"}}"#)
            .write("tree/blocks/utils/gcf.ts", "export const gcf = (a: number, b: number): number => (b ? gcf(b, a % b) : a);\n")
            .write("tree/blocks/utils/gcf.test.ts", "import { gcf } from './gcf';\nimport { it } from 'vitest';\n")
            .write("tree/blocks/utils/math/index.ts", "export * from './add';\nexport { gcf } from '../gcf';\n")
            .write("tree/blocks/utils/math/add.ts", "export const add = (a: number, b: number) => a + b;\n")
            .write("tree/blocks/utils/internal.ts", "export const secret = 42;\n")
            .write(
                "tree/blocks/format/print.ts",
                "import { add } from '../utils/math/add';\nimport clsx from 'clsx';\nexport const print = () => clsx(add(1, 2));\n",
            )
            .write("app/blockpm.toml", APP_CONFIG);
        workspace
    }

    pub fn write(&self, rel_path: &str, content: &str) -> &Self {
        let path = self.path(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    pub fn path(&self, rel_path: &str) -> PathBuf {
        self.temp.path().join(rel_path)
    }

    pub fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path(rel_path)).unwrap()
    }

    /// `blockpm` running in `dir` (relative to the workspace).
    pub fn blockpm(&self, dir: &str) -> Command {
        let mut cmd = Command::cargo_bin("blockpm").unwrap();
        cmd.current_dir(self.path(dir)).env_remove("RUST_LOG").env("NO_COLOR", "1");
        cmd
    }

    /// Publishes the tree's manifest.
    pub fn publish(&self) -> &Self {
        self.blockpm("tree").arg("build").assert().success();
        self
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }
}
