//! Test fixtures for block trees and published indexes

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::registry::{Block, Category, PublishedIndex};

/// A block tree on disk, removed when dropped.
///
/// ```rust,no_run
/// use blockpm_cli::test_utils::fixtures::BlockTreeFixture;
///
/// let tree = BlockTreeFixture::new()
///     .file("blocks/utils/gcf.ts", "export const gcf = 1;\n")
///     .file("package.json", "{}");
/// assert!(tree.path().join("blocks/utils/gcf.ts").exists());
/// ```
#[derive(Debug)]
pub struct BlockTreeFixture {
    dir: TempDir,
}

impl BlockTreeFixture {
    /// An empty temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Writes `content` to `rel_path`, creating parent directories.
    pub fn file(self, rel_path: impl AsRef<Path>, content: &str) -> Self {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture directory");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        self
    }

    /// Root of the tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for BlockTreeFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A single-file block `<category>/<name>` depending on `deps`.
pub fn block_with_deps(id: &str, deps: &[&str]) -> Block {
    let (category, name) = id.split_once('/').expect("block id must be <category>/<name>");
    Block {
        name: name.to_string(),
        category: category.to_string(),
        directory: format!("blocks/{category}"),
        subdirectory: false,
        files: vec![format!("{name}.ts")],
        tests: false,
        list: true,
        local_dependencies: deps.iter().map(ToString::to_string).collect(),
        dependencies: Vec::new(),
        dev_dependencies: Vec::new(),
        imports: BTreeMap::new(),
    }
}

/// The published index of `tree` (`<provider>/<owner>/<repo>[@<ref>]`) holding `blocks`.
pub fn index_of(tree: &str, blocks: Vec<Block>) -> PublishedIndex {
    let mut categories: BTreeMap<String, Vec<Block>> = BTreeMap::new();
    for block in blocks {
        categories.entry(block.category.clone()).or_default().push(block);
    }
    let categories = categories
        .into_iter()
        .map(|(name, blocks)| Category {
            name,
            blocks,
        })
        .collect();

    PublishedIndex::from_categories(tree.parse().expect("invalid tree"), categories).expect("duplicate block")
}
