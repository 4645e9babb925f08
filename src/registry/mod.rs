//! Published block registry data model.
//!
//! A tree publishes a `blockpm-manifest.json` file at its root: an ordered list
//! of [`Category`] records, each holding the [`Block`]s found in one top-level
//! directory of the tree. Consumers load that file into a [`PublishedIndex`],
//! keyed by fully qualified identifier
//! (`<provider>/<owner>/<repo>/<category>/<name>`).
//!
//! # Manifest Format
//!
//! ```json
//! [
//!   {
//!     "name": "utils",
//!     "blocks": [
//!       {
//!         "name": "math",
//!         "category": "utils",
//!         "directory": "blocks/utils/math",
//!         "subdirectory": true,
//!         "files": ["add.ts", "index.ts"],
//!         "tests": false,
//!         "list": true,
//!         "localDependencies": ["utils/gcf"],
//!         "dependencies": ["lodash@4.17.21"],
//!         "devDependencies": [],
//!         "_imports_": { "../gcf": "{{utils/gcf}}" }
//!       }
//!     ]
//!   }
//! ]
//! ```

pub mod specifier;

pub use specifier::{BlockSpecifier, TreeSpec};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::BlockpmError;

/// The unit of distribution: one file, or one directory of files, inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block name, unique within its category
    pub name: String,
    /// Category the block belongs to
    pub category: String,
    /// Directory containing the block's files, relative to the tree root, forward slashes
    pub directory: String,
    /// Whether the block is a subdirectory of files rather than a single file
    pub subdirectory: bool,
    /// Files belonging to the block, test files included
    pub files: Vec<String>,
    /// Whether a test file is part of `files`
    pub tests: bool,
    /// Whether the block appears in listings
    #[serde(default = "default_list")]
    pub list: bool,
    /// Other blocks this block references, as `<category>/<name>`
    #[serde(default)]
    pub local_dependencies: Vec<String>,
    /// Registry packages, as `<name>` or `<name>@<version>`
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Registry packages found in the nearest manifest's development table
    #[serde(default)]
    pub dev_dependencies: Vec<String>,
    /// Literal specifier as written in source → rewrite template
    #[serde(rename = "_imports_", default)]
    pub imports: BTreeMap<String, String>,
}

const fn default_list() -> bool {
    true
}

impl Block {
    /// Identifier of this block within its tree, `<category>/<name>`.
    #[must_use]
    pub fn id(&self) -> String {
        block_id(&self.category, &self.name)
    }

    /// Returns `true` when `file` is one of the block's test files.
    #[must_use]
    pub fn is_test_file(file: &str) -> bool {
        crate::constants::TEST_FILE_INFIXES.iter().any(|infix| file.contains(infix))
    }
}

/// Builds a `<category>/<name>` identifier.
#[must_use]
pub fn block_id(category: &str, name: &str) -> String {
    format!("{category}/{name}")
}

/// A named group of blocks, one top-level directory of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category name
    pub name: String,
    /// Blocks in the category, sorted by name
    pub blocks: Vec<Block>,
}

/// A block from a published index together with the tree that published it.
#[derive(Debug, Clone)]
pub struct IndexedBlock {
    /// The published block
    pub block: Arc<Block>,
    /// Tree that published the block
    pub tree: TreeSpec,
}

impl IndexedBlock {
    /// Fully qualified identifier, `<provider>/<owner>/<repo>/<category>/<name>`.
    #[must_use]
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.tree.id(), self.block.id())
    }
}

/// All blocks published by one tree, keyed by fully qualified identifier.
#[derive(Debug, Clone)]
pub struct PublishedIndex {
    tree: TreeSpec,
    blocks: BTreeMap<String, IndexedBlock>,
}

impl PublishedIndex {
    /// Builds an index from a tree's categories.
    ///
    /// # Errors
    ///
    /// Returns [`BlockpmError::DuplicateBlock`] when two blocks share an identifier.
    pub fn from_categories(tree: TreeSpec, categories: Vec<Category>) -> Result<Self> {
        let mut blocks: BTreeMap<String, IndexedBlock> = BTreeMap::new();

        for category in categories {
            for block in category.blocks {
                let entry = IndexedBlock {
                    block: Arc::new(block),
                    tree: tree.clone(),
                };
                let key = entry.qualified_id();
                if let Some(existing) = blocks.get(&key) {
                    return Err(BlockpmError::DuplicateBlock {
                        id: entry.block.id(),
                        first: existing.block.directory.clone(),
                        second: entry.block.directory.clone(),
                    }
                    .into());
                }
                blocks.insert(key, entry);
            }
        }

        tracing::debug!("Indexed {} blocks from tree {}", blocks.len(), tree);
        Ok(Self {
            tree,
            blocks,
        })
    }

    /// Parses a published manifest document.
    ///
    /// # Errors
    ///
    /// Returns [`BlockpmError::ManifestParseError`] when the document is not a
    /// valid category list, or any error of [`Self::from_categories`].
    pub fn from_json(tree: TreeSpec, content: &str) -> Result<Self> {
        let categories: Vec<Category> =
            serde_json::from_str(content).map_err(|e| BlockpmError::ManifestParseError {
                tree: tree.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_categories(tree, categories)
    }

    /// Tree that published this index.
    #[must_use]
    pub const fn tree(&self) -> &TreeSpec {
        &self.tree
    }

    /// Looks up a block by its `<category>/<name>` identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IndexedBlock> {
        self.blocks.get(&format!("{}/{id}", self.tree.id()))
    }

    /// Returns `true` when the tree publishes `<category>/<name>`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterates over all indexed blocks in identifier order.
    pub fn blocks(&self) -> impl Iterator<Item = &IndexedBlock> {
        self.blocks.values()
    }

    /// Number of blocks in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` when the tree publishes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}
