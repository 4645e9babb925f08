//! Access to the published contents of block trees.
//!
//! A [`TreeSource`] reads two things from a tree: its published manifest and
//! the files of its blocks. The resolver and installer only ever talk to this
//! trait, so the transport behind it can change without touching them.
//!
//! [`DirectorySource`] serves trees from local directories, configured per
//! tree in `blockpm.toml`:
//!
//! ```toml
//! [trees]
//! "github/acme/blocks" = "../acme-blocks"
//! ```

use anyhow::{Context, Result};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::constants::PUBLISHED_MANIFEST_FILE;
use crate::core::BlockpmError;
use crate::registry::{PublishedIndex, TreeSpec};
use crate::utils::fs::normalize_path;

/// Reads the published state of a tree.
pub trait TreeSource: Sync {
    /// Reads the published manifest document of `tree`.
    fn read_manifest(&self, tree: &TreeSpec) -> impl Future<Output = Result<String>> + Send;

    /// Reads one file of `tree`, `path` being relative to the tree root with forward slashes.
    fn read_file(&self, tree: &TreeSpec, path: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Serves trees from local directories.
#[derive(Debug, Clone, Default)]
pub struct DirectorySource {
    dirs: HashMap<String, PathBuf>,
}

impl DirectorySource {
    /// Creates a source with no trees.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves the tree `tree_id` (`<provider>/<owner>/<repo>`) from `dir`.
    #[must_use]
    pub fn with_tree(mut self, tree_id: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.insert(tree_id, dir);
        self
    }

    /// Serves the tree `tree_id` from `dir`, replacing any previous directory.
    pub fn insert(&mut self, tree_id: impl Into<String>, dir: impl Into<PathBuf>) {
        self.dirs.insert(tree_id.into(), normalize_path(&dir.into()));
    }

    /// Directory backing `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockpmError::TreeNotConfigured`] when no directory is configured.
    pub fn tree_dir(&self, tree: &TreeSpec) -> Result<&Path, BlockpmError> {
        self.dirs.get(&tree.id()).map(PathBuf::as_path).ok_or_else(|| BlockpmError::TreeNotConfigured {
            tree: tree.id(),
        })
    }

    fn file_path(&self, tree: &TreeSpec, path: &str) -> Result<PathBuf> {
        let dir = self.tree_dir(tree)?;
        let full = normalize_path(&dir.join(path));
        if !full.starts_with(dir) {
            return Err(BlockpmError::FileSystemError {
                operation: format!("reading a file of tree {tree}"),
                path: path.to_string(),
            })
            .with_context(|| format!("'{path}' points outside the tree directory"));
        }
        Ok(full)
    }
}

impl TreeSource for DirectorySource {
    async fn read_manifest(&self, tree: &TreeSpec) -> Result<String> {
        let path = self.tree_dir(tree)?.join(PUBLISHED_MANIFEST_FILE);
        tracing::debug!("Reading manifest of {} from {}", tree, path.display());
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read published manifest {}", path.display()))
    }

    async fn read_file(&self, tree: &TreeSpec, path: &str) -> Result<String> {
        let full = self.file_path(tree, path)?;
        tracing::trace!("Reading {}", full.display());
        tokio::fs::read_to_string(&full).await.with_context(|| format!("Failed to read {}", full.display()))
    }
}

/// Loads the published index of every tree, preserving the given order.
///
/// # Errors
///
/// Fails when any manifest cannot be read or parsed.
pub async fn load_indexes<S: TreeSource>(trees: &[TreeSpec], source: &S) -> Result<Vec<PublishedIndex>> {
    let documents = try_join_all(trees.iter().map(|tree| source.read_manifest(tree))).await?;

    trees
        .iter()
        .zip(documents)
        .map(|(tree, document)| {
            PublishedIndex::from_json(tree.clone(), &document)
                .with_context(|| format!("Failed to load the published index of {tree}"))
        })
        .collect()
}
