//! Block installation.
//!
//! Installing is split in two phases so that a failure never leaves a project
//! half-updated:
//!
//! 1. [`plan_install`] fetches every file of every resolved block from its
//!    tree, rewrites local references for the file's destination and computes
//!    where it goes. Nothing touches the project yet.
//! 2. [`InstallPlan::write`] writes the planned files, each one atomically.
//!
//! Block files land under the destination directory of their category:
//!
//! ```text
//! <dir>/<file>          single-file block
//! <dir>/<name>/<file>   multi-file block
//! ```

use anyhow::{Context, Result};
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::registry::{Block, TreeSpec};
use crate::resolver::ResolvedSet;
use crate::source::TreeSource;
use crate::templating::{ImportBase, ResolvedPaths, rewrite};
use crate::utils::fs::atomic_write;

/// Options of an install.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Install the test files of each block
    pub include_tests: bool,
    /// Replace files that already exist in the project
    pub overwrite: bool,
}

/// One file to be written.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    /// Qualified identifier of the block the file belongs to
    pub block: String,
    /// Destination in the project
    pub destination: PathBuf,
    /// Rewritten content
    pub content: String,
}

/// Everything an install writes, computed before anything is written.
#[derive(Debug, Clone, Default)]
pub struct InstallPlan {
    /// Files in resolved-set order
    pub files: Vec<PlannedFile>,
    /// Registry packages the installed blocks need at runtime
    pub dependencies: BTreeSet<String>,
    /// Registry packages the installed blocks need for development
    pub dev_dependencies: BTreeSet<String>,
}

/// Outcome of [`InstallPlan::write`].
#[derive(Debug, Clone, Default)]
pub struct InstallSummary {
    /// Files written
    pub written: Vec<PathBuf>,
    /// Files left untouched because they already existed
    pub skipped: Vec<PathBuf>,
}

struct FileJob<'a> {
    block: &'a Block,
    tree: &'a TreeSpec,
    qualified_id: String,
    tree_path: String,
    destination: PathBuf,
}

/// Plans the installation of `resolved` into the project described by `paths`.
///
/// Block files are fetched concurrently; the plan keeps resolved-set order.
///
/// # Errors
///
/// Fails when a category has no known destination directory, when two blocks
/// would be written to the same file, when a file cannot be read from its tree,
/// or when a rewrite template is malformed.
pub async fn plan_install<S: TreeSource>(
    resolved: &ResolvedSet,
    source: &S,
    paths: &ResolvedPaths,
    options: &InstallOptions,
) -> Result<InstallPlan> {
    let mut plan = InstallPlan::default();
    let mut jobs = Vec::new();
    let mut owners: HashMap<PathBuf, String> = HashMap::new();

    for entry in resolved.iter() {
        let block = entry.block.as_ref();
        let qualified_id = entry.qualified_id();
        let destination = paths.for_category(&block.category);

        let Some(mut block_dir) = destination.dir else {
            let alias = match destination.import_base {
                ImportBase::Alias(alias) => alias,
                ImportBase::Relative => String::new(),
            };
            anyhow::bail!(
                "Cannot determine where to install '{}': '{}' is not mapped by the project's alias configuration",
                block.id(),
                alias
            );
        };
        if block.subdirectory {
            block_dir.push(&block.name);
        }

        for file in &block.files {
            if !options.include_tests && Block::is_test_file(file) {
                continue;
            }
            let file_destination = block_dir.join(file);
            if let Some(owner) = owners.insert(file_destination.clone(), qualified_id.clone())
                && owner != qualified_id
            {
                anyhow::bail!(
                    "Blocks '{}' and '{}' would both be installed to {}",
                    owner,
                    qualified_id,
                    file_destination.display()
                );
            }
            jobs.push(FileJob {
                block,
                tree: &entry.tree,
                qualified_id: qualified_id.clone(),
                tree_path: tree_path(&block.directory, file),
                destination: file_destination,
            });
        }

        plan.dependencies.extend(block.dependencies.iter().cloned());
        plan.dev_dependencies.extend(block.dev_dependencies.iter().cloned());
    }

    let contents = try_join_all(jobs.iter().map(|job| async move {
        source
            .read_file(job.tree, &job.tree_path)
            .await
            .with_context(|| format!("Failed to fetch {} of block {}", job.tree_path, job.qualified_id))
    }))
    .await?;

    for (job, content) in jobs.into_iter().zip(contents) {
        let content = rewrite(&content, &job.block.imports, paths, &job.destination)
            .with_context(|| format!("Failed to rewrite {}", job.destination.display()))?;
        plan.files.push(PlannedFile {
            block: job.qualified_id,
            destination: job.destination,
            content,
        });
    }

    tracing::debug!(
        "Planned {} files from {} blocks ({} dependencies, {} dev dependencies)",
        plan.files.len(),
        resolved.len(),
        plan.dependencies.len(),
        plan.dev_dependencies.len()
    );
    Ok(plan)
}

fn tree_path(directory: &str, file: &str) -> String {
    if directory.is_empty() || directory == "." {
        file.to_string()
    } else {
        format!("{}/{file}", directory.trim_end_matches('/'))
    }
}

impl InstallPlan {
    /// Writes the planned files.
    ///
    /// Existing files are skipped unless `overwrite` is set.
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be written.
    pub fn write(&self, overwrite: bool) -> Result<InstallSummary> {
        let mut summary = InstallSummary::default();

        for file in &self.files {
            if file.destination.exists() && !overwrite {
                tracing::info!("Skipping existing file {}", file.destination.display());
                summary.skipped.push(file.destination.clone());
                continue;
            }
            atomic_write(&file.destination, file.content.as_bytes())
                .with_context(|| format!("Failed to install {} from {}", file.destination.display(), file.block))?;
            summary.written.push(file.destination.clone());
        }

        Ok(summary)
    }
}
