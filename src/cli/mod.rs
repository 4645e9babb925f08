//! Command-line interface for blockpm.
//!
//! # Commands
//!
//! - `build` - Publish the blocks of this tree as `blockpm-manifest.json`
//! - `add` - Install blocks and everything they depend on into this project
//! - `list` - List the blocks published by the configured trees
//! - `tree` - Show the dependency tree of blocks
//!
//! All commands read `blockpm.toml`, found in the current directory or a
//! parent, or given with `--config`.
//!
//! ```bash
//! blockpm build
//! blockpm add utils/math format/print
//! blockpm --verbose add github/acme/blocks/ui/button
//! blockpm list --format json
//! blockpm tree format/print
//! ```

mod add;
mod build;
mod list;
mod tree;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::classify::AliasMatcher;
use crate::config::{LoadedConfig, find_config_with_optional};
use crate::registry::PublishedIndex;
use crate::source::{DirectorySource, load_indexes};

/// Block package manager.
#[derive(Parser, Debug)]
#[command(
    name = "blockpm",
    about = "Block package manager - copy reusable source blocks between projects",
    version,
    long_about = "blockpm publishes directories of reusable source files as blocks and installs them, \
                  with everything they depend on, into other projects, rewriting references between \
                  blocks for their new location."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (equivalent to `RUST_LOG=debug`)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to blockpm.toml (searched from the current directory by default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Publish the blocks of this tree
    Build(build::BuildCommand),

    /// Install blocks and their dependencies into this project
    Add(add::AddCommand),

    /// List published blocks
    List(list::ListCommand),

    /// Show the dependency tree of blocks
    Tree(tree::TreeCommand),
}

impl Cli {
    /// Log filter selected by the verbosity flags.
    ///
    /// `RUST_LOG`, when set, takes precedence in `main`.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Whether informational output should be suppressed.
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Runs the selected command.
    pub async fn execute(self) -> Result<()> {
        let config_path = self.config.clone();
        let quiet = self.quiet;

        match self.command {
            Commands::Build(cmd) => cmd.execute_with_config_path(config_path, quiet),
            Commands::Add(cmd) => cmd.execute_with_config_path(config_path, quiet).await,
            Commands::List(cmd) => cmd.execute_with_config_path(config_path).await,
            Commands::Tree(cmd) => cmd.execute_with_config_path(config_path).await,
        }
    }
}

/// Loads the project configuration for a command.
fn load_config(config_path: Option<PathBuf>) -> Result<LoadedConfig> {
    let path = find_config_with_optional(config_path)?;
    LoadedConfig::load(&path)
}

/// Loads the published indexes of every configured tree, in resolution order.
async fn load_configured_indexes(config: &LoadedConfig) -> Result<(DirectorySource, Vec<PublishedIndex>)> {
    let trees = config.tree_specs()?;
    if trees.is_empty() {
        anyhow::bail!("No trees configured: add them to `repos` in {}", config.path.display());
    }
    let source = config.directory_source()?;
    let indexes = load_indexes(&trees, &source).await?;
    tracing::debug!("Loaded {} trees", indexes.len());
    Ok((source, indexes))
}

/// Alias configuration of the project, if it has one.
fn project_aliases(config: &LoadedConfig) -> Result<Option<AliasMatcher>> {
    AliasMatcher::discover(&config.root, Some(&config.root))
        .with_context(|| format!("Failed to read alias configuration of {}", config.root.display()))
}
