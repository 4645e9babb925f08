//! Publish the blocks of a tree.
//!
//! Reads the `[build]` table of `blockpm.toml`, builds every block directory
//! and writes `blockpm-manifest.json` next to the configuration file. A failure
//! in any block leaves the previous manifest untouched.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::builder::build;
use crate::constants::PUBLISHED_MANIFEST_FILE;
use crate::utils::fs::safe_write;

/// Command to build the published manifest.
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Block directories to build instead of `[build] dirs`
    #[arg(long = "dir", value_name = "DIR")]
    dirs: Vec<PathBuf>,

    /// Fail on unsupported layouts instead of warning
    #[arg(long)]
    strict: bool,

    /// Write the manifest somewhere other than the configuration directory
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the manifest instead of writing it
    #[arg(long)]
    dry_run: bool,
}

impl BuildCommand {
    pub fn execute_with_config_path(self, config_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let config = super::load_config(config_path)?;

        let roots = if self.dirs.is_empty() {
            config.block_dirs()
        } else {
            self.dirs.iter().map(|dir| config.resolve(&dir.to_string_lossy())).collect()
        };
        let mut options = config.build_options();
        options.strict |= self.strict;

        let categories = build(&roots, &options)?;
        let manifest = serde_json::to_string_pretty(&categories).context("Failed to serialize manifest")?;

        if self.dry_run {
            println!("{manifest}");
            return Ok(());
        }

        let output = self.output.unwrap_or_else(|| config.root.join(PUBLISHED_MANIFEST_FILE));
        safe_write(&output, &format!("{manifest}\n"))
            .with_context(|| format!("Failed to write manifest {}", output.display()))?;

        if !quiet {
            let blocks: usize = categories.iter().map(|c| c.blocks.len()).sum();
            println!(
                "{} {} blocks in {} categories to {}",
                "Published".green().bold(),
                blocks,
                categories.len(),
                output.display()
            );
        }
        Ok(())
    }
}
