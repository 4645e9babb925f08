//! List the blocks published by the configured trees.
//!
//! Blocks published with `list = false` are hidden unless `--all` is given.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Output format of the list command.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Grouped, colored text
    #[default]
    Text,
    /// JSON array of blocks
    Json,
}

/// Command to list published blocks.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Include blocks hidden from listings
    #[arg(long)]
    all: bool,

    /// Only list blocks of this category
    #[arg(long)]
    category: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct ListEntry<'a> {
    id: String,
    tree: String,
    category: &'a str,
    name: &'a str,
    files: &'a [String],
    local_dependencies: &'a [String],
}

impl ListCommand {
    pub async fn execute_with_config_path(self, config_path: Option<PathBuf>) -> Result<()> {
        let config = super::load_config(config_path)?;
        let (_, indexes) = super::load_configured_indexes(&config).await?;

        let entries: Vec<ListEntry<'_>> = indexes
            .iter()
            .flat_map(|index| index.blocks())
            .filter(|indexed| self.all || indexed.block.list)
            .filter(|indexed| self.category.as_deref().is_none_or(|c| indexed.block.category == c))
            .map(|indexed| ListEntry {
                id: indexed.qualified_id(),
                tree: indexed.tree.to_string(),
                category: &indexed.block.category,
                name: &indexed.block.name,
                files: &indexed.block.files,
                local_dependencies: &indexed.block.local_dependencies,
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&entries).context("Failed to serialize block list")?);
            }
            OutputFormat::Text => print_text(&entries),
        }
        Ok(())
    }
}

fn print_text(entries: &[ListEntry<'_>]) {
    if entries.is_empty() {
        println!("No blocks found.");
        return;
    }

    let mut current: Option<(&str, &str)> = None;
    for entry in entries {
        if current != Some((entry.tree.as_str(), entry.category)) {
            println!("{} {}", entry.category.bold(), format!("({})", entry.tree).dimmed());
            current = Some((entry.tree.as_str(), entry.category));
        }
        if entry.local_dependencies.is_empty() {
            println!("  {}", entry.name.green());
        } else {
            println!("  {} → {}", entry.name.green(), entry.local_dependencies.join(", "));
        }
    }
}
