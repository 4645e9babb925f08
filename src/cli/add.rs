//! Install blocks into the project.
//!
//! Resolves the requested blocks across the configured trees, rewrites every
//! file for its destination and only then writes them. Registry packages the
//! blocks need are reported for the project's package manager to install.
//!
//! ```bash
//! blockpm add utils/math
//! blockpm add github/acme/blocks/ui/button --include-tests
//! blockpm add format/print --dry-run
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::installer::{InstallOptions, plan_install};
use crate::registry::BlockSpecifier;
use crate::resolver::{DependencyGraph, resolve};
use crate::templating::resolve_paths;

/// Command to install blocks.
#[derive(Args, Debug)]
pub struct AddCommand {
    /// Blocks to install, as `<category>/<name>` or `<provider>/<owner>/<repo>/<category>/<name>`
    #[arg(required = true, value_name = "BLOCK")]
    blocks: Vec<String>,

    /// Also install test files
    #[arg(long)]
    include_tests: bool,

    /// Replace files that already exist
    #[arg(long)]
    overwrite: bool,

    /// Show what would be installed without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl AddCommand {
    pub async fn execute_with_config_path(self, config_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let config = super::load_config(config_path)?;
        let requested = self
            .blocks
            .iter()
            .map(|block| block.parse::<BlockSpecifier>())
            .collect::<Result<Vec<_>, _>>()?;

        let (source, indexes) = super::load_configured_indexes(&config).await?;
        let resolved = resolve(&requested, &indexes)?;

        for cycle in DependencyGraph::from_resolved(&resolved).cycles() {
            let names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            tracing::info!("Blocks depend on each other: {}", names.join(" → "));
        }

        let aliases = super::project_aliases(&config)?;
        let paths = resolve_paths(&config.config.paths, &config.root, aliases.as_ref())
            .with_context(|| format!("Invalid [paths] in {}", config.path.display()))?;
        let options = InstallOptions {
            include_tests: self.include_tests || config.config.include_tests,
            overwrite: self.overwrite,
        };
        let plan = plan_install(&resolved, &source, &paths, &options).await?;

        if self.dry_run {
            for file in &plan.files {
                println!("{} {}", "would write".cyan(), display_path(&file.destination, &config.root));
            }
        } else {
            let summary = plan.write(options.overwrite)?;
            if !quiet {
                for path in &summary.written {
                    println!("{} {}", "wrote".green(), display_path(path, &config.root));
                }
                for path in &summary.skipped {
                    println!("{} {} (exists)", "skipped".yellow(), display_path(path, &config.root));
                }
            }
        }

        if !quiet {
            let direct = resolved.iter().filter(|b| !b.is_transitive_dependency).count();
            println!(
                "{} {} blocks ({} requested, {} dependencies)",
                "Resolved".green().bold(),
                resolved.len(),
                direct,
                resolved.len() - direct
            );
            if !plan.dependencies.is_empty() {
                let list: Vec<&str> = plan.dependencies.iter().map(String::as_str).collect();
                println!("{} {}", "dependencies:".bold(), list.join(" "));
            }
            if !plan.dev_dependencies.is_empty() {
                let list: Vec<&str> = plan.dev_dependencies.iter().map(String::as_str).collect();
                println!("{} {}", "devDependencies:".bold(), list.join(" "));
            }
        }
        Ok(())
    }
}

fn display_path(path: &std::path::Path, root: &std::path::Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
