//! Display the dependency tree of blocks.
//!
//! ```text
//! format/print (github/acme/blocks)
//! └── utils/math
//!     └── utils/gcf
//! ```
//!
//! A block shown earlier in the same tree is marked `(see above)`, which is
//! also how dependency cycles appear.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::registry::BlockSpecifier;
use crate::resolver::{DependencyGraph, DependencyNode, resolve};

/// Command to display dependency trees.
#[derive(Args, Debug)]
pub struct TreeCommand {
    /// Blocks to show, as `<category>/<name>` or `<provider>/<owner>/<repo>/<category>/<name>`
    #[arg(required = true, value_name = "BLOCK")]
    blocks: Vec<String>,
}

impl TreeCommand {
    pub async fn execute_with_config_path(self, config_path: Option<PathBuf>) -> Result<()> {
        let config = super::load_config(config_path)?;
        let requested =
            self.blocks.iter().map(|block| block.parse::<BlockSpecifier>()).collect::<Result<Vec<_>, _>>()?;

        let (_, indexes) = super::load_configured_indexes(&config).await?;
        let resolved = resolve(&requested, &indexes)?;
        let graph = DependencyGraph::from_resolved(&resolved);

        let roots = resolved.iter().filter(|entry| !entry.is_transitive_dependency);
        for (i, root) in roots.enumerate() {
            if i > 0 {
                println!();
            }
            print!("{}", graph.to_tree_string(&DependencyNode::from_qualified(&root.qualified_id())));
        }

        let cycles = graph.cycles();
        if !cycles.is_empty() {
            println!();
            for cycle in cycles {
                let names: Vec<String> = cycle.iter().map(|node| node.block.clone()).collect();
                println!("{} {}", "cycle:".yellow(), names.join(" → "));
            }
        }
        Ok(())
    }
}
