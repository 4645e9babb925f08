//! Block and category filters applied while building a manifest.
//!
//! Patterns are globs. Block patterns are tried against both the bare block
//! name (`math`) and the identifier (`utils/math`), so `utils/*` and `*-old`
//! both work.

use anyhow::{Context, Result};
use glob::Pattern;

use super::BuildOptions;

#[derive(Debug, Clone, Default)]
struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid glob pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            patterns,
        })
    }

    fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn matches_any(&self, candidates: &[&str]) -> bool {
        self.patterns.iter().any(|p| candidates.iter().any(|c| p.matches(c)))
    }
}

/// Compiled include, exclude and listing filters.
#[derive(Debug, Clone, Default)]
pub struct BlockFilters {
    include_blocks: PatternSet,
    include_categories: PatternSet,
    exclude_blocks: PatternSet,
    exclude_categories: PatternSet,
    hidden_blocks: PatternSet,
    hidden_categories: PatternSet,
}

impl BlockFilters {
    /// Compiles the filters of `options`.
    ///
    /// # Errors
    ///
    /// Returns an error when a pattern is not a valid glob.
    pub fn new(options: &BuildOptions) -> Result<Self> {
        Ok(Self {
            include_blocks: PatternSet::new(&options.include_blocks)?,
            include_categories: PatternSet::new(&options.include_categories)?,
            exclude_blocks: PatternSet::new(&options.exclude_blocks)?,
            exclude_categories: PatternSet::new(&options.exclude_categories)?,
            hidden_blocks: PatternSet::new(&options.do_not_list_blocks)?,
            hidden_categories: PatternSet::new(&options.do_not_list_categories)?,
        })
    }

    /// Whether a block passes the include and exclude filters.
    #[must_use]
    pub fn admits(&self, category: &str, name: &str) -> bool {
        let id = format!("{category}/{name}");
        let names = [name, id.as_str()];

        if !self.include_categories.is_empty() && !self.include_categories.matches_any(&[category]) {
            return false;
        }
        if !self.include_blocks.is_empty() && !self.include_blocks.matches_any(&names) {
            return false;
        }
        !(self.exclude_categories.matches_any(&[category]) || self.exclude_blocks.matches_any(&names))
    }

    /// Whether an admitted block appears in listings.
    #[must_use]
    pub fn listed(&self, category: &str, name: &str) -> bool {
        let id = format!("{category}/{name}");
        !(self.hidden_categories.matches_any(&[category])
            || self.hidden_blocks.matches_any(&[name, id.as_str()]))
    }
}
