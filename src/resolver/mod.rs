//! Transitive block resolution.
//!
//! Given the requested blocks and the published indexes of the configured
//! trees, [`resolve`] computes every block an install needs:
//!
//! - A bare specifier (`utils/math`) is looked up in the trees in configured
//!   order and the first tree that publishes it wins. When several trees
//!   publish the same identifier a warning names all of them; the first match
//!   is still used.
//! - A qualified specifier (`github/acme/blocks/utils/math`) must be published
//!   by that tree.
//! - Local dependencies are looked up in the depending block's own tree first,
//!   then in the configured trees in order.
//!
//! Traversal is depth-first in declaration order. A block that is already in
//! the [`ResolvedSet`] is not visited again, so dependency cycles terminate and
//! every block appears exactly once. Any missing block fails the whole request.

pub mod dependency_graph;

pub use dependency_graph::{DependencyGraph, DependencyNode};

use std::collections::HashMap;
use std::sync::Arc;
use strsim::levenshtein;

use crate::constants::{MAX_SUGGESTIONS, SIMILARITY_THRESHOLD_PERCENT};
use crate::core::BlockpmError;
use crate::registry::{Block, BlockSpecifier, IndexedBlock, PublishedIndex, TreeSpec};

/// A block selected for installation.
#[derive(Debug, Clone)]
pub struct ResolvedBlock {
    /// The published block
    pub block: Arc<Block>,
    /// Tree the block is installed from
    pub tree: TreeSpec,
    /// `false` when the block was requested directly
    pub is_transitive_dependency: bool,
}

impl ResolvedBlock {
    /// `<provider>/<owner>/<repo>/<category>/<name>`.
    #[must_use]
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.tree.id(), self.block.id())
    }
}

/// Insertion-ordered, de-duplicated result of a resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSet {
    order: Vec<String>,
    entries: HashMap<String, ResolvedBlock>,
    edges: Vec<(String, String)>,
}

impl ResolvedSet {
    /// Number of resolved blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Looks up a block by qualified identifier.
    #[must_use]
    pub fn get(&self, qualified_id: &str) -> Option<&ResolvedBlock> {
        self.entries.get(qualified_id)
    }

    /// Returns `true` when the qualified identifier was resolved.
    #[must_use]
    pub fn contains(&self, qualified_id: &str) -> bool {
        self.entries.contains_key(qualified_id)
    }

    /// Resolved blocks in first-visited order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedBlock> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Qualified identifiers in first-visited order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Dependency edges discovered during resolution, as qualified identifiers.
    #[must_use]
    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    fn insert(&mut self, entry: ResolvedBlock) -> bool {
        let id = entry.qualified_id();
        if let Some(existing) = self.entries.get_mut(&id) {
            if !entry.is_transitive_dependency {
                existing.is_transitive_dependency = false;
            }
            return false;
        }
        self.order.push(id.clone());
        self.entries.insert(id, entry);
        true
    }
}

/// Resolves `requested` against `indexes`, given in configured tree order.
///
/// # Errors
///
/// Returns [`BlockpmError::BlockNotFound`] for the first specifier or local
/// dependency that no tree publishes. Nothing is returned for the other blocks.
pub fn resolve(
    requested: &[BlockSpecifier],
    indexes: &[PublishedIndex],
) -> Result<ResolvedSet, BlockpmError> {
    let mut resolved = ResolvedSet::default();

    for specifier in requested {
        let found = match specifier {
            BlockSpecifier::Bare {
                id,
            } => find_bare(id, indexes),
            BlockSpecifier::Qualified {
                tree,
                id,
            } => indexes.iter().find(|index| index.tree().id() == tree.id()).and_then(|index| index.get(id)),
        };

        let Some(found) = found else {
            return Err(not_found(&specifier.to_string(), specifier.block_id(), indexes));
        };
        visit(found, false, indexes, &mut resolved)?;
    }

    tracing::debug!(
        "Resolved {} requested blocks to {} blocks",
        requested.len(),
        resolved.len()
    );
    Ok(resolved)
}

fn visit(
    found: &IndexedBlock,
    transitive: bool,
    indexes: &[PublishedIndex],
    resolved: &mut ResolvedSet,
) -> Result<(), BlockpmError> {
    let entry = ResolvedBlock {
        block: Arc::clone(&found.block),
        tree: found.tree.clone(),
        is_transitive_dependency: transitive,
    };
    if !resolved.insert(entry) {
        return Ok(());
    }

    let parent = found.qualified_id();
    for dependency in &found.block.local_dependencies {
        let Some(child) = find_dependency(dependency, &found.tree, indexes) else {
            tracing::debug!("Block {} depends on missing block {}", parent, dependency);
            return Err(not_found(dependency, dependency, indexes));
        };
        resolved.edges.push((parent.clone(), child.qualified_id()));
        visit(child, true, indexes, resolved)?;
    }

    Ok(())
}

fn find_bare<'i>(id: &str, indexes: &'i [PublishedIndex]) -> Option<&'i IndexedBlock> {
    let mut matches = indexes.iter().filter_map(|index| index.get(id));
    let first = matches.next()?;

    let others: Vec<String> = matches.map(|m| m.tree.to_string()).collect();
    if !others.is_empty() {
        tracing::warn!(
            "Block {} is published by {} and also by {}; using {}",
            id,
            first.tree,
            others.join(", "),
            first.tree
        );
    }
    Some(first)
}

fn find_dependency<'i>(
    id: &str,
    parent_tree: &TreeSpec,
    indexes: &'i [PublishedIndex],
) -> Option<&'i IndexedBlock> {
    indexes
        .iter()
        .filter(|index| index.tree().id() == parent_tree.id())
        .chain(indexes.iter().filter(|index| index.tree().id() != parent_tree.id()))
        .find_map(|index| index.get(id))
}

fn not_found(specifier: &str, block_id: &str, indexes: &[PublishedIndex]) -> BlockpmError {
    let mut scored: Vec<(String, usize)> = indexes
        .iter()
        .flat_map(|index| index.blocks())
        .map(|b| b.block.id())
        .map(|id| {
            let distance = levenshtein(block_id, &id);
            (id, distance)
        })
        .collect();
    scored.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    scored.dedup_by(|a, b| a.0 == b.0);

    let suggestions = scored
        .into_iter()
        .filter(|(_, distance)| *distance <= block_id.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(MAX_SUGGESTIONS)
        .map(|(id, _)| id)
        .collect();

    BlockpmError::BlockNotFound {
        specifier: specifier.to_string(),
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{block_with_deps, index_of};

    fn bare(id: &str) -> BlockSpecifier {
        id.parse().unwrap()
    }

    #[test]
    fn test_closure_of_two() {
        let index = index_of(
            "github/acme/blocks",
            vec![block_with_deps("utils/math", &["utils/gcf"]), block_with_deps("utils/gcf", &[])],
        );

        let resolved = resolve(&[bare("utils/math")], &[index]).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(
            resolved.ids(),
            &["github/acme/blocks/utils/math".to_string(), "github/acme/blocks/utils/gcf".to_string()]
        );
        let gcf = resolved.get("github/acme/blocks/utils/gcf").unwrap();
        assert!(gcf.is_transitive_dependency);
        assert!(!resolved.get("github/acme/blocks/utils/math").unwrap().is_transitive_dependency);
    }

    #[test]
    fn test_cycle_resolves_each_block_once() {
        let index = index_of(
            "github/acme/blocks",
            vec![block_with_deps("a/a", &["b/b"]), block_with_deps("b/b", &["a/a"])],
        );

        let resolved = resolve(&[bare("a/a")], &[index]).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.iter().filter(|b| b.block.id() == "a/a").count(), 1);
        assert_eq!(resolved.edges().len(), 2);
    }

    #[test]
    fn test_depth_first_declaration_order() {
        let index = index_of(
            "github/acme/blocks",
            vec![
                block_with_deps("ui/page", &["ui/card", "ui/button"]),
                block_with_deps("ui/card", &["ui/icon"]),
                block_with_deps("ui/button", &[]),
                block_with_deps("ui/icon", &[]),
            ],
        );

        let resolved = resolve(&[bare("ui/page")], &[index]).unwrap();
        let order: Vec<String> = resolved.iter().map(|b| b.block.id()).collect();
        assert_eq!(order, vec!["ui/page", "ui/card", "ui/icon", "ui/button"]);
    }

    #[test]
    fn test_first_tree_wins() {
        let first = index_of("github/acme/one", vec![block_with_deps("utils/math", &[])]);
        let second = index_of("github/acme/two", vec![block_with_deps("utils/math", &[])]);

        let resolved = resolve(&[bare("utils/math")], &[first, second]).unwrap();
        assert_eq!(resolved.ids(), &["github/acme/one/utils/math".to_string()]);
    }

    #[test]
    fn test_qualified_specifier_selects_tree() {
        let first = index_of("github/acme/one", vec![block_with_deps("utils/math", &[])]);
        let second = index_of("github/acme/two", vec![block_with_deps("utils/math", &[])]);

        let resolved =
            resolve(&["github/acme/two/utils/math".parse().unwrap()], &[first, second]).unwrap();
        assert_eq!(resolved.ids(), &["github/acme/two/utils/math".to_string()]);
    }

    #[test]
    fn test_dependency_prefers_parent_tree() {
        let first = index_of("github/acme/one", vec![block_with_deps("utils/gcf", &[])]);
        let second = index_of(
            "github/acme/two",
            vec![block_with_deps("utils/math", &["utils/gcf"]), block_with_deps("utils/gcf", &[])],
        );

        let resolved = resolve(&[bare("utils/math")], &[first, second]).unwrap();
        assert!(resolved.contains("github/acme/two/utils/gcf"));
        assert!(!resolved.contains("github/acme/one/utils/gcf"));
    }

    #[test]
    fn test_dependency_falls_back_to_other_trees() {
        let first = index_of("github/acme/one", vec![block_with_deps("utils/gcf", &[])]);
        let second = index_of("github/acme/two", vec![block_with_deps("utils/math", &["utils/gcf"])]);

        let resolved = resolve(&[bare("utils/math")], &[first, second]).unwrap();
        assert!(resolved.contains("github/acme/one/utils/gcf"));
    }

    #[test]
    fn test_missing_block_with_suggestions() {
        let index = index_of("github/acme/blocks", vec![block_with_deps("utils/math", &[])]);

        let err = resolve(&[bare("utils/maht")], &[index]).unwrap_err();
        match err {
            BlockpmError::BlockNotFound {
                specifier,
                suggestions,
            } => {
                assert_eq!(specifier, "utils/maht");
                assert_eq!(suggestions, vec!["utils/math"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_transitive_dependency_aborts() {
        let index = index_of("github/acme/blocks", vec![block_with_deps("utils/math", &["utils/gone"])]);

        let err = resolve(&[bare("utils/math")], &[index]).unwrap_err();
        assert!(matches!(err, BlockpmError::BlockNotFound { ref specifier, .. } if specifier == "utils/gone"));
    }

    #[test]
    fn test_direct_request_after_transitive_discovery() {
        let index = index_of(
            "github/acme/blocks",
            vec![block_with_deps("utils/math", &["utils/gcf"]), block_with_deps("utils/gcf", &[])],
        );

        let resolved = resolve(&[bare("utils/math"), bare("utils/gcf")], &[index]).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.ids()[1], "github/acme/blocks/utils/gcf");
        assert!(!resolved.get("github/acme/blocks/utils/gcf").unwrap().is_transitive_dependency);
    }
}
