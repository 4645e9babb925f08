//! Dependency graph view of a resolved set.
//!
//! Resolution itself tolerates cycles; this graph exists to report them and to
//! render the `tree` command's output.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::ResolvedSet;

/// One block in the graph.
///
/// Nodes are distinguished by tree as well as identifier, since two trees may
/// publish blocks with the same `<category>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyNode {
    /// `<provider>/<owner>/<repo>`
    pub tree: String,
    /// `<category>/<name>`
    pub block: String,
}

impl DependencyNode {
    /// Create a node for a block of a tree.
    pub fn new(tree: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            tree: tree.into(),
            block: block.into(),
        }
    }

    /// Split a qualified identifier into tree and block parts.
    #[must_use]
    pub fn from_qualified(qualified_id: &str) -> Self {
        let parts: Vec<&str> = qualified_id.splitn(4, '/').collect();
        match parts.as_slice() {
            [provider, owner, repo, block] => Self::new(format!("{provider}/{owner}/{repo}"), *block),
            _ => Self::new("", qualified_id),
        }
    }
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.block, self.tree)
    }
}

/// Directed graph of block dependencies.
pub struct DependencyGraph {
    graph: DiGraph<DependencyNode, ()>,
    node_map: HashMap<DependencyNode, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Build the graph of a resolved set, including blocks without dependencies.
    #[must_use]
    pub fn from_resolved(resolved: &ResolvedSet) -> Self {
        let mut graph = Self::new();
        for id in resolved.ids() {
            graph.ensure_node(DependencyNode::from_qualified(id));
        }
        for (from, to) in resolved.edges() {
            graph.add_dependency(DependencyNode::from_qualified(from), DependencyNode::from_qualified(to));
        }
        graph
    }

    fn ensure_node(&mut self, node: DependencyNode) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&node) {
            index
        } else {
            let index = self.graph.add_node(node.clone());
            self.node_map.insert(node, index);
            index
        }
    }

    /// Record that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: DependencyNode, to: DependencyNode) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// All dependency cycles, each as the list of blocks taking part in it.
    ///
    /// A block depending on itself forms a cycle of one.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<DependencyNode>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component.first().is_some_and(|&n| self.graph.contains_edge(n, n))
            })
            .map(|component| {
                let mut nodes: Vec<DependencyNode> =
                    component.into_iter().map(|idx| self.graph[idx].clone()).collect();
                nodes.sort_by(|a, b| a.block.cmp(&b.block).then_with(|| a.tree.cmp(&b.tree)));
                nodes
            })
            .collect()
    }

    /// Direct dependencies of `node`, in the order they were added.
    pub fn get_direct_deps(&self, node: &DependencyNode) -> Vec<DependencyNode> {
        let Some(&node_idx) = self.node_map.get(node) else {
            return Vec::new();
        };
        // petgraph yields neighbors most recent first
        let mut deps: Vec<DependencyNode> =
            self.graph.neighbors(node_idx).map(|idx| self.graph[idx].clone()).collect();
        deps.reverse();
        deps
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the total number of edges (dependencies) in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Build a human-readable dependency tree below `root`.
    pub fn to_tree_string(&self, root: &DependencyNode) -> String {
        let mut result = format!("{root}\n");
        let mut visited = HashSet::from([root.clone()]);
        let deps = self.get_direct_deps(root);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, &mut result, "", i == deps.len() - 1, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        node: &DependencyNode,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<DependencyNode>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(node.clone()) {
            result.push_str(&format!("{prefix}{connector}{} (see above)\n", node.block));
            return;
        }
        result.push_str(&format!("{prefix}{connector}{}\n", node.block));

        let deps = self.get_direct_deps(node);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(dep, result, &child_prefix, i == deps.len() - 1, visited);
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
