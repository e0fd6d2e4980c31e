//! Inheritance graph of a template hierarchy.
//!
//! The resolver records every template → base edge it follows. The graph is
//! not needed to compute the resolution order, but it gives diagnostics a
//! complete picture: the full cycle path when a hierarchy is circular, a tree
//! rendering for the `tree` command, and an independent topological order to
//! check the resolution order against.
//!
//! [`InheritanceGraph::discover`] walks a hierarchy without merging anything,
//! following every edge once, so it also works on hierarchies the resolver
//! rejects.

use anyhow::{Result, anyhow};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use tracing::debug;

use crate::core::TemplarError;
use crate::source::RepositoryResolver;
use crate::template::{TemplateId, TemplateRecord};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the current DFS path.
    Gray,
    /// Node and everything below it has been visited.
    Black,
}

/// Directed graph of template → base edges.
#[derive(Debug, Clone)]
pub struct InheritanceGraph {
    graph: DiGraph<TemplateId, ()>,
    node_map: HashMap<TemplateId, NodeIndex>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Walk the hierarchy below `root`, loading every declared base once.
    pub fn discover(
        root: &TemplateRecord,
        repositories: &dyn RepositoryResolver,
        clone_to_dir: &Path,
    ) -> Result<Self> {
        let mut graph = Self::new();
        graph.add_template(root.id().clone());

        let mut visited: HashSet<TemplateId> = HashSet::new();
        visited.insert(root.id().clone());
        let mut queue: VecDeque<TemplateRecord> = VecDeque::new();
        queue.push_back(root.clone());

        while let Some(template) = queue.pop_front() {
            for locator in template.fields().bases()? {
                let base = TemplateRecord::from_locator(&locator, repositories, clone_to_dir)?;
                debug!("{} inherits from {}", template.id(), base.id());
                graph.add_base(template.id().clone(), base.id().clone());
                if visited.insert(base.id().clone()) {
                    queue.push_back(base);
                }
            }
        }

        Ok(graph)
    }

    fn ensure_node(&mut self, id: TemplateId) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&id) {
            index
        } else {
            let index = self.graph.add_node(id.clone());
            self.node_map.insert(id, index);
            index
        }
    }

    /// Add a template without edges.
    pub fn add_template(&mut self, id: TemplateId) {
        self.ensure_node(id);
    }

    /// Record that `template` declares `base`. Duplicate edges are ignored.
    pub fn add_base(&mut self, template: TemplateId, base: TemplateId) {
        let from = self.ensure_node(template);
        let to = self.ensure_node(base);
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Fail with [`TemplarError::CircularInheritance`] carrying the cycle path.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|n| (n, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if colors.get(&node) != Some(&Color::White) {
                continue;
            }
            if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                let chain =
                    cycle.iter().map(|idx| self.graph[*idx].to_string()).collect::<Vec<_>>();
                return Err(TemplarError::CircularInheritance {
                    chain: chain.join(" → "),
                }
                .into());
            }
        }

        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.ordered_neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|n| *n == neighbor)?;
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Neighbors in the order the edges were added.
    fn ordered_neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        // petgraph walks outgoing edges newest first
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.reverse();
        neighbors
    }

    /// Every template after all of its bases.
    pub fn topological_order(&self) -> Result<Vec<TemplateId>> {
        self.detect_cycles()?;
        let indices = toposort(&self.graph, None)
            .map_err(|_| anyhow!("Failed to order the inheritance graph"))?;
        Ok(indices.into_iter().rev().map(|idx| self.graph[idx].clone()).collect())
    }

    /// Bases declared directly by `template`, in declaration order.
    pub fn direct_bases(&self, template: &TemplateId) -> Vec<TemplateId> {
        match self.node_map.get(template) {
            Some(&idx) => {
                self.ordered_neighbors(idx).into_iter().map(|n| self.graph[n].clone()).collect()
            }
            None => Vec::new(),
        }
    }

    /// Every template `template` inherits from, directly or not.
    pub fn transitive_bases(&self, template: &TemplateId) -> HashSet<TemplateId> {
        let mut bases = HashSet::new();
        let mut queue = VecDeque::new();
        if let Some(&idx) = self.node_map.get(template) {
            queue.push_back(idx);
            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors(current) {
                    if bases.insert(self.graph[neighbor].clone()) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        bases
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Render the hierarchy below `root` as a tree.
    ///
    /// A template reached again on the current branch is shown once more,
    /// followed by a `(circular reference)` marker. A template shared by
    /// several branches is expanded each time.
    pub fn to_tree_string(&self, root: &TemplateId) -> String {
        let mut result = format!("{root}\n");
        let mut branch = vec![root.clone()];
        let bases = self.direct_bases(root);
        for (i, base) in bases.iter().enumerate() {
            self.build_tree_string(base, &mut result, "", i == bases.len() - 1, &mut branch);
        }
        result
    }

    fn build_tree_string(
        &self,
        node: &TemplateId,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        branch: &mut Vec<TemplateId>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        result.push_str(&format!("{prefix}{connector}{node}\n"));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if branch.contains(node) {
            result.push_str(&format!("{child_prefix}└── (circular reference)\n"));
            return;
        }

        branch.push(node.clone());
        let bases = self.direct_bases(node);
        for (i, base) in bases.iter().enumerate() {
            self.build_tree_string(base, result, &child_prefix, i == bases.len() - 1, branch);
        }
        branch.pop();
    }
}

impl Default for InheritanceGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> TemplateId {
        TemplateId::from(name)
    }

    #[test]
    fn test_chain_orders_bases_first() {
        let mut graph = InheritanceGraph::new();
        graph.add_base(id("app"), id("lib"));
        graph.add_base(id("lib"), id("core"));

        let order = graph.topological_order().unwrap();
        assert_eq!(order, [id("core"), id("lib"), id("app")]);
        assert_eq!(graph.transitive_bases(&id("app")).len(), 2);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_cycle_reports_path() {
        let mut graph = InheritanceGraph::new();
        graph.add_base(id("a"), id("b"));
        graph.add_base(id("b"), id("c"));
        graph.add_base(id("c"), id("a"));

        let err = graph.detect_cycles().unwrap_err();
        match err.downcast_ref::<TemplarError>() {
            Some(TemplarError::CircularInheritance {
                chain,
            }) => assert_eq!(chain, "a → b → c → a"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_self_inheritance_is_a_cycle() {
        let mut graph = InheritanceGraph::new();
        graph.add_base(id("a"), id("a"));
        assert!(graph.detect_cycles().is_err());
    }

    #[test]
    fn test_direct_bases_keep_declaration_order() {
        let mut graph = InheritanceGraph::new();
        graph.add_base(id("app"), id("zeta"));
        graph.add_base(id("app"), id("alpha"));
        graph.add_base(id("app"), id("zeta"));
        assert_eq!(graph.direct_bases(&id("app")), [id("zeta"), id("alpha")]);
        assert!(graph.direct_bases(&id("unknown")).is_empty());
    }

    #[test]
    fn test_tree_string() {
        let mut graph = InheritanceGraph::new();
        graph.add_base(id("app"), id("lib"));
        graph.add_base(id("app"), id("ci"));
        graph.add_base(id("lib"), id("core"));

        let tree = graph.to_tree_string(&id("app"));
        assert_eq!(tree, "app\n├── lib\n│   └── core\n└── ci\n");
    }

    #[test]
    fn test_tree_string_marks_cycles() {
        let mut graph = InheritanceGraph::new();
        graph.add_base(id("app"), id("lib"));
        graph.add_base(id("lib"), id("app"));

        let tree = graph.to_tree_string(&id("app"));
        assert!(tree.contains("(circular reference)"));
        assert!(tree.starts_with("app\n└── lib\n    └── app\n"));
    }
}
