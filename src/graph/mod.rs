//! The raw dependency graph handed over by the artifact resolution engine.
//!
//! Nodes are modules ([`ModuleId`]) that materialize zero or more concrete
//! artifacts; edges carry the declared scope. The graph may contain cycles and
//! diamonds. Resolution of the graph itself is delegated to a [`GraphHost`],
//! which also honors [`ComponentVariants`]: extra dependencies attached to a
//! module under an attribute, activated when the request selects that attribute.

pub mod catalog;
mod host;
mod variants;

pub use catalog::ArtifactCatalog;
pub use host::CatalogGraphHost;
pub use variants::{ComponentVariants, Variant, VariantSelection};

use crate::core::AppGraphError;
use crate::models::{ArtifactCoords, ArtifactKey, ModuleId, WorkspaceModule};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// A concrete file produced by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub coords: ArtifactCoords,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub module: ModuleId,
    pub artifacts: Vec<ResolvedArtifact>,
    pub workspace: Option<WorkspaceModule>,
}

#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub scope: String,
    pub optional: bool,
    order: usize,
}

/// Directed module graph with a distinguished root.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    node_map: HashMap<ModuleId, NodeIndex>,
    root: NodeIndex,
    edges_added: usize,
}

impl DependencyGraph {
    pub fn new(root: GraphNode) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let module = root.module.clone();
        let root = graph.add_node(root);
        node_map.insert(module, root);
        Self {
            graph,
            node_map,
            root,
            edges_added: 0,
        }
    }

    /// Adds a node, returning the existing index for a known module.
    pub fn add_node(&mut self, node: GraphNode) -> (NodeIndex, bool) {
        if let Some(&idx) = self.node_map.get(&node.module) {
            return (idx, false);
        }
        let module = node.module.clone();
        let idx = self.graph.add_node(node);
        self.node_map.insert(module, idx);
        (idx, true)
    }

    /// Adds an edge unless `from` already depends on `to`.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, scope: &str, optional: bool) -> bool {
        if self.graph.find_edge(from, to).is_some() {
            return false;
        }
        self.graph.add_edge(
            from,
            to,
            GraphEdge {
                scope: scope.to_string(),
                optional,
                order: self.edges_added,
            },
        );
        self.edges_added += 1;
        true
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    pub fn find(&self, module: &ModuleId) -> Option<NodeIndex> {
        self.node_map.get(module).copied()
    }

    /// Direct dependencies of `idx` in declaration order.
    pub fn children(&self, idx: NodeIndex) -> Vec<(NodeIndex, &GraphEdge)> {
        let mut children: Vec<_> = self.graph.edges(idx).map(|e| (e.target(), e.weight())).collect();
        children.sort_by_key(|(_, edge)| edge.order);
        children
    }

    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Artifact keys of every node except the root.
    pub fn artifact_keys(&self) -> BTreeSet<ArtifactKey> {
        self.graph
            .node_indices()
            .filter(|idx| *idx != self.root)
            .flat_map(|idx| self.graph[idx].artifacts.iter().map(|a| a.coords.key().clone()))
            .collect()
    }
}

/// What to resolve.
#[derive(Debug, Clone, Copy)]
pub struct GraphRequest<'a> {
    pub root: &'a ModuleId,
    pub variants: &'a ComponentVariants,
    pub selection: &'a VariantSelection,
    /// Dependencies added to the root on top of its declared ones.
    pub extra_dependencies: &'a [ArtifactCoords],
    /// Whether the root's test-scoped dependencies take part.
    pub include_test_scope: bool,
}

/// The external artifact-resolution engine.
pub trait GraphHost: Send + Sync {
    /// Resolves the full dependency graph for a request.
    fn resolve(&self, request: &GraphRequest<'_>) -> Result<DependencyGraph, AppGraphError>;

    /// Resolves a single artifact without its dependencies.
    fn resolve_artifact(&self, coords: &ArtifactCoords) -> Result<ResolvedArtifact, AppGraphError>;

    /// `group:artifact` keys of modules that live in the current workspace.
    fn workspace_keys(&self) -> BTreeSet<ArtifactKey>;
}
