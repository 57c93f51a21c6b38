//! [`GraphHost`] backed by an [`ArtifactCatalog`].

use super::{DependencyGraph, GraphHost, GraphNode, GraphRequest, ResolvedArtifact};
use crate::constants::{SCOPE_COMPILE, SCOPE_TEST};
use crate::core::AppGraphError;
use crate::graph::catalog::{ArtifactCatalog, CatalogModule};
use crate::models::{ArtifactCoords, ArtifactKey, ModuleId, WorkspaceModule};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct CatalogGraphHost {
    catalog: ArtifactCatalog,
    base_dir: PathBuf,
}

impl CatalogGraphHost {
    /// `base_dir` anchors relative artifact and workspace paths.
    pub fn new(catalog: ArtifactCatalog, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            base_dir: base_dir.into(),
        }
    }

    /// Loads a catalog file, anchoring paths at its parent directory.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let catalog = ArtifactCatalog::from_file(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(catalog, base_dir))
    }

    pub fn catalog(&self) -> &ArtifactCatalog {
        &self.catalog
    }

    fn module(&self, id: &ModuleId) -> Result<&CatalogModule, AppGraphError> {
        self.catalog.module(id).ok_or_else(|| AppGraphError::ModuleNotFound {
            module: id.to_string(),
        })
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.base_dir.join(path) }
    }

    fn node(&self, module: &CatalogModule) -> GraphNode {
        let artifacts = module
            .artifacts
            .iter()
            .map(|a| ResolvedArtifact {
                coords: ArtifactCoords::new(
                    ArtifactKey::new(
                        module.id.group_id(),
                        module.id.artifact_id(),
                        a.classifier.as_str(),
                        a.artifact_type.as_str(),
                    ),
                    module.id.version(),
                ),
                path: a.path.as_deref().map(|p| self.resolve_path(p)),
            })
            .collect();
        let workspace = module.workspace.as_ref().map(|ws| {
            let module_dir = self.resolve_path(&ws.module_dir);
            let build_dir = ws
                .build_dir
                .as_deref()
                .map_or_else(|| module_dir.join("build"), |p| self.resolve_path(p));
            WorkspaceModule {
                id: module.id.clone(),
                outputs: ws.outputs.iter().map(|o| build_dir.join(o)).collect(),
                module_dir,
                build_dir,
            }
        });
        GraphNode {
            module: module.id.clone(),
            artifacts,
            workspace,
        }
    }

    fn attach(
        &self,
        graph: &mut DependencyGraph,
        queue: &mut VecDeque<NodeIndex>,
        from: NodeIndex,
        target: &ModuleId,
        scope: &str,
        optional: bool,
    ) -> Result<(), AppGraphError> {
        let (to, created) = match graph.find(target) {
            Some(idx) => (idx, false),
            None => graph.add_node(self.node(self.module(target)?)),
        };
        graph.add_edge(from, to, scope, optional);
        if created {
            queue.push_back(to);
        }
        Ok(())
    }
}

impl GraphHost for CatalogGraphHost {
    fn resolve(&self, request: &GraphRequest<'_>) -> Result<DependencyGraph, AppGraphError> {
        let root = self.module(request.root)?;
        let mut graph = DependencyGraph::new(self.node(root));
        let mut queue = VecDeque::from([graph.root()]);

        while let Some(idx) = queue.pop_front() {
            let is_root = idx == graph.root();
            let id = graph.node(idx).module.clone();
            let module = self.module(&id)?;

            for edge in &module.dependencies {
                let scope = edge.scope().unwrap_or(SCOPE_COMPILE);
                // test scope is never transitive
                if scope == SCOPE_TEST && !(is_root && request.include_test_scope) {
                    continue;
                }
                self.attach(&mut graph, &mut queue, idx, edge.module(), scope, edge.is_optional())?;
            }
            for extra in request.variants.selected_dependencies(&id, request.selection) {
                trace!("Variant dependency {} -> {}", id, extra);
                self.attach(&mut graph, &mut queue, idx, &extra.module_id(), SCOPE_COMPILE, false)?;
            }
            if is_root {
                for extra in request.extra_dependencies {
                    self.attach(&mut graph, &mut queue, idx, &extra.module_id(), SCOPE_COMPILE, false)?;
                }
            }
        }

        debug!(
            "Resolved graph of {}: {} modules, {} edges",
            request.root,
            graph.module_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    fn resolve_artifact(&self, coords: &ArtifactCoords) -> Result<ResolvedArtifact, AppGraphError> {
        let not_found = || AppGraphError::ArtifactNotFound {
            coords: coords.to_string(),
        };
        let module = self.catalog.module(&coords.module_id()).ok_or_else(not_found)?;
        self.node(module)
            .artifacts
            .into_iter()
            .find(|a| a.coords.key() == coords.key())
            .ok_or_else(not_found)
    }

    fn workspace_keys(&self) -> BTreeSet<ArtifactKey> {
        let mut keys: BTreeSet<ArtifactKey> = self
            .catalog
            .workspace_modules
            .iter()
            .map(|k| ArtifactKey::ga(k.group_id(), k.artifact_id()))
            .collect();
        keys.insert(self.catalog.root.ga_key());
        keys.extend(self.catalog.modules.iter().filter(|m| m.workspace.is_some()).map(|m| m.id.ga_key()));
        keys
    }
}
