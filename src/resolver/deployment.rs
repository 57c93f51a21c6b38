//! Deployment classpath partitioning.
//!
//! Every top-level runtime extension pulls in its deployment companion, and so
//! does every activated conditional extension, since the deployment artifact
//! of the declaring extension never depends on it. A companion of an extension
//! required by the root, or by a workspace module, becomes a direct dependency
//! of the deployment resolution; any other companion is attached as a variant
//! of the module that required the extension, so selecting the deployment
//! attribute yields exactly one extra edge per module. Whatever the deployment
//! graph reaches beyond the runtime keys forms the deployment-only set.

use super::conditional::QueuedVariant;
use super::walker::ProcessedDeps;
use crate::constants::{CONDITIONAL_ATTRIBUTE, DEPLOYMENT_ATTRIBUTE, DEPLOYMENT_VARIANT_PREFIX};
use crate::core::AppGraphError;
use crate::graph::{ComponentVariants, DependencyGraph, GraphHost, GraphRequest, VariantSelection};
use crate::models::{
    ArtifactCoords, ArtifactKey, Dependency, DependencyFlags, ModuleId, ResolvedDependency,
};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

pub(crate) struct DeploymentPartitioner<'a> {
    pub host: &'a dyn GraphHost,
    pub root: &'a ModuleId,
    pub include_test_scope: bool,
    pub configuration: &'a str,
    pub project_keys: &'a BTreeSet<ArtifactKey>,
}

impl DeploymentPartitioner<'_> {
    /// Deployment-only dependencies of a fully resolved runtime set.
    pub fn partition(
        &self,
        runtime: &ProcessedDeps,
        conditional_variants: &ComponentVariants,
        activated: &[QueuedVariant],
    ) -> Result<Vec<ResolvedDependency>, AppGraphError> {
        let mut variants = conditional_variants.clone();
        let direct = self.init_deployment_variants(runtime, activated, &mut variants);

        let selection = VariantSelection::new()
            .with(CONDITIONAL_ATTRIBUTE, self.configuration)
            .with(DEPLOYMENT_ATTRIBUTE, self.configuration);
        let request = GraphRequest {
            root: self.root,
            variants: &variants,
            selection: &selection,
            extra_dependencies: &direct,
            include_test_scope: self.include_test_scope,
        };
        let graph = self.host.resolve(&request)?;
        let direct_keys: HashSet<ModuleId> = direct.iter().map(ArtifactCoords::module_id).collect();

        let mut collected = Vec::new();
        let mut seen: HashSet<ArtifactKey> = runtime.keys().into_iter().collect();
        let mut visited = HashSet::new();
        for (child, _) in graph.children(graph.root()) {
            collect(&graph, child, &direct_keys, &mut visited, &mut seen, &mut collected);
        }
        debug!(
            "{} deployment-only artifacts from {} direct and {} variant companions",
            collected.len(),
            direct.len(),
            variants.dependency_count() - conditional_variants.dependency_count()
        );
        Ok(collected)
    }

    /// Decides where the companion of each top-level or activated conditional
    /// extension is attached and returns the companions that become direct
    /// dependencies.
    fn init_deployment_variants(
        &self,
        runtime: &ProcessedDeps,
        activated: &[QueuedVariant],
        variants: &mut ComponentVariants,
    ) -> Vec<ArtifactCoords> {
        let mut direct = Vec::new();
        for dep in runtime.iter() {
            if !dep.dependency.is_top_level_runtime_extension_artifact() {
                continue;
            }
            if let Some(companion) = dep.extension.as_ref().and_then(|e| e.deployment_artifact.clone()) {
                self.attach(dep.parent.as_ref(), companion, variants, &mut direct);
            }
        }
        for entry in activated {
            let top_level = runtime
                .get(entry.dependency.coords.key())
                .is_some_and(|d| d.dependency.is_top_level_runtime_extension_artifact());
            if top_level {
                continue;
            }
            let companion = entry.dependency.extension.as_ref().and_then(|e| e.deployment_artifact.clone());
            if let Some(companion) = companion {
                self.attach(Some(&entry.parent), companion, variants, &mut direct);
            }
        }
        direct
    }

    fn attach(
        &self,
        parent: Option<&ModuleId>,
        companion: ArtifactCoords,
        variants: &mut ComponentVariants,
        direct: &mut Vec<ArtifactCoords>,
    ) {
        match parent {
            Some(parent) if !self.project_keys.contains(&parent.ga_key()) => {
                debug!("Deployment variant of {} adds {}", parent, companion);
                let name = format!("{DEPLOYMENT_VARIANT_PREFIX}{}", self.configuration);
                variants.add_dependency(parent, &name, DEPLOYMENT_ATTRIBUTE, self.configuration, companion);
            }
            // workspace modules cannot carry variants
            _ => {
                if !direct.iter().any(|d| d.key().same_ga(companion.key())) {
                    direct.push(companion);
                }
            }
        }
    }
}

fn collect(
    graph: &DependencyGraph,
    idx: NodeIndex,
    direct: &HashSet<ModuleId>,
    visited: &mut HashSet<NodeIndex>,
    seen: &mut HashSet<ArtifactKey>,
    out: &mut Vec<ResolvedDependency>,
) {
    if !visited.insert(idx) {
        return;
    }
    let node = graph.node(idx);
    for artifact in &node.artifacts {
        if !seen.insert(artifact.coords.key().clone()) {
            continue;
        }
        let dependency = Dependency::builder(artifact.coords.clone())
            .flags(DependencyFlags::DEPLOYMENT_CP)
            .direct(direct.contains(&node.module))
            .build();
        let resolved = ResolvedDependency::new(dependency, artifact.path.iter().cloned().collect());
        out.push(match &node.workspace {
            Some(ws) => resolved.with_workspace_module(ws.clone()),
            None => resolved,
        });
    }
    for (child, _) in graph.children(idx) {
        collect(graph, child, direct, visited, seen, out);
    }
}
