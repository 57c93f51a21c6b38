//! Depth-first walk of a resolved graph, deduplicating artifacts by key.

use crate::descriptor::{DescriptorRegistry, ExtensionInfo};
use crate::graph::{DependencyGraph, GraphNode, ResolvedArtifact};
use crate::models::{ArtifactKey, Dependency, DependencyFlags, ModuleId, ResolvedDependency, WorkspaceModule};
use bitflags::bitflags;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, trace};

bitflags! {
    /// Traversal state threaded through the recursion by value.
    ///
    /// Each frame hands its children a copy, so a flag set for one subtree is
    /// gone again once the walk unwinds past the frame that set it.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct WalkingFlags: u8 {
        /// A top-level extension has been found above this point.
        const COLLECT_TOP_EXTENSIONS = 0b001;
        /// The branch was reached through an optional edge.
        const OPTIONAL = 0b010;
    }
}

#[derive(Debug, Clone, Copy)]
struct WalkContext<'g> {
    flags: WalkingFlags,
    parent: Option<&'g ModuleId>,
}

/// One artifact seen by the walker.
#[derive(Debug, Clone)]
pub(crate) struct ProcessedDependency {
    pub dependency: Dependency,
    pub module: ModuleId,
    /// Module through which the artifact was first reached, `None` for
    /// dependencies of the root.
    pub parent: Option<ModuleId>,
    pub path: Option<PathBuf>,
    pub workspace: Option<WorkspaceModule>,
    pub extension: Option<ExtensionInfo>,
}

impl ProcessedDependency {
    pub fn key(&self) -> &ArtifactKey {
        self.dependency.key()
    }

    pub fn to_resolved(&self) -> ResolvedDependency {
        let resolved = ResolvedDependency::new(self.dependency.clone(), self.path.iter().cloned().collect());
        match &self.workspace {
            Some(module) => resolved.with_workspace_module(module.clone()),
            None => resolved,
        }
    }
}

/// Processed artifacts in discovery order, indexed by key.
#[derive(Debug, Default)]
pub(crate) struct ProcessedDeps {
    records: Vec<ProcessedDependency>,
    index: HashMap<ArtifactKey, usize>,
}

impl ProcessedDeps {
    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &ArtifactKey) -> Option<&ProcessedDependency> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    fn get_mut(&mut self, key: &ArtifactKey) -> Option<&mut ProcessedDependency> {
        self.index.get(key).map(|&i| &mut self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessedDependency> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ProcessedDependency> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn keys(&self) -> BTreeSet<ArtifactKey> {
        self.index.keys().cloned().collect()
    }

    fn insert(&mut self, record: ProcessedDependency) -> &ProcessedDependency {
        let index = self.records.len();
        self.index.insert(record.key().clone(), index);
        self.records.push(record);
        &self.records[index]
    }
}

/// Walks runtime graphs, creating one [`ProcessedDependency`] per new key.
pub(crate) struct DependencyWalker<'a> {
    pub registry: &'a DescriptorRegistry,
    pub release_version: u32,
    pub workspace_keys: &'a BTreeSet<ArtifactKey>,
    pub dev_mode: bool,
}

impl DependencyWalker<'_> {
    /// Walks `graph`, adding unseen artifacts to `processed` and passing each
    /// new record to `on_new`. Returns the number of new records.
    ///
    /// Records already in `processed` never have their side effects repeated,
    /// but their subtrees are walked again so edges added since the previous
    /// walk are followed.
    pub fn walk(
        &self,
        graph: &DependencyGraph,
        processed: &mut ProcessedDeps,
        on_new: &mut dyn FnMut(&ProcessedDependency),
    ) -> usize {
        let before = processed.len();
        let mut visited = HashSet::new();
        let root = WalkContext {
            flags: WalkingFlags::empty(),
            parent: None,
        };
        for (child, edge) in graph.children(graph.root()) {
            let mut ctx = root;
            ctx.flags.set(WalkingFlags::OPTIONAL, edge.optional);
            self.visit(graph, child, ctx, &mut visited, processed, on_new);
        }
        let added = processed.len() - before;
        debug!("Walked {} modules, {} new artifacts", visited.len(), added);
        added
    }

    fn visit<'g>(
        &self,
        graph: &'g DependencyGraph,
        idx: NodeIndex,
        ctx: WalkContext<'g>,
        visited: &mut HashSet<NodeIndex>,
        processed: &mut ProcessedDeps,
        on_new: &mut dyn FnMut(&ProcessedDependency),
    ) {
        let node = graph.node(idx);
        if !visited.insert(idx) {
            if ctx.parent.is_none() {
                mark_direct(node, processed);
            }
            return;
        }
        let mut top_level_extension = false;

        for artifact in &node.artifacts {
            let key = artifact.coords.key();
            if let Some(existing) = processed.get_mut(key) {
                if ctx.parent.is_none() {
                    existing.dependency.set_flags(DependencyFlags::DIRECT);
                }
                top_level_extension |=
                    existing.dependency.is_flag_set(DependencyFlags::TOP_LEVEL_RUNTIME_EXTENSION_ARTIFACT);
                continue;
            }
            let record = self.process(node.module.clone(), node.workspace.as_ref(), artifact, ctx);
            top_level_extension |= record.dependency.is_top_level_runtime_extension_artifact();
            trace!("Processed {}", record.dependency.coords());
            on_new(processed.insert(record));
        }

        let mut child_flags = ctx.flags;
        if top_level_extension {
            child_flags |= WalkingFlags::COLLECT_TOP_EXTENSIONS;
        }
        for (child, edge) in graph.children(idx) {
            let mut flags = child_flags;
            if edge.optional {
                flags |= WalkingFlags::OPTIONAL;
            }
            let child_ctx = WalkContext {
                flags,
                parent: Some(&node.module),
            };
            self.visit(graph, child, child_ctx, visited, processed, on_new);
        }
    }

    fn process(
        &self,
        module: ModuleId,
        workspace: Option<&WorkspaceModule>,
        artifact: &ResolvedArtifact,
        ctx: WalkContext<'_>,
    ) -> ProcessedDependency {
        let mut flags = DependencyFlags::empty();
        if ctx.parent.is_none() {
            flags |= DependencyFlags::DIRECT;
        }
        if ctx.flags.contains(WalkingFlags::OPTIONAL) {
            flags |= DependencyFlags::OPTIONAL;
        }
        let project_module = workspace.is_some() || self.workspace_keys.contains(&module.ga_key());
        if project_module {
            flags |= DependencyFlags::PROJECT_MODULE;
            if self.dev_mode {
                flags |= DependencyFlags::RELOADABLE;
            }
        }

        let mut record = ProcessedDependency {
            dependency: Dependency::builder(artifact.coords.clone()).flags(flags).build(),
            module,
            parent: ctx.parent.cloned(),
            path: artifact.path.clone(),
            workspace: workspace.cloned(),
            extension: None,
        };
        record.extension = self.load_extension(&record);
        if record.extension.is_some() {
            record.dependency.set_flags(DependencyFlags::RUNTIME_EXTENSION_ARTIFACT);
            if !ctx.flags.contains(WalkingFlags::COLLECT_TOP_EXTENSIONS) {
                record.dependency.set_flags(DependencyFlags::TOP_LEVEL_RUNTIME_EXTENSION_ARTIFACT);
            }
        }
        record
    }

    fn load_extension(&self, record: &ProcessedDependency) -> Option<ExtensionInfo> {
        let has_content = record.path.as_ref().is_some_and(|p| p.exists())
            || record.workspace.as_ref().is_some_and(WorkspaceModule::has_content);
        if !has_content {
            return None;
        }
        let tree = record.to_resolved().content_tree_for_release(None, self.release_version);
        self.registry.load(record.dependency.coords(), tree.as_ref())
    }
}

/// A module reached transitively first may still be a dependency of the root.
fn mark_direct(node: &GraphNode, processed: &mut ProcessedDeps) {
    for artifact in &node.artifacts {
        if let Some(existing) = processed.get_mut(artifact.coords.key()) {
            existing.dependency.set_flags(DependencyFlags::DIRECT);
        }
    }
}

/// Loads extension metadata of a single artifact outside of any walk.
pub(crate) fn load_artifact_extension(
    registry: &DescriptorRegistry,
    release_version: u32,
    artifact: &ResolvedArtifact,
) -> Option<ExtensionInfo> {
    let path = artifact.path.as_ref().filter(|p| p.exists())?;
    let tree = crate::paths::of_directory_or_archive(path, release_version);
    registry.load(&artifact.coords, tree.as_ref())
}
