//! Dependencies and their resolved form.

use super::flags::DependencyFlags;
use super::key::{ArtifactCoords, ArtifactKey, ModuleId};
use crate::constants::{DEFAULT_RELEASE_VERSION, SCOPE_COMPILE};
use crate::paths::{self, EmptyTree, FilteredTree, MultiRootTree, PathFilter, PathTree};
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// An artifact together with its scope and flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    #[serde(rename = "artifact")]
    coords: ArtifactCoords,
    scope: String,
    flags: DependencyFlags,
}

impl Dependency {
    /// Compile-scoped dependency without flags.
    pub fn new(coords: ArtifactCoords) -> Self {
        Self {
            coords,
            scope: SCOPE_COMPILE.to_string(),
            flags: DependencyFlags::empty(),
        }
    }

    pub fn builder(coords: ArtifactCoords) -> DependencyBuilder {
        DependencyBuilder {
            inner: Self::new(coords),
        }
    }

    pub fn coords(&self) -> &ArtifactCoords {
        &self.coords
    }

    pub fn key(&self) -> &ArtifactKey {
        self.coords.key()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn flags(&self) -> DependencyFlags {
        self.flags
    }

    /// ORs `flags` in. Returns `true` when at least one bit was not yet set.
    pub fn set_flags(&mut self, flags: DependencyFlags) -> bool {
        let before = self.flags;
        self.flags |= flags;
        before != self.flags
    }

    /// Explicitly removes `flags`.
    pub fn clear_flags(&mut self, flags: DependencyFlags) {
        self.flags.remove(flags);
    }

    /// Whether every bit of `flags` is set.
    pub fn is_flag_set(&self, flags: DependencyFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Whether any bit of `flags` is set.
    pub fn is_any_flag_set(&self, flags: DependencyFlags) -> bool {
        self.flags.intersects(flags)
    }

    pub fn is_direct(&self) -> bool {
        self.is_flag_set(DependencyFlags::DIRECT)
    }

    pub fn is_optional(&self) -> bool {
        self.is_flag_set(DependencyFlags::OPTIONAL)
    }

    pub fn is_runtime_cp(&self) -> bool {
        self.is_flag_set(DependencyFlags::RUNTIME_CP)
    }

    pub fn is_deployment_cp(&self) -> bool {
        self.is_flag_set(DependencyFlags::DEPLOYMENT_CP)
    }

    /// Reloadable modules are always project modules.
    pub fn is_project_module(&self) -> bool {
        self.is_any_flag_set(DependencyFlags::PROJECT_MODULE | DependencyFlags::RELOADABLE)
    }

    pub fn is_reloadable(&self) -> bool {
        self.is_flag_set(DependencyFlags::RELOADABLE)
    }

    pub fn is_runtime_extension_artifact(&self) -> bool {
        self.is_flag_set(DependencyFlags::RUNTIME_EXTENSION_ARTIFACT)
    }

    pub fn is_top_level_runtime_extension_artifact(&self) -> bool {
        self.is_flag_set(DependencyFlags::TOP_LEVEL_RUNTIME_EXTENSION_ARTIFACT)
    }
}

/// Builder collecting flags before a [`Dependency`] exists.
#[derive(Debug, Clone)]
pub struct DependencyBuilder {
    inner: Dependency,
}

impl DependencyBuilder {
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.inner.scope = scope.into();
        self
    }

    pub fn flags(mut self, flags: DependencyFlags) -> Self {
        self.inner.flags |= flags;
        self
    }

    pub fn direct(self, direct: bool) -> Self {
        self.flag_if(direct, DependencyFlags::DIRECT)
    }

    pub fn optional(self, optional: bool) -> Self {
        self.flag_if(optional, DependencyFlags::OPTIONAL)
    }

    fn flag_if(self, condition: bool, flags: DependencyFlags) -> Self {
        if condition { self.flags(flags) } else { self }
    }

    pub fn build(self) -> Dependency {
        self.inner
    }
}

/// A module developed in the current workspace rather than fetched as a binary.
///
/// Its content is the set of build output directories, which may not exist yet
/// when the module has never been built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceModule {
    pub id: ModuleId,
    pub module_dir: PathBuf,
    pub build_dir: PathBuf,
    pub outputs: Vec<PathBuf>,
}

impl WorkspaceModule {
    /// Output directories that currently exist on disk.
    pub fn existing_outputs(&self) -> Vec<PathBuf> {
        self.outputs.iter().filter(|p| p.is_dir()).cloned().collect()
    }

    pub fn has_content(&self) -> bool {
        self.outputs.iter().any(|p| p.is_dir())
    }

    /// Multi-root tree over the existing output directories.
    pub fn content_tree(&self, release: u32) -> Arc<dyn PathTree> {
        let mut trees: Vec<Arc<dyn PathTree>> = self
            .existing_outputs()
            .into_iter()
            .map(|dir| paths::of_directory_or_archive(&dir, release))
            .collect();
        match trees.len() {
            0 => Arc::new(EmptyTree),
            1 => trees.remove(0),
            _ => Arc::new(MultiRootTree::new(trees)),
        }
    }
}

/// A [`Dependency`] whose content has been located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    #[serde(flatten)]
    dependency: Dependency,
    paths: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_module: Option<WorkspaceModule>,
}

impl ResolvedDependency {
    pub fn new(dependency: Dependency, paths: Vec<PathBuf>) -> Self {
        Self {
            dependency,
            paths,
            workspace_module: None,
        }
    }

    pub fn with_workspace_module(mut self, module: WorkspaceModule) -> Self {
        self.workspace_module = Some(module);
        self
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn workspace_module(&self) -> Option<&WorkspaceModule> {
        self.workspace_module.as_ref()
    }

    /// Content tree at the default release version.
    pub fn content_tree(&self, filter: Option<PathFilter>) -> Arc<dyn PathTree> {
        self.content_tree_for_release(filter, DEFAULT_RELEASE_VERSION)
    }

    /// Content tree of this dependency.
    ///
    /// A workspace module with existing outputs wins over the resolved paths.
    /// Otherwise no path yields an empty tree, one path a directory or archive
    /// tree and several paths a multi-root tree.
    pub fn content_tree_for_release(
        &self,
        filter: Option<PathFilter>,
        release: u32,
    ) -> Arc<dyn PathTree> {
        if let Some(module) = self.workspace_module.as_ref().filter(|m| m.has_content()) {
            return apply_filter(module.content_tree(release), filter);
        }
        let tree: Arc<dyn PathTree> = match self.paths.as_slice() {
            [] => return Arc::new(EmptyTree),
            [single] => paths::of_directory_or_archive(single, release),
            many => Arc::new(MultiRootTree::new(
                many.iter().map(|p| paths::of_directory_or_archive(p, release)).collect(),
            )),
        };
        apply_filter(tree, filter)
    }
}

fn apply_filter(tree: Arc<dyn PathTree>, filter: Option<PathFilter>) -> Arc<dyn PathTree> {
    match filter {
        Some(filter) => Arc::new(FilteredTree::new(tree, filter)),
        None => tree,
    }
}

impl Deref for ResolvedDependency {
    type Target = Dependency;

    fn deref(&self) -> &Self::Target {
        &self.dependency
    }
}

impl DerefMut for ResolvedDependency {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.dependency
    }
}
