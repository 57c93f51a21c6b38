//! Result of a resolution.

use super::dependency::ResolvedDependency;
use super::flags::DependencyFlags;
use super::key::{ArtifactKey, ModuleId};
use crate::config::LaunchMode;
use crate::models::ArtifactCoords;
use crate::paths::{PathFilter, PathTree};
use crate::platform::AlignmentVerdict;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Capabilities declared by one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionCapabilities {
    pub extension: ArtifactCoords,
    pub provides: Vec<String>,
}

/// Final dependency list of an application for one launch mode.
///
/// Runtime dependencies come first, in discovery order, followed by the
/// deployment-only dependencies. No two entries share an [`ArtifactKey`].
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationModel {
    pub(crate) app: ModuleId,
    pub(crate) mode: LaunchMode,
    pub(crate) release_version: u32,
    pub(crate) dependencies: Vec<ResolvedDependency>,
    pub(crate) platform: AlignmentVerdict,
    pub(crate) parent_first: BTreeSet<ArtifactKey>,
    pub(crate) runner_parent_first: BTreeSet<ArtifactKey>,
    pub(crate) lesser_priority: BTreeSet<ArtifactKey>,
    pub(crate) excluded: BTreeSet<ArtifactKey>,
    pub(crate) local_project_dependencies: BTreeSet<ArtifactKey>,
    pub(crate) extension_capabilities: Vec<ExtensionCapabilities>,
    /// Conditional dependencies whose conditions were never met.
    pub(crate) inactive_conditional_dependencies: Vec<ArtifactCoords>,
}

impl ApplicationModel {
    pub fn app(&self) -> &ModuleId {
        &self.app
    }

    pub fn mode(&self) -> LaunchMode {
        self.mode
    }

    pub fn release_version(&self) -> u32 {
        self.release_version
    }

    pub fn dependencies(&self) -> &[ResolvedDependency] {
        &self.dependencies
    }

    pub fn dependency(&self, key: &ArtifactKey) -> Option<&ResolvedDependency> {
        self.dependencies.iter().find(|d| d.key() == key)
    }

    pub fn runtime_dependencies(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.dependencies.iter().filter(|d| d.is_runtime_cp())
    }

    /// Dependencies only needed while building the application.
    pub fn deployment_dependencies(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.dependencies.iter().filter(|d| d.is_deployment_cp() && !d.is_runtime_cp())
    }

    pub fn dependencies_with(&self, flags: DependencyFlags) -> impl Iterator<Item = &ResolvedDependency> {
        self.dependencies.iter().filter(move |d| d.is_flag_set(flags))
    }

    pub fn platform(&self) -> &AlignmentVerdict {
        &self.platform
    }

    pub fn parent_first(&self) -> &BTreeSet<ArtifactKey> {
        &self.parent_first
    }

    pub fn runner_parent_first(&self) -> &BTreeSet<ArtifactKey> {
        &self.runner_parent_first
    }

    pub fn lesser_priority(&self) -> &BTreeSet<ArtifactKey> {
        &self.lesser_priority
    }

    pub fn excluded(&self) -> &BTreeSet<ArtifactKey> {
        &self.excluded
    }

    pub fn local_project_dependencies(&self) -> &BTreeSet<ArtifactKey> {
        &self.local_project_dependencies
    }

    pub fn extension_capabilities(&self) -> &[ExtensionCapabilities] {
        &self.extension_capabilities
    }

    pub fn inactive_conditional_dependencies(&self) -> &[ArtifactCoords] {
        &self.inactive_conditional_dependencies
    }

    /// Content of a dependency at this model's release version.
    pub fn content_tree(&self, key: &ArtifactKey, filter: Option<PathFilter>) -> Option<Arc<dyn PathTree>> {
        self.dependency(key)
            .map(|d| d.content_tree_for_release(filter, self.release_version))
    }
}
