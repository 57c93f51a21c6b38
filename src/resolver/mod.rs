//! Application model resolution.
//!
//! [`ApplicationModelResolver`] turns the raw graph offered by a [`GraphHost`]
//! into an [`ApplicationModel`] for one [`LaunchMode`]:
//!
//! 1. **Walk** (`walker`) - depth-first over the graph, one record per
//!    [`ArtifactKey`](crate::models::ArtifactKey), extension metadata loaded from
//!    each artifact's content, top-level extensions flagged
//! 2. **Conditional fixpoint** (`conditional`) - conditional dependencies of
//!    extensions are activated as component variants once their conditions are
//!    met, re-resolving the graph until no pending entry can be activated
//! 3. **Partition** (`deployment`) - deployment companions of top-level and
//!    activated conditional extensions and their closure form the
//!    deployment-only set
//! 4. **Platform check** - imported platform BOMs must be aligned, subject to
//!    [`MisalignmentPolicy`]
//!
//! Resolution is single threaded. Independent modes share nothing and
//! [`ApplicationModelResolver::resolve_modes`] runs them on blocking tasks in
//! parallel.

mod conditional;
mod deployment;
mod walker;

use crate::config::{LaunchMode, ResolverConfig};
use crate::core::AppGraphError;
use crate::descriptor::DescriptorRegistry;
use crate::graph::GraphHost;
use crate::models::{
    ApplicationModel, ArtifactKey, DependencyFlags, ExtensionCapabilities, ModuleId,
};
use crate::platform::{AlignmentVerdict, MisalignmentPolicy, PlatformReleases};
use conditional::ConditionalDependencyResolver;
use deployment::DeploymentPartitioner;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};
use walker::DependencyWalker;

/// Builds [`ApplicationModel`]s from a [`GraphHost`].
#[derive(Clone)]
pub struct ApplicationModelResolver {
    host: Arc<dyn GraphHost>,
    registry: DescriptorRegistry,
    release_version: u32,
    policy: MisalignmentPolicy,
    platform: Option<Arc<PlatformReleases>>,
}

impl ApplicationModelResolver {
    pub fn new(host: Arc<dyn GraphHost>) -> Self {
        Self::from_config(host, &ResolverConfig::default())
    }

    pub fn from_config(host: Arc<dyn GraphHost>, config: &ResolverConfig) -> Self {
        Self {
            host,
            registry: config.descriptor_registry(),
            release_version: config.release_version,
            policy: config.misaligned_platform_imports,
            platform: None,
        }
    }

    pub fn with_registry(mut self, registry: DescriptorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_release_version(mut self, release_version: u32) -> Self {
        self.release_version = release_version;
        self
    }

    pub fn with_policy(mut self, policy: MisalignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Platform releases and imports checked by every resolution.
    pub fn with_platform(mut self, platform: PlatformReleases) -> Self {
        self.platform = Some(Arc::new(platform));
        self
    }

    pub fn resolve(&self, root: &ModuleId, mode: LaunchMode) -> Result<ApplicationModel, AppGraphError> {
        let platform = match &self.platform {
            Some(platform) => platform.verify(self.policy)?,
            None => AlignmentVerdict::Aligned,
        };

        let workspace_keys = self.host.workspace_keys();
        let configuration = mode.configuration_name();
        let walker = DependencyWalker {
            registry: &self.registry,
            release_version: self.release_version,
            workspace_keys: &workspace_keys,
            dev_mode: mode.is_dev(),
        };
        let resolution = ConditionalDependencyResolver::new(
            self.host.as_ref(),
            walker,
            root,
            mode.includes_test_scope(),
            configuration.clone(),
        )
        .resolve()?;

        let deployment = DeploymentPartitioner {
            host: self.host.as_ref(),
            root,
            include_test_scope: mode.includes_test_scope(),
            configuration: &configuration,
            project_keys: &workspace_keys,
        }
        .partition(&resolution.processed, &resolution.variants, &resolution.activated)?;

        let mut model = ApplicationModel {
            app: root.clone(),
            mode,
            release_version: self.release_version,
            dependencies: Vec::with_capacity(resolution.processed.len() + deployment.len()),
            platform,
            parent_first: BTreeSet::new(),
            runner_parent_first: BTreeSet::new(),
            lesser_priority: BTreeSet::new(),
            excluded: BTreeSet::new(),
            local_project_dependencies: BTreeSet::new(),
            extension_capabilities: Vec::new(),
            inactive_conditional_dependencies: resolution.inactive,
        };

        for record in resolution.processed.iter() {
            let Some(ext) = &record.extension else {
                continue;
            };
            model.parent_first.extend(ext.parent_first.iter().cloned());
            model.runner_parent_first.extend(ext.runner_parent_first.iter().cloned());
            model.lesser_priority.extend(ext.lesser_priority.iter().cloned());
            model.excluded.extend(ext.excluded.iter().cloned());
            if !ext.provides_capabilities.is_empty() {
                model.extension_capabilities.push(ExtensionCapabilities {
                    extension: record.dependency.coords().clone(),
                    provides: ext.provides_capabilities.clone(),
                });
            }
        }

        let runtime = resolution.processed.iter().map(|record| {
            let mut resolved = record.to_resolved();
            resolved.set_flags(DependencyFlags::RUNTIME_CP | DependencyFlags::DEPLOYMENT_CP);
            resolved
        });
        for dep in runtime.chain(deployment) {
            if is_excluded(&model.excluded, dep.key()) {
                debug!("Excluding {}", dep.coords());
                continue;
            }
            if dep.is_project_module() {
                model.local_project_dependencies.insert(dep.key().clone());
            }
            model.dependencies.push(dep);
        }

        info!(
            "{} [{}]: {} runtime, {} deployment-only dependencies",
            root,
            mode,
            model.runtime_dependencies().count(),
            model.deployment_dependencies().count()
        );
        Ok(model)
    }

    /// Resolves several modes in parallel.
    pub async fn resolve_modes(
        &self,
        root: &ModuleId,
        modes: &[LaunchMode],
    ) -> Result<Vec<ApplicationModel>, AppGraphError> {
        let tasks = modes.iter().map(|&mode| {
            let resolver = self.clone();
            let root = root.clone();
            async move {
                tokio::task::spawn_blocking(move || resolver.resolve(&root, mode))
                    .await
                    .map_err(|e| AppGraphError::Other {
                        message: format!("Resolution task for mode {mode} failed: {e}"),
                    })?
            }
        });
        futures::future::try_join_all(tasks).await
    }
}

fn is_excluded(excluded: &BTreeSet<ArtifactKey>, key: &ArtifactKey) -> bool {
    excluded.contains(key) || excluded.iter().any(|e| e.classifier().is_empty() && e.same_ga(key))
}
