//! Fixpoint over conditional dependencies.
//!
//! Extensions declare dependencies that only join the application once the
//! artifacts named by the dependency's own `dependency-condition` are present.
//! Activating one conditional dependency can satisfy the conditions of others,
//! so resolution alternates between re-walking the host graph and scanning the
//! queue of pending entries until a scan activates nothing.

use super::walker::{DependencyWalker, ProcessedDependency, ProcessedDeps, load_artifact_extension};
use crate::constants::{CONDITIONAL_ATTRIBUTE, CONDITIONAL_VARIANT_PREFIX};
use crate::core::AppGraphError;
use crate::descriptor::ExtensionInfo;
use crate::graph::{ComponentVariants, DependencyGraph, GraphHost, GraphRequest, VariantSelection};
use crate::models::{ArtifactCoords, ArtifactKey, ModuleId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

/// A conditional dependency resolved on its own, without transitives.
#[derive(Debug)]
pub(crate) struct ConditionalDependency {
    pub coords: ArtifactCoords,
    pub extension: Option<ExtensionInfo>,
}

impl ConditionalDependency {
    /// Every condition key must already be processed. No metadata or an
    /// empty condition list is trivially satisfied.
    fn is_satisfied(&self, processed: &ProcessedDeps) -> bool {
        self.extension
            .as_ref()
            .is_none_or(|ext| ext.dependency_conditions.iter().all(|key| processed.contains(key)))
    }
}

#[derive(Debug)]
pub(crate) struct QueuedVariant {
    /// Module of the extension declaring the dependency.
    pub parent: ModuleId,
    pub dependency: Arc<ConditionalDependency>,
}

/// Outcome of the fixpoint.
#[derive(Debug)]
pub(crate) struct ConditionalResolution {
    pub graph: DependencyGraph,
    pub processed: ProcessedDeps,
    pub variants: ComponentVariants,
    /// Activated entries in activation order.
    pub activated: Vec<QueuedVariant>,
    pub inactive: Vec<ArtifactCoords>,
    pub rounds: usize,
}

pub(crate) struct ConditionalDependencyResolver<'a> {
    host: &'a dyn GraphHost,
    walker: DependencyWalker<'a>,
    root: &'a ModuleId,
    include_test_scope: bool,
    configuration: String,
    processed: ProcessedDeps,
    queue: VecDeque<QueuedVariant>,
    queued: HashSet<(ModuleId, ArtifactKey)>,
    all_conditional_deps: HashMap<ArtifactCoords, Arc<ConditionalDependency>>,
    variants: ComponentVariants,
    activated: Vec<QueuedVariant>,
}

impl<'a> ConditionalDependencyResolver<'a> {
    pub fn new(
        host: &'a dyn GraphHost,
        walker: DependencyWalker<'a>,
        root: &'a ModuleId,
        include_test_scope: bool,
        configuration: String,
    ) -> Self {
        Self {
            host,
            walker,
            root,
            include_test_scope,
            configuration,
            processed: ProcessedDeps::default(),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            all_conditional_deps: HashMap::new(),
            variants: ComponentVariants::new(),
            activated: Vec::new(),
        }
    }

    pub fn resolve(mut self) -> Result<ConditionalResolution, AppGraphError> {
        let mut graph = self.process_graph()?;
        let mut rounds = 1;

        while !self.queue.is_empty() {
            if !self.activate_satisfied()? {
                break;
            }
            graph = self.process_graph()?;
            rounds += 1;
        }

        let inactive: Vec<ArtifactCoords> =
            self.queue.iter().map(|q| q.dependency.coords.clone()).collect();
        for coords in &inactive {
            debug!("Conditional dependency {} stays inactive", coords);
        }
        info!(
            "Resolved {} artifacts in {} round(s), {} conditional dependencies activated",
            self.processed.len(),
            rounds,
            self.variants.dependency_count()
        );
        Ok(ConditionalResolution {
            graph,
            processed: self.processed,
            variants: self.variants,
            activated: self.activated,
            inactive,
            rounds,
        })
    }

    fn selection(&self) -> VariantSelection {
        VariantSelection::new().with(CONDITIONAL_ATTRIBUTE, &self.configuration)
    }

    /// Resolves the host graph with the variants activated so far and walks
    /// it, queuing conditional dependencies of every new extension.
    fn process_graph(&mut self) -> Result<DependencyGraph, AppGraphError> {
        let selection = self.selection();
        let request = GraphRequest {
            root: self.root,
            variants: &self.variants,
            selection: &selection,
            extra_dependencies: &[],
            include_test_scope: self.include_test_scope,
        };
        let graph = self.host.resolve(&request)?;

        let mut pending = Vec::new();
        let dev_mode = self.walker.dev_mode;
        self.walker.walk(&graph, &mut self.processed, &mut |record: &ProcessedDependency| {
            if let Some(ext) = &record.extension {
                pending.extend(ext.conditional_deps(dev_mode).map(|dep| (record.module.clone(), dep.clone())));
            }
        });
        for (parent, coords) in pending {
            self.queue_conditional(parent, &coords)?;
        }
        Ok(graph)
    }

    fn queue_conditional(&mut self, parent: ModuleId, coords: &ArtifactCoords) -> Result<(), AppGraphError> {
        if !self.queued.insert((parent.clone(), coords.key().clone())) {
            return Ok(());
        }
        let dependency = self.conditional_dependency(coords)?;
        debug!("Queued conditional dependency {} of {}", coords, parent);
        self.queue.push_back(QueuedVariant { parent, dependency });
        Ok(())
    }

    /// Detached resolution of a conditional dependency, memoized.
    fn conditional_dependency(
        &mut self,
        coords: &ArtifactCoords,
    ) -> Result<Arc<ConditionalDependency>, AppGraphError> {
        if let Some(dep) = self.all_conditional_deps.get(coords) {
            return Ok(Arc::clone(dep));
        }
        let artifact = self.host.resolve_artifact(coords)?;
        let extension =
            load_artifact_extension(self.walker.registry, self.walker.release_version, &artifact);
        let dep = Arc::new(ConditionalDependency {
            coords: artifact.coords,
            extension,
        });
        self.all_conditional_deps.insert(coords.clone(), Arc::clone(&dep));
        Ok(dep)
    }

    /// One scan of the queue. Returns whether anything was activated.
    fn activate_satisfied(&mut self) -> Result<bool, AppGraphError> {
        let mut satisfied_any = false;
        let mut remaining = VecDeque::with_capacity(self.queue.len());
        let mut follow_ups = Vec::new();

        while let Some(entry) = self.queue.pop_front() {
            if !entry.dependency.is_satisfied(&self.processed) {
                remaining.push_back(entry);
                continue;
            }
            satisfied_any = true;
            let name = format!("{CONDITIONAL_VARIANT_PREFIX}{}", self.configuration);
            let added = self.variants.add_dependency(
                &entry.parent,
                &name,
                CONDITIONAL_ATTRIBUTE,
                &self.configuration,
                entry.dependency.coords.clone(),
            );
            debug!(
                "Conditional variant {} -> {} satisfied{}",
                entry.parent,
                entry.dependency.coords,
                if added { "" } else { ", already present" }
            );
            if let Some(ext) = &entry.dependency.extension {
                let module = entry.dependency.coords.module_id();
                follow_ups.extend(ext.conditional_deps(self.walker.dev_mode).map(|d| (module.clone(), d.clone())));
            }
            self.activated.push(entry);
        }
        self.queue = remaining;
        for (parent, coords) in follow_ups {
            self.queue_conditional(parent, &coords)?;
        }
        Ok(satisfied_any)
    }
}
