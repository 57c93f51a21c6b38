//! Extension descriptors.
//!
//! An extension is an ordinary artifact that carries a small properties file
//! (by default `META-INF/appgraph-extension.properties`) describing build-time
//! metadata: its deployment companion, conditional dependencies and classpath
//! placement hints.
//!
//! Descriptor loaders are registered explicitly in a [`DescriptorRegistry`] by
//! name. The registry consults them in registration order; the first loader that
//! recognizes an artifact wins.

pub mod properties;

use crate::constants::{
    CONDITIONAL_DEPENDENCIES, CONDITIONAL_DEV_DEPENDENCIES, DEPENDENCY_CONDITION, DEPLOYMENT_ARTIFACT,
    EXCLUDED_ARTIFACTS, EXTENSION_DESCRIPTOR_PATH, LESSER_PRIORITY_ARTIFACTS, PARENT_FIRST_ARTIFACTS,
    PROVIDES_CAPABILITIES, RUNNER_PARENT_FIRST_ARTIFACTS,
};
use crate::core::AppGraphError;
use crate::models::{ArtifactCoords, ArtifactKey};
use crate::paths::PathTree;
use properties::{parse_properties, split_list};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Build-time metadata of an extension artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtensionInfo {
    /// The runtime artifact carrying the descriptor.
    pub extension: Option<ArtifactCoords>,
    pub deployment_artifact: Option<ArtifactCoords>,
    pub conditional_dependencies: Vec<ArtifactCoords>,
    pub conditional_dev_dependencies: Vec<ArtifactCoords>,
    /// Artifacts that must be resolved before this artifact may be activated
    /// as a conditional dependency.
    pub dependency_conditions: Vec<ArtifactKey>,
    pub provides_capabilities: Vec<String>,
    pub parent_first: Vec<ArtifactKey>,
    pub runner_parent_first: Vec<ArtifactKey>,
    pub excluded: Vec<ArtifactKey>,
    pub lesser_priority: Vec<ArtifactKey>,
    /// Every property of the descriptor, recognized or not.
    pub properties: BTreeMap<String, String>,
}

impl ExtensionInfo {
    /// Interprets descriptor properties. `artifact` names the owner in errors.
    pub fn from_properties(
        artifact: Option<&ArtifactCoords>,
        properties: BTreeMap<String, String>,
    ) -> Result<Self, AppGraphError> {
        let owner = artifact.map_or_else(|| "<unknown>".to_string(), ToString::to_string);
        let deployment_artifact = properties
            .get(DEPLOYMENT_ARTIFACT)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| parse_item::<ArtifactCoords>(&owner, DEPLOYMENT_ARTIFACT, v))
            .transpose()?;

        Ok(Self {
            extension: artifact.cloned(),
            deployment_artifact,
            conditional_dependencies: parse_list(&owner, &properties, CONDITIONAL_DEPENDENCIES)?,
            conditional_dev_dependencies: parse_list(&owner, &properties, CONDITIONAL_DEV_DEPENDENCIES)?,
            dependency_conditions: parse_list(&owner, &properties, DEPENDENCY_CONDITION)?,
            provides_capabilities: properties
                .get(PROVIDES_CAPABILITIES)
                .map(|v| split_list(v))
                .unwrap_or_default(),
            parent_first: parse_list(&owner, &properties, PARENT_FIRST_ARTIFACTS)?,
            runner_parent_first: parse_list(&owner, &properties, RUNNER_PARENT_FIRST_ARTIFACTS)?,
            excluded: parse_list(&owner, &properties, EXCLUDED_ARTIFACTS)?,
            lesser_priority: parse_list(&owner, &properties, LESSER_PRIORITY_ARTIFACTS)?,
            properties,
        })
    }

    pub fn parse(artifact: Option<&ArtifactCoords>, text: &str) -> Result<Self, AppGraphError> {
        Self::from_properties(artifact, parse_properties(text))
    }

    pub fn has_conditional_deps(&self, dev_mode: bool) -> bool {
        !self.conditional_dependencies.is_empty()
            || (dev_mode && !self.conditional_dev_dependencies.is_empty())
    }

    /// Conditional dependencies active in the given mode, dev ones last.
    pub fn conditional_deps(&self, dev_mode: bool) -> impl Iterator<Item = &ArtifactCoords> {
        let dev: &[ArtifactCoords] = if dev_mode { &self.conditional_dev_dependencies } else { &[] };
        self.conditional_dependencies.iter().chain(dev.iter())
    }
}

fn parse_item<T>(owner: &str, property: &str, value: &str) -> Result<T, AppGraphError>
where
    T: FromStr<Err = AppGraphError>,
{
    value.parse().map_err(|e: AppGraphError| AppGraphError::InvalidDescriptor {
        artifact: owner.to_string(),
        reason: format!("{property}: {e}"),
    })
}

fn parse_list<T>(
    owner: &str,
    properties: &BTreeMap<String, String>,
    property: &str,
) -> Result<Vec<T>, AppGraphError>
where
    T: FromStr<Err = AppGraphError>,
{
    properties
        .get(property)
        .map(|v| split_list(v))
        .unwrap_or_default()
        .iter()
        .map(|item| parse_item(owner, property, item))
        .collect()
}

/// Source of extension metadata for an artifact's content.
pub trait ExtensionInfoLoader: Send + Sync + fmt::Debug {
    /// Name under which the loader is registered.
    fn name(&self) -> &str;

    /// `Ok(None)` when the artifact is not an extension for this loader.
    fn load(
        &self,
        artifact: &ArtifactCoords,
        content: &dyn PathTree,
    ) -> Result<Option<ExtensionInfo>, AppGraphError>;
}

/// Reads a properties descriptor at a fixed relative path.
#[derive(Debug, Clone)]
pub struct PropertiesDescriptorLoader {
    path: String,
}

impl PropertiesDescriptorLoader {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Default for PropertiesDescriptorLoader {
    fn default() -> Self {
        Self::new(EXTENSION_DESCRIPTOR_PATH)
    }
}

impl ExtensionInfoLoader for PropertiesDescriptorLoader {
    fn name(&self) -> &str {
        "properties"
    }

    fn load(
        &self,
        artifact: &ArtifactCoords,
        content: &dyn PathTree,
    ) -> Result<Option<ExtensionInfo>, AppGraphError> {
        let bytes = content.read_entry(&self.path).map_err(|e| AppGraphError::InvalidDescriptor {
            artifact: artifact.to_string(),
            reason: e.to_string(),
        })?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let text = String::from_utf8(bytes).map_err(|e| AppGraphError::InvalidDescriptor {
            artifact: artifact.to_string(),
            reason: format!("{}: {}", self.path, e),
        })?;
        ExtensionInfo::parse(Some(artifact), &text).map(Some)
    }
}

/// Explicit table of descriptor loaders.
#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    loaders: Vec<(String, Arc<dyn ExtensionInfoLoader>)>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a [`PropertiesDescriptorLoader`] at `descriptor_path`.
    pub fn with_properties_loader(descriptor_path: impl Into<String>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PropertiesDescriptorLoader::new(descriptor_path)));
        registry
    }

    /// Adds a loader, replacing any loader registered under the same name.
    pub fn register(&mut self, loader: Arc<dyn ExtensionInfoLoader>) {
        let name = loader.name().to_string();
        match self.loaders.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = loader,
            None => self.loaders.push((name, loader)),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.loaders.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Extension metadata of an artifact, `None` for ordinary libraries.
    ///
    /// Malformed or unreadable descriptors are logged and treated as absent.
    pub fn load(&self, artifact: &ArtifactCoords, content: &dyn PathTree) -> Option<ExtensionInfo> {
        for (name, loader) in &self.loaders {
            match loader.load(artifact, content) {
                Ok(Some(info)) => {
                    debug!("Loader '{}' found extension metadata in {}", name, artifact);
                    return Some(info);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Ignoring extension descriptor of {}: {}", artifact, e);
                    return None;
                }
            }
        }
        None
    }
}
