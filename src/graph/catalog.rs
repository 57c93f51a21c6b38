//! Artifact catalog: the graph exported by the artifact resolution engine.
//!
//! ```json
//! {
//!   "root": "org.acme:app:1.0",
//!   "workspace_modules": ["org.acme:lib"],
//!   "platform": {
//!     "imports": ["org.acme:platform-platform-descriptor:1.0:json"],
//!     "properties": { "platform.release-info@org.acme$main#1.0": "org.acme:platform:1.0" }
//!   },
//!   "modules": [
//!     { "id": "org.acme:app:1.0", "dependencies": ["org.acme:ext-a:1.0"] },
//!     { "id": "org.acme:ext-a:1.0", "artifacts": [{ "path": "repo/ext-a-1.0.jar" }] }
//!   ]
//! }
//! ```
//!
//! Relative paths resolve against the directory holding the catalog file.

use crate::constants::TYPE_JAR;
use crate::core::AppGraphError;
use crate::models::{ArtifactKey, ModuleId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactCatalog {
    pub root: ModuleId,
    /// `group:artifact` keys of modules developed in the current workspace.
    #[serde(default)]
    pub workspace_modules: Vec<ArtifactKey>,
    #[serde(default)]
    pub platform: PlatformSection,
    #[serde(default)]
    pub modules: Vec<CatalogModule>,
}

/// Platform BOM imports and the release properties they contributed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformSection {
    #[serde(default)]
    pub imports: Vec<crate::models::ArtifactCoords>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogModule {
    pub id: ModuleId,
    #[serde(default)]
    pub dependencies: Vec<CatalogEdge>,
    #[serde(default)]
    pub artifacts: Vec<CatalogArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<CatalogWorkspace>,
}

/// A dependency edge: a bare module id or a detailed object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEdge {
    Plain(ModuleId),
    Detailed {
        module: ModuleId,
        #[serde(default)]
        scope: Option<String>,
        #[serde(default)]
        optional: bool,
    },
}

impl CatalogEdge {
    pub fn module(&self) -> &ModuleId {
        match self {
            Self::Plain(module) | Self::Detailed { module, .. } => module,
        }
    }

    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Detailed { scope, .. } => scope.as_deref(),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Detailed { optional: true, .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogArtifact {
    #[serde(default)]
    pub classifier: String,
    #[serde(default = "default_type", rename = "type")]
    pub artifact_type: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_type() -> String {
    TYPE_JAR.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogWorkspace {
    pub module_dir: PathBuf,
    /// Defaults to `<module_dir>/build`.
    #[serde(default)]
    pub build_dir: Option<PathBuf>,
    /// Output directories, relative to the build directory.
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
}

impl ArtifactCatalog {
    /// Reads and validates a catalog file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact catalog {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid artifact catalog {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks that module ids are unique and that the root is listed.
    pub fn validate(&self) -> Result<(), AppGraphError> {
        let mut seen = BTreeMap::new();
        for module in &self.modules {
            if seen.insert(&module.id, ()).is_some() {
                return Err(AppGraphError::CatalogError {
                    path: "<catalog>".to_string(),
                    reason: format!("module {} is listed twice", module.id),
                });
            }
        }
        if !seen.contains_key(&self.root) {
            return Err(AppGraphError::ModuleNotFound {
                module: self.root.to_string(),
            });
        }
        Ok(())
    }

    pub fn module(&self, id: &ModuleId) -> Option<&CatalogModule> {
        self.modules.iter().find(|m| &m.id == id)
    }
}
