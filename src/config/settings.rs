use super::LaunchMode;
use crate::constants::{CONFIG_PATH_ENV, DEFAULT_RELEASE_VERSION, EXTENSION_DESCRIPTOR_PATH};
use crate::core::AppGraphError;
use crate::descriptor::DescriptorRegistry;
use crate::platform::MisalignmentPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// User-level resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Reaction to imported platform BOMs from different releases.
    pub misaligned_platform_imports: MisalignmentPolicy,
    /// Running platform feature version used by the multi-release overlay.
    pub release_version: u32,
    /// Modes resolved when the command line does not name any.
    pub launch_modes: Vec<LaunchMode>,
    /// Location of the extension descriptor inside artifacts.
    pub descriptor_path: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            misaligned_platform_imports: MisalignmentPolicy::default(),
            release_version: DEFAULT_RELEASE_VERSION,
            launch_modes: vec![LaunchMode::Normal],
            descriptor_path: EXTENSION_DESCRIPTOR_PATH.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Loads the configuration from its default location.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Loads from `path` when given, otherwise from [`Self::default_path`].
    /// A missing file yields the defaults.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// `APPGRAPH_CONFIG_PATH` if set, otherwise the per-user location.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("appgraph")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".appgraph")
        };
        Ok(config_dir.join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), AppGraphError> {
        if self.launch_modes.is_empty() {
            return Err(AppGraphError::ConfigError {
                message: "launch_modes must name at least one mode".to_string(),
            });
        }
        if self.descriptor_path.trim().is_empty() {
            return Err(AppGraphError::ConfigError {
                message: "descriptor_path must not be empty".to_string(),
            });
        }
        if self.release_version < 8 {
            return Err(AppGraphError::ConfigError {
                message: format!("release_version {} is below 8", self.release_version),
            });
        }
        Ok(())
    }

    /// Descriptor loaders for the configured descriptor location.
    pub fn descriptor_registry(&self) -> DescriptorRegistry {
        DescriptorRegistry::with_properties_loader(self.descriptor_path.clone())
    }
}
