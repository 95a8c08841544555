//! Configuration management for Offshoot

pub mod schema;

pub use schema::{
    BackendKind, Config, GeneralConfig, MountConfig, ProcessorConfig, StorageConfig,
    VersionConfig,
};

use crate::error::{OffshootError, OffshootResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("offshoot")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults if not present
    pub async fn load(&self) -> OffshootResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> OffshootResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| OffshootError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| OffshootError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        validate(&config).map_err(|reason| OffshootError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> OffshootResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            OffshootError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> OffshootResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OffshootError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Check cross-references a TOML schema cannot express
///
/// Every `from_version` must name a sibling version.
fn validate(config: &Config) -> Result<(), String> {
    fn check(
        versions: &std::collections::BTreeMap<String, VersionConfig>,
        prefix: &str,
    ) -> Result<(), String> {
        for (name, version) in versions {
            let qualified = format!("{}{}", prefix, name);
            if let Some(ref source) = version.from_version {
                if !versions.contains_key(source) {
                    return Err(format!(
                        "version '{}' has from_version '{}', which is not a sibling version",
                        qualified, source
                    ));
                }
                if source == name {
                    return Err(format!("version '{}' cannot be built from itself", qualified));
                }
            }
            check(&version.versions, &format!("{}.", qualified))?;
        }
        Ok(())
    }

    check(&config.versions, "")
}
