//! Configuration schema for Offshoot
//!
//! Configuration is stored at `~/.config/offshoot/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache and storage settings
    pub storage: StorageConfig,

    /// Model/mount addressing used for store paths
    pub mount: MountConfig,

    /// Version definitions, keyed by version name
    pub versions: BTreeMap<String, VersionConfig>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local directory below `root`
    #[default]
    File,
    /// In-process map (nothing survives the process)
    Memory,
}

/// Cache and storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend
    pub backend: BackendKind,

    /// Local root for the cache and the file backend
    pub root: PathBuf,

    /// Cache directory, relative to `root`
    pub cache_dir: String,

    /// Store directory template; `{model}`, `{model_id}` and `{mounted_as}`
    /// are substituted. Defaults to `uploads/{model}/{mounted_as}/{model_id}`.
    pub store_dir: Option<String>,

    /// Host prefixed to stored file URLs
    pub asset_host: Option<String>,

    /// URL returned when no file is present
    pub default_url: Option<String>,

    /// Move (rather than copy) the uploaded file into the cache
    pub move_to_cache: bool,

    /// Move (rather than copy) cached files into storage
    pub move_to_store: bool,

    /// Delete cached files once they are stored
    pub delete_tmp_file_after_storage: bool,

    /// Allowed file extensions (empty = any)
    pub extension_allowlist: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            root: PathBuf::from("public"),
            cache_dir: "uploads/tmp".to_string(),
            store_dir: None,
            asset_host: None,
            default_url: None,
            move_to_cache: false,
            move_to_store: false,
            delete_tmp_file_after_storage: true,
            extension_allowlist: vec![],
        }
    }
}

/// Host model the upload is attached to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Model name, e.g. "user"
    pub model: Option<String>,

    /// Model identifier, e.g. "42"
    pub model_id: Option<String>,

    /// Attribute the upload is mounted as, e.g. "avatar"
    pub mounted_as: Option<String>,
}

/// One version definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Build this version from another version's cached output
    pub from_version: Option<String>,

    /// Only generate this version for these extensions (empty = always)
    pub if_extension: Vec<String>,

    /// Commands run on the cached file, in order
    pub processors: Vec<ProcessorConfig>,

    /// Nested sub-versions
    pub versions: BTreeMap<String, VersionConfig>,
}

/// External command run on a cached file
///
/// `{path}` in `args` is replaced with the cached file's path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[storage]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.storage.cache_dir, "uploads/tmp");
        assert_eq!(config.storage.backend, BackendKind::File);
        assert!(config.versions.is_empty());
    }

    #[test]
    fn config_deserializes_nested_versions() {
        let toml = r#"
            [storage]
            backend = "memory"

            [versions.thumb]
            if_extension = ["jpg", "png"]

            [[versions.thumb.processors]]
            program = "mogrify"
            args = ["-resize", "100x100", "{path}"]

            [versions.thumb.versions.small]

            [versions.preview]
            from_version = "thumb"
        "#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.storage.cache_dir, "uploads/tmp"); // default preserved

        let thumb = &config.versions["thumb"];
        assert_eq!(thumb.if_extension, vec!["jpg", "png"]);
        assert_eq!(thumb.processors[0].program, "mogrify");
        assert!(thumb.versions.contains_key("small"));
        assert_eq!(
            config.versions["preview"].from_version.as_deref(),
            Some("thumb")
        );
    }
}
