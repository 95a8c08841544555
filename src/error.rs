//! Error types for Offshoot
//!
//! All modules use `OffshootResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Offshoot operations
pub type OffshootResult<T> = Result<T, OffshootError>;

/// All errors that can occur in Offshoot
#[derive(Error, Debug)]
pub enum OffshootError {
    // Version lookup errors
    #[error("Unknown version: {0}")]
    UnknownVersion(String),

    // Cache errors
    #[error("Invalid cache id: {0}")]
    InvalidCacheId(String),

    #[error("Invalid original filename: {0}")]
    InvalidOriginalFilename(String),

    #[error("File is not cached")]
    NotCached,

    // Upload validation errors
    #[error("You are not allowed to upload {filename}, allowed types: {allowed}")]
    IntegrityError { filename: String, allowed: String },

    // Processing errors
    #[error("Processing failed in {processor}: {reason}")]
    ProcessingFailed { processor: String, reason: String },

    // Storage errors
    #[error("Storage operation failed for {path}: {reason}")]
    StorageFailed { path: String, reason: String },

    #[error("Storing versions failed for [{}]: {first}", failed.join(", "))]
    StoreVersionsFailed {
        failed: Vec<String>,
        first: Box<OffshootError>,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl OffshootError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a storage error for the given object path
    pub fn storage(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StorageFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Names of the versions that failed, for aggregate store errors
    pub fn failed_versions(&self) -> &[String] {
        match self {
            Self::StoreVersionsFailed { failed, .. } => failed,
            _ => &[],
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownVersion(_) => Some("Check the [versions] table in your config"),
            Self::ConfigInvalid { .. } => Some("Fix the file, or pass --config to use another one"),
            Self::InvalidCacheId(_) => {
                Some("Cache names look like 1700000000-1234-0001-5678/photo.jpg")
            }
            _ => None,
        }
    }
}
