//! Host model context an uploader is mounted on
//!
//! The context is only used to address stored files. It is shared
//! unchanged by a root uploader and every one of its versions.

use crate::config::MountConfig;

/// Default store directory template
pub const DEFAULT_STORE_DIR: &str = "uploads/{model}/{mounted_as}/{model_id}";

/// Model and attribute an upload belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mount {
    /// Model name, e.g. "user"
    pub model: Option<String>,

    /// Model identifier, e.g. "42"
    pub model_id: Option<String>,

    /// Attribute the upload is mounted as, e.g. "avatar"
    pub mounted_as: Option<String>,
}

impl Mount {
    pub fn new(
        model: impl Into<String>,
        model_id: impl Into<String>,
        mounted_as: impl Into<String>,
    ) -> Self {
        Self {
            model: Some(model.into()),
            model_id: Some(model_id.into()),
            mounted_as: Some(mounted_as.into()),
        }
    }

    /// Substitute `{model}`, `{model_id}` and `{mounted_as}` in `template`
    ///
    /// Segments left empty by missing values are dropped, so an unmounted
    /// uploader stores below `uploads`.
    pub fn expand(&self, template: &str) -> String {
        let expanded = template
            .replace("{model}", self.model.as_deref().unwrap_or(""))
            .replace("{model_id}", self.model_id.as_deref().unwrap_or(""))
            .replace("{mounted_as}", self.mounted_as.as_deref().unwrap_or(""));

        expanded
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl From<&MountConfig> for Mount {
    fn from(config: &MountConfig) -> Self {
        Self {
            model: config.model.clone(),
            model_id: config.model_id.clone(),
            mounted_as: config.mounted_as.clone(),
        }
    }
}
