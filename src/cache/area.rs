//! Local cache directory management
//!
//! Files are staged under `<root>/<cache_dir>/<cache_id>/<filename>` before
//! they are committed to a storage backend. A root file and all of its
//! versions share one cache id directory.

use crate::cache::id::CacheId;
use crate::error::{OffshootError, OffshootResult};
use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// A cache directory below a local root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheArea {
    root: PathBuf,
    dir: String,
}

impl CacheArea {
    pub fn new(root: impl Into<PathBuf>, dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            dir: dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Absolute directory holding every cache id
    pub fn base_path(&self) -> PathBuf {
        self.root.join(&self.dir)
    }

    /// Directory for one cache id
    pub fn dir_for(&self, id: &CacheId) -> PathBuf {
        self.base_path().join(id.as_str())
    }

    /// Path of a cached file
    pub fn path_for(&self, id: &CacheId, filename: &str) -> PathBuf {
        self.dir_for(id).join(filename)
    }

    /// Root-relative URL of a cached file
    pub fn url_for(&self, id: &CacheId, filename: &str) -> String {
        let dir = self.dir.trim_matches('/');
        if dir.is_empty() {
            format!("/{}/{}", id, filename)
        } else {
            format!("/{}/{}/{}", dir, id, filename)
        }
    }

    /// Remove the directory for `id` if nothing is left in it
    ///
    /// Sibling versions share the directory, so a non-empty directory is
    /// left alone.
    pub async fn remove_dir_if_empty(&self, id: &CacheId) {
        let dir = self.dir_for(id);
        match fs::remove_dir(&dir).await {
            Ok(()) => debug!("Removed cache directory {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!("Keeping cache directory {}: {}", dir.display(), e),
        }
    }

    /// Delete cache directories whose cache id is older than `max_age`
    ///
    /// Returns the number of directories removed. Entries that are not
    /// valid cache ids are skipped.
    pub async fn clean(&self, max_age: Duration) -> OffshootResult<u32> {
        let base = self.base_path();
        if !fs::try_exists(&base).await.unwrap_or(false) {
            return Ok(0);
        }

        let cutoff = Utc::now() - max_age;
        let mut cleaned = 0;
        let mut entries = fs::read_dir(&base).await.map_err(|e| {
            OffshootError::io(format!("reading cache directory {}", base.display()), e)
        })?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| OffshootError::io("reading cache entry", e))?
        {
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| CacheId::parse(n).ok()) else {
                continue;
            };
            let Some(created_at) = id.created_at() else {
                continue;
            };

            if created_at < cutoff {
                if let Err(e) = fs::remove_dir_all(entry.path()).await {
                    warn!("Failed to remove cache directory {}: {}", id, e);
                    continue;
                }
                debug!("Cleaned cache directory {}", id);
                cleaned += 1;
            }
        }

        Ok(cleaned)
    }
}
