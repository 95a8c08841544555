//! Local directory storage
//!
//! Stores files below a root directory on the local filesystem using
//! tokio fs operations.

use crate::error::{OffshootError, OffshootResult};
use crate::file::UploadedFile;
use crate::storage::backend::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Storage backend writing to a local directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a storage key
    ///
    /// Rejects keys that would escape the root.
    fn full_path(&self, path: &str) -> OffshootResult<PathBuf> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return Err(OffshootError::storage(path, "path escapes storage root"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn store(
        &self,
        file: &UploadedFile,
        path: &str,
        move_file: bool,
    ) -> OffshootResult<UploadedFile> {
        let dest = self.full_path(path)?;
        debug!("Storing {} at {}", file.filename(), dest.display());

        if file.path() == Some(dest.as_path()) {
            return Ok(UploadedFile::from_path(dest));
        }

        if move_file {
            file.clone().move_to(&dest).await
        } else {
            file.copy_to(&dest).await
        }
    }

    async fn retrieve(&self, path: &str) -> OffshootResult<UploadedFile> {
        Ok(UploadedFile::from_path(self.full_path(path)?))
    }

    async fn remove(&self, path: &str) -> OffshootResult<()> {
        let full = self.full_path(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => {
                debug!("Removed {}", full.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OffshootError::io(format!("removing {}", full.display()), e)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("/{}", path.trim_start_matches('/'))
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn store_retrieve_remove() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::new(temp.path());

        let file = UploadedFile::from_bytes(b"data".to_vec(), "a.txt");
        let stored = storage.store(&file, "uploads/a.txt", false).await.unwrap();
        assert_eq!(stored.read().await.unwrap(), b"data");

        let retrieved = storage.retrieve("uploads/a.txt").await.unwrap();
        assert_eq!(retrieved.path(), Some(temp.path().join("uploads/a.txt").as_path()));

        storage.remove("uploads/a.txt").await.unwrap();
        assert!(!temp.path().join("uploads/a.txt").exists());

        // Second removal is a no-op
        storage.remove("uploads/a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn store_with_move_consumes_source() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("cache/a.txt");
        std::fs::create_dir_all(src.parent().unwrap()).unwrap();
        std::fs::write(&src, b"data").unwrap();

        let storage = FileStorage::new(temp.path().join("public"));
        storage
            .store(&UploadedFile::from_path(&src), "a.txt", true)
            .await
            .unwrap();

        assert!(!src.exists());
        assert!(temp.path().join("public/a.txt").exists());
    }

    #[tokio::test]
    async fn rejects_escaping_paths() {
        let storage = FileStorage::new("/srv/public");
        assert!(storage.retrieve("../etc/passwd").await.is_err());
        assert!(storage.retrieve("").await.is_err());
    }

    #[test]
    fn url_is_root_relative() {
        let storage = FileStorage::new("/srv/public");
        assert_eq!(storage.url("uploads/a.txt"), "/uploads/a.txt");
    }
}
