//! In-memory storage
//!
//! Keeps stored files in a shared map. Useful for tests and for hosts that
//! persist bytes themselves.

use crate::error::OffshootResult;
use crate::file::UploadedFile;
use crate::storage::backend::StorageBackend;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Storage backend holding files in memory
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // Writes are single inserts or removes, so a poisoned map is still consistent
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stored bytes under `path`
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects().get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects().contains_key(path)
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.objects().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }
}

fn key_filename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn store(
        &self,
        file: &UploadedFile,
        path: &str,
        _move_file: bool,
    ) -> OffshootResult<UploadedFile> {
        let bytes = file.read().await?;
        debug!("Storing {} bytes at memory:{}", bytes.len(), path);
        self.objects().insert(path.to_string(), bytes.clone());
        Ok(UploadedFile::from_bytes(bytes, key_filename(path)))
    }

    async fn retrieve(&self, path: &str) -> OffshootResult<UploadedFile> {
        let bytes = self.get(path).unwrap_or_default();
        Ok(UploadedFile::from_bytes(bytes, key_filename(path)))
    }

    async fn remove(&self, path: &str) -> OffshootResult<()> {
        if self.objects().remove(path).is_some() {
            debug!("Removed memory:{}", path);
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("/{}", path.trim_start_matches('/'))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_objects() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();

        let file = UploadedFile::from_bytes(b"abc".to_vec(), "a.txt");
        storage.store(&file, "dir/a.txt", false).await.unwrap();

        assert_eq!(handle.get("dir/a.txt"), Some(b"abc".to_vec()));
        assert_eq!(handle.keys(), vec!["dir/a.txt".to_string()]);
    }

    #[tokio::test]
    async fn retrieve_missing_is_empty() {
        let storage = MemoryStorage::new();
        let file = storage.retrieve("nope/b.txt").await.unwrap();

        assert!(file.is_empty().await);
        assert_eq!(file.filename(), "b.txt");
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let storage = MemoryStorage::new();
        let file = UploadedFile::from_bytes(b"abc".to_vec(), "a.txt");
        storage.store(&file, "a.txt", false).await.unwrap();

        storage.remove("a.txt").await.unwrap();
        storage.remove("a.txt").await.unwrap();
        assert!(storage.is_empty());
    }
}
