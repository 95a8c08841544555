//! Storage backend abstraction
//!
//! Provides a trait for committing cached files to persistent storage,
//! implemented by different backends (local directory, in-memory).

use crate::error::OffshootResult;
use crate::file::UploadedFile;
use async_trait::async_trait;

/// Key-addressed blob store
///
/// Paths are `/`-separated keys relative to the backend's root, e.g.
/// `uploads/user/avatar/1/thumb_photo.jpg`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Commit `file` under `path`, returning a handle to the stored file
    ///
    /// When `move_file` is set the backend may consume the source file
    /// instead of copying it.
    async fn store(
        &self,
        file: &UploadedFile,
        path: &str,
        move_file: bool,
    ) -> OffshootResult<UploadedFile>;

    /// Get a handle to the file stored under `path`
    ///
    /// The handle is returned even when nothing is stored there yet; it
    /// reports itself as empty.
    async fn retrieve(&self, path: &str) -> OffshootResult<UploadedFile>;

    /// Delete the file stored under `path`; absent files are not an error
    async fn remove(&self, path: &str) -> OffshootResult<()>;

    /// Public URL of the file stored under `path`
    fn url(&self, path: &str) -> String;

    /// Get the human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}
