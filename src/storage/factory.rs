//! Backend factory for creating configured storage backends

use crate::config::{BackendKind, StorageConfig};
use crate::storage::backend::StorageBackend;
use crate::storage::file::FileStorage;
use crate::storage::memory::MemoryStorage;
use std::sync::Arc;
use tracing::debug;

/// Create the storage backend selected by `config`
pub fn create_storage(config: &StorageConfig) -> Arc<dyn StorageBackend> {
    debug!("Using {:?} storage backend", config.backend);
    match config.backend {
        BackendKind::File => Arc::new(FileStorage::new(config.root.clone())),
        BackendKind::Memory => Arc::new(MemoryStorage::new()),
    }
}
