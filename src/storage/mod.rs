//! Storage backends for committed files
//!
//! Provides a key-addressed put/get/delete abstraction:
//! - `FileStorage`: local directory
//! - `MemoryStorage`: in-process map

mod backend;
mod factory;
pub mod file;
pub mod memory;

pub use backend::StorageBackend;
pub use factory::create_storage;
pub use file::FileStorage;
pub use memory::MemoryStorage;
