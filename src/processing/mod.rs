//! Processing of cached files
//!
//! Processors transform a cached file in place. Each uploader definition
//! carries its own ordered list; they run right after the file lands in
//! the cache, before any version is derived from it.

mod command;

pub use command::CommandProcessor;

use crate::error::{OffshootError, OffshootResult};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// In-place transformation of a cached file
#[async_trait]
pub trait Processor: Send + Sync {
    /// Transform the file at `path`
    async fn process(&self, path: &Path) -> OffshootResult<()>;

    /// Name used in logs and errors
    fn name(&self) -> &str;
}

type ByteTransform = dyn Fn(Vec<u8>) -> OffshootResult<Vec<u8>> + Send + Sync;

/// Processor wrapping a closure over the file's bytes
#[derive(Clone)]
pub struct FnProcessor {
    name: String,
    transform: Arc<ByteTransform>,
}

impl FnProcessor {
    pub fn new<F>(name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Vec<u8>) -> OffshootResult<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
        }
    }
}

impl fmt::Debug for FnProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProcessor").field("name", &self.name).finish()
    }
}

#[async_trait]
impl Processor for FnProcessor {
    async fn process(&self, path: &Path) -> OffshootResult<()> {
        debug!("Running {} on {}", self.name, path.display());

        let bytes = fs::read(path)
            .await
            .map_err(|e| OffshootError::io(format!("reading {}", path.display()), e))?;
        let output = (self.transform)(bytes).map_err(|e| OffshootError::ProcessingFailed {
            processor: self.name.clone(),
            reason: e.to_string(),
        })?;
        fs::write(path, output)
            .await
            .map_err(|e| OffshootError::io(format!("writing {}", path.display()), e))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn fn_processor_rewrites_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        std::fs::write(&path, b"abc").unwrap();

        let upper = FnProcessor::new("upcase", |bytes: Vec<u8>| Ok(bytes.to_ascii_uppercase()));
        upper.process(&path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"ABC");
    }

    #[tokio::test]
    async fn fn_processor_wraps_failures() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        std::fs::write(&path, b"abc").unwrap();

        let failing = FnProcessor::new("broken", |_| Err(OffshootError::User("nope".to_string())));
        let err = failing.process(&path).await.unwrap_err();

        assert!(matches!(
            err,
            OffshootError::ProcessingFailed { ref processor, .. } if processor == "broken"
        ));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
    }
}
