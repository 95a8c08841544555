//! File handle passed between the cache, process and store steps
//!
//! An `UploadedFile` is either a path on local disk or an in-memory byte
//! buffer, paired with the filename it should be stored under.

use crate::error::{OffshootError, OffshootResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Fallback used when sanitizing leaves nothing meaningful
const FALLBACK_FILENAME: &str = "file";

/// Where the bytes of an `UploadedFile` live
#[derive(Debug, Clone)]
pub enum FileSource {
    /// File on local disk
    Path(PathBuf),

    /// Bytes held in memory
    Bytes(Arc<[u8]>),
}

/// A source of bytes with a filename
#[derive(Debug, Clone)]
pub struct UploadedFile {
    source: FileSource,
    original_filename: Option<String>,
}

impl UploadedFile {
    /// Wrap a file on disk, naming it after the last path component
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: FileSource::Path(path.into()),
            original_filename: None,
        }
    }

    /// Wrap an in-memory buffer under the given filename
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, filename: impl Into<String>) -> Self {
        Self {
            source: FileSource::Bytes(Arc::from(bytes.into())),
            original_filename: Some(filename.into()),
        }
    }

    /// Override the filename this handle reports
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.original_filename = Some(filename.into());
        self
    }

    /// Filename as given, before sanitizing
    pub fn original_filename(&self) -> Option<&str> {
        if let Some(ref name) = self.original_filename {
            return Some(name);
        }
        match &self.source {
            FileSource::Path(path) => path.file_name().and_then(|n| n.to_str()),
            FileSource::Bytes(_) => None,
        }
    }

    /// Sanitized filename, safe to use as a path component
    pub fn filename(&self) -> String {
        sanitize_filename(self.original_filename().unwrap_or(FALLBACK_FILENAME))
    }

    /// Lowercased extension of the filename, if any
    pub fn extension(&self) -> Option<String> {
        let name = self.filename();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Local path backing this file, if it lives on disk
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(path) => Some(path),
            FileSource::Bytes(_) => None,
        }
    }

    /// Where the bytes live
    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Size in bytes (0 when the backing path does not exist)
    pub async fn size(&self) -> u64 {
        match &self.source {
            FileSource::Path(path) => fs::metadata(path).await.map(|m| m.len()).unwrap_or(0),
            FileSource::Bytes(bytes) => bytes.len() as u64,
        }
    }

    /// Whether there is nothing to upload
    pub async fn is_empty(&self) -> bool {
        self.size().await == 0
    }

    /// Whether the backing bytes are present
    pub async fn exists(&self) -> bool {
        match &self.source {
            FileSource::Path(path) => fs::try_exists(path).await.unwrap_or(false),
            FileSource::Bytes(_) => true,
        }
    }

    /// Read the full contents
    pub async fn read(&self) -> OffshootResult<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => fs::read(path)
                .await
                .map_err(|e| OffshootError::io(format!("reading {}", path.display()), e)),
            FileSource::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// Copy the contents to `dest`, creating parent directories
    pub async fn copy_to(&self, dest: &Path) -> OffshootResult<UploadedFile> {
        ensure_parent(dest).await?;

        match &self.source {
            FileSource::Path(path) => {
                debug!("Copying {} to {}", path.display(), dest.display());
                fs::copy(path, dest).await.map_err(|e| {
                    OffshootError::io(
                        format!("copying {} to {}", path.display(), dest.display()),
                        e,
                    )
                })?;
            }
            FileSource::Bytes(bytes) => {
                fs::write(dest, bytes)
                    .await
                    .map_err(|e| OffshootError::io(format!("writing {}", dest.display()), e))?;
            }
        }

        Ok(UploadedFile::from_path(dest))
    }

    /// Move the contents to `dest`, consuming the source file
    ///
    /// Falls back to copy + delete when a rename is not possible
    /// (e.g. across filesystems).
    pub async fn move_to(self, dest: &Path) -> OffshootResult<UploadedFile> {
        let FileSource::Path(ref path) = self.source else {
            return self.copy_to(dest).await;
        };

        ensure_parent(dest).await?;
        if fs::rename(path, dest).await.is_ok() {
            debug!("Moved {} to {}", path.display(), dest.display());
            return Ok(UploadedFile::from_path(dest));
        }

        let moved = self.copy_to(dest).await?;
        self.delete().await?;
        Ok(moved)
    }

    /// Delete the backing file; missing files are not an error
    pub async fn delete(&self) -> OffshootResult<()> {
        if let FileSource::Path(path) = &self.source {
            match fs::remove_file(path).await {
                Ok(()) => debug!("Deleted {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(OffshootError::io(
                        format!("deleting {}", path.display()),
                        e,
                    ))
                }
            }
        }
        Ok(())
    }
}

async fn ensure_parent(dest: &Path) -> OffshootResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| OffshootError::io(format!("creating directory {}", parent.display()), e))?;
    }
    Ok(())
}

/// Whether a character may appear in a stored filename
pub(crate) fn is_safe_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_')
}

/// Reduce a filename to its last path component and replace unsafe characters
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim();

    let sanitized: String = base
        .chars()
        .map(|c| if is_safe_filename_char(c) { c } else { '_' })
        .collect();

    if sanitized.chars().all(|c| c == '.' || c == '_') {
        return FALLBACK_FILENAME.to_string();
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_filename("/tmp/uploads/photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_filename("C:\\Users\\me\\photo.jpg"), "photo.jpg");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("ünïcode.png"), "_n_code.png");
    }

    #[test]
    fn sanitize_rejects_dot_only_names() {
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn extension_is_lowercased() {
        let file = UploadedFile::from_bytes(b"x".to_vec(), "Photo.JPG");
        assert_eq!(file.extension(), Some("jpg".to_string()));

        let dotfile = UploadedFile::from_bytes(b"x".to_vec(), ".hidden");
        assert_eq!(dotfile.extension(), None);
    }

    #[tokio::test]
    async fn bytes_copy_to_disk() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("nested/dir/out.txt");

        let file = UploadedFile::from_bytes(b"hello".to_vec(), "in.txt");
        let copied = file.copy_to(&dest).await.unwrap();

        assert_eq!(copied.filename(), "out.txt");
        assert_eq!(copied.read().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn move_consumes_source() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        std::fs::write(&src, b"payload").unwrap();

        let moved = UploadedFile::from_path(&src)
            .move_to(&temp.path().join("dst/dst.txt"))
            .await
            .unwrap();

        assert!(!src.exists());
        assert_eq!(moved.read().await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn missing_path_is_empty() {
        let file = UploadedFile::from_path("/definitely/not/here.txt");
        assert!(file.is_empty().await);
        assert!(!file.exists().await);
        file.delete().await.unwrap();
    }
}
