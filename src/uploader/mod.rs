//! Versioned uploaders
//!
//! An `Uploader` owns one file through its lifecycle: cache, process,
//! store, retrieve and remove. Each registered version is itself a full
//! `Uploader`, built from the version's own `UploaderDef`, and every
//! lifecycle operation cascades down the version tree:
//!
//! | Operation | Cascades to |
//! |-----------|-------------|
//! | `cache` | active versions, sequentially, honoring `from_version` |
//! | `store` | active versions, concurrently |
//! | `remove` | every registered version |
//! | `retrieve_from_cache` / `retrieve_from_store` | every registered version |

mod builder;
pub mod definition;
pub mod mount;
mod versions;

pub use definition::{
    Condition, NamedCondition, UploaderDef, VersionContext, VersionDefinition, VersionOptions,
    VersionPredicate,
};
pub use mount::Mount;
pub use versions::VersionMap;

use crate::cache::{self, split_cache_name, CacheId};
use crate::error::{OffshootError, OffshootResult};
use crate::file::UploadedFile;
use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Query parameters appended to a URL
pub type UrlOptions = BTreeMap<String, String>;

/// One argument to `Uploader::url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlArg {
    /// Descend into a version
    Version(String),

    /// Resolve this uploader's URL with query parameters
    Options(UrlOptions),
}

impl From<&str> for UrlArg {
    fn from(name: &str) -> Self {
        Self::Version(name.to_string())
    }
}

impl From<String> for UrlArg {
    fn from(name: String) -> Self {
        Self::Version(name)
    }
}

impl From<UrlOptions> for UrlArg {
    fn from(options: UrlOptions) -> Self {
        Self::Options(options)
    }
}

/// A file attached to a host model, with its tree of versions
pub struct Uploader {
    def: Arc<UploaderDef>,
    mount: Arc<Mount>,
    file: Option<UploadedFile>,
    cache_id: Option<CacheId>,
    parent_cache_id: Option<CacheId>,
    original_filename: Option<String>,
    filename: Option<String>,
    identifier: Option<String>,
    versions: OnceLock<VersionMap>,
}

impl Uploader {
    /// Create an uploader for `def`, mounted on `mount`
    pub fn new(def: Arc<UploaderDef>, mount: Mount) -> Self {
        Self::with_mount(def, Arc::new(mount))
    }

    pub(crate) fn with_mount(def: Arc<UploaderDef>, mount: Arc<Mount>) -> Self {
        Self {
            def,
            mount,
            file: None,
            cache_id: None,
            parent_cache_id: None,
            original_filename: None,
            filename: None,
            identifier: None,
            versions: OnceLock::new(),
        }
    }

    pub fn definition(&self) -> &UploaderDef {
        &self.def
    }

    pub fn mount(&self) -> &Mount {
        &self.mount
    }

    /// Current file: the cached copy, or the stored one after `store`
    pub fn file(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    pub fn cache_id(&self) -> Option<&CacheId> {
        self.cache_id.as_ref()
    }

    /// Cache id of the parent, assigned when the parent is cached
    pub fn parent_cache_id(&self) -> Option<&CacheId> {
        self.parent_cache_id.as_ref()
    }

    /// Identifier of the stored file (its unprefixed filename)
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }

    /// Unprefixed filename of the current file
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref().or(self.identifier.as_deref())
    }

    pub fn is_cached(&self) -> bool {
        self.cache_id.is_some()
    }

    pub fn is_blank(&self) -> bool {
        self.file.is_none()
    }

    /// Version chain joined with `_`; `None` for a root uploader
    pub fn version_name(&self) -> Option<String> {
        self.def.version_name()
    }

    /// `<cache_id>/<original_filename>`, usable with `retrieve_from_cache`
    pub fn cache_name(&self) -> Option<String> {
        match (&self.cache_id, &self.original_filename) {
            (Some(id), Some(filename)) => Some(cache::cache_name(id, filename)),
            _ => None,
        }
    }

    /// Storage key for a file named `for_file`
    pub fn store_path(&self, for_file: &str) -> String {
        self.def.store_path(&self.mount, for_file)
    }

    fn label(&self) -> String {
        self.version_name().unwrap_or_else(|| "root".to_string())
    }

    /// Stage `new_file` in the local cache, process it and cache every
    /// active version from the result
    ///
    /// Empty files are ignored.
    pub fn cache(&mut self, new_file: UploadedFile) -> BoxFuture<'_, OffshootResult<()>> {
        Box::pin(async move {
            if new_file.is_empty().await {
                debug!("Ignoring empty file {} for {}", new_file.filename(), self.label());
                return Ok(());
            }
            self.def.check_extension(&new_file)?;

            let cache_id = self.cache_id.get_or_insert_with(CacheId::generate).clone();
            let filename = new_file.filename();
            self.identifier = None;
            self.filename = Some(filename.clone());
            self.original_filename = Some(filename.clone());

            let cache_path = self.def.cache_path(&cache_id, &filename);
            let cached = if new_file.path() == Some(cache_path.as_path()) {
                new_file
            } else if self.def.move_to_cache() {
                new_file.move_to(&cache_path).await?
            } else {
                new_file.copy_to(&cache_path).await?
            };
            self.file = Some(cached);
            debug!("Cached {} at {}", self.label(), cache_path.display());

            self.process().await?;
            self.assign_parent_cache_id()?;
            self.cache_versions(&filename).await
        })
    }

    /// Run this definition's processors on the cached file
    async fn process(&self) -> OffshootResult<()> {
        let Some(path) = self.file.as_ref().and_then(|f| f.path()) else {
            return Ok(());
        };

        for processor in self.def.processors() {
            debug!("Processing {} with {}", self.label(), processor.name());
            processor.process(path).await?;
        }
        Ok(())
    }

    /// Commit the cached file to storage, then store every active version
    ///
    /// When `new_file` is given and nothing is cached yet, it is cached
    /// first. Without a cached file this is a no-op.
    pub fn store(&mut self, new_file: Option<UploadedFile>) -> BoxFuture<'_, OffshootResult<()>> {
        Box::pin(async move {
            if let Some(ref file) = new_file {
                if !self.is_cached() {
                    self.cache(file.clone()).await?;
                }
            }

            let (Some(file), Some(cache_id)) = (self.file.clone(), self.cache_id.clone()) else {
                debug!("Nothing cached for {}, skipping store", self.label());
                return Ok(());
            };

            let filename = self
                .filename
                .clone()
                .unwrap_or_else(|| file.filename());
            let path = self.store_path(&filename);
            let stored = self
                .def
                .storage()
                .store(&file, &path, self.def.move_to_store())
                .await?;

            if self.def.delete_tmp_file_after_storage() {
                if stored.path() != file.path() {
                    file.delete().await?;
                }
                self.def.cache_area().remove_dir_if_empty(&cache_id).await;
            }

            self.file = Some(stored);
            self.identifier = Some(filename);
            self.original_filename = None;
            self.cache_id = None;

            if self.def.version_name().is_some() {
                debug!("Stored {} at {}", self.label(), path);
            } else {
                info!("Stored {}", path);
            }

            self.store_versions(new_file, None).await
        })
    }

    /// Delete the file (stored or cached), then every registered version
    pub fn remove(&mut self) -> BoxFuture<'_, OffshootResult<()>> {
        Box::pin(async move {
            if let Some(ref file) = self.file {
                match self.identifier {
                    Some(ref identifier) => {
                        let path = self.store_path(identifier);
                        self.def.storage().remove(&path).await?;
                        debug!("Removed {} from storage at {}", self.label(), path);
                    }
                    None => {
                        file.delete().await?;
                        if let Some(ref id) = self.cache_id {
                            self.def.cache_area().remove_dir_if_empty(id).await;
                        }
                    }
                }
            }

            self.file = None;
            self.identifier = None;
            self.cache_id = None;
            self.filename = None;
            self.original_filename = None;

            self.remove_versions().await?;
            if self.def.version_name().is_none() {
                info!("Removed upload and its versions");
            }
            Ok(())
        })
    }

    /// Re-attach to a file cached earlier under `cache_name`
    /// (`<cache_id>/<original_filename>`)
    pub fn retrieve_from_cache<'a>(
        &'a mut self,
        cache_name: &'a str,
    ) -> BoxFuture<'a, OffshootResult<()>> {
        Box::pin(async move {
            let (cache_id, original_filename) = split_cache_name(cache_name)?;

            let path = self.def.cache_path(&cache_id, &original_filename);
            debug!("Retrieving {} from cache at {}", self.label(), path.display());

            self.file = Some(UploadedFile::from_path(path));
            self.cache_id = Some(cache_id);
            self.filename = Some(original_filename.clone());
            self.original_filename = Some(original_filename);
            self.identifier = None;

            self.retrieve_versions_from_cache(cache_name).await
        })
    }

    /// Re-attach to a file stored earlier under `identifier`
    pub fn retrieve_from_store<'a>(
        &'a mut self,
        identifier: &'a str,
    ) -> BoxFuture<'a, OffshootResult<()>> {
        Box::pin(async move {
            let path = self.store_path(identifier);
            debug!("Retrieving {} from storage at {}", self.label(), path);

            self.file = Some(self.def.storage().retrieve(&path).await?);
            self.identifier = Some(identifier.to_string());
            self.cache_id = None;
            self.filename = None;
            self.original_filename = None;

            self.retrieve_versions_from_store(identifier).await
        })
    }

    /// Resolve a URL
    ///
    /// Leading `UrlArg::Version`s descend into (nested) versions; an unknown
    /// version name is an error, an inactive one yields `None`. A trailing
    /// `UrlArg::Options` adds query parameters.
    pub fn url(&self, args: &[UrlArg]) -> OffshootResult<Option<String>> {
        match args.split_first() {
            Some((UrlArg::Version(name), rest)) => {
                let version = self
                    .versions()
                    .get(name)
                    .ok_or_else(|| OffshootError::UnknownVersion(name.clone()))?;

                if !self.version_exists(name) {
                    return Ok(None);
                }
                version.url(rest)
            }
            Some((UrlArg::Options(options), _)) => Ok(self.base_url(Some(options))),
            None => Ok(self.base_url(None)),
        }
    }

    /// URL of a version path such as `["thumb", "small"]`
    pub fn url_for(&self, versions: &[&str]) -> OffshootResult<Option<String>> {
        let args: Vec<UrlArg> = versions.iter().map(|name| UrlArg::from(*name)).collect();
        self.url(&args)
    }

    fn base_url(&self, options: Option<&UrlOptions>) -> Option<String> {
        if self.file.is_none() {
            return self.def.default_url();
        }

        let url = if let Some(ref identifier) = self.identifier {
            let url = self.def.storage().url(&self.store_path(identifier));
            match self.def.asset_host() {
                Some(host) => format!("{}{}", host.trim_end_matches('/'), url),
                None => url,
            }
        } else if let (Some(id), Some(filename)) = (&self.cache_id, &self.filename) {
            self.def
                .cache_area()
                .url_for(id, &self.def.full_filename(filename))
        } else {
            return None;
        };

        Some(append_query(url, options))
    }
}

fn append_query(url: String, options: Option<&UrlOptions>) -> String {
    match options {
        Some(options) if !options.is_empty() => {
            let query: Vec<String> = options
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect();
            format!("{}?{}", url, query.join("&"))
        }
        _ => url,
    }
}

impl fmt::Debug for Uploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uploader")
            .field("version_name", &self.version_name())
            .field("file", &self.file)
            .field("cache_id", &self.cache_id)
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}
