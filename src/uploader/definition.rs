//! Uploader definitions and the version registry
//!
//! An `UploaderDef` describes how one node of the version tree caches,
//! processes and stores its file. Registering a version creates a new,
//! independent definition for it, seeded from the registering one, with an
//! empty registry of its own so it can host sub-versions.

use crate::cache::{CacheArea, CacheId};
use crate::error::{OffshootError, OffshootResult};
use crate::file::UploadedFile;
use crate::processing::Processor;
use crate::storage::StorageBackend;
use crate::uploader::mount::{Mount, DEFAULT_STORE_DIR};
use crate::uploader::Uploader;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Predicate deciding whether a version applies to an uploader's file
pub type VersionPredicate = dyn Fn(&Uploader, &VersionContext<'_>) -> bool + Send + Sync;

/// Named predicate, invoked with the uploader and its current file
pub type NamedCondition = dyn Fn(&Uploader, Option<&UploadedFile>) -> bool + Send + Sync;

/// What a version predicate is asked about
#[derive(Debug, Clone, Copy)]
pub struct VersionContext<'a> {
    /// Name of the version being checked
    pub version: &'a str,

    /// The parent uploader's current file
    pub file: Option<&'a UploadedFile>,
}

/// Condition attached to a version with `VersionOptions::when*`
#[derive(Clone)]
pub enum Condition {
    /// Closure called with the uploader and a `VersionContext`
    Predicate(Arc<VersionPredicate>),

    /// Name of a condition registered with `UploaderDef::condition`
    Named(String),
}

impl Condition {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Uploader, &VersionContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// Options given when registering a version
#[derive(Debug, Clone, Default)]
pub struct VersionOptions {
    /// Only build the version when this holds
    pub condition: Option<Condition>,

    /// Build the version from this sibling's cached output instead of the
    /// parent's file
    pub from_version: Option<String>,
}

impl VersionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only build the version when `f` returns true
    pub fn when<F>(mut self, f: F) -> Self
    where
        F: Fn(&Uploader, &VersionContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Condition::predicate(f));
        self
    }

    /// Only build the version when the named condition holds
    pub fn when_named(mut self, name: impl Into<String>) -> Self {
        self.condition = Some(Condition::named(name));
        self
    }

    /// Build the version from a sibling's cached output
    pub fn from_version(mut self, name: impl Into<String>) -> Self {
        self.from_version = Some(name.into());
        self
    }
}

/// One registry entry
#[derive(Debug, Clone)]
pub struct VersionDefinition {
    name: String,
    uploader: Arc<UploaderDef>,
    options: VersionOptions,
}

impl VersionDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definition used to instantiate the version
    pub fn uploader(&self) -> &Arc<UploaderDef> {
        &self.uploader
    }

    pub fn options(&self) -> &VersionOptions {
        &self.options
    }
}

/// Describes how one node of the version tree is cached, processed and stored
#[derive(Clone)]
pub struct UploaderDef {
    version_names: Vec<String>,
    versions: BTreeMap<String, VersionDefinition>,
    processors: Vec<Arc<dyn Processor>>,
    storage: Arc<dyn StorageBackend>,
    cache: CacheArea,
    store_dir: String,
    asset_host: Option<String>,
    default_url: Option<String>,
    move_to_cache: bool,
    move_to_store: bool,
    delete_tmp_file_after_storage: bool,
    extension_allowlist: Vec<String>,
    conditions: BTreeMap<String, Arc<NamedCondition>>,
}

impl UploaderDef {
    /// Create a root definition storing to `storage` and caching in `cache`
    pub fn new(storage: Arc<dyn StorageBackend>, cache: CacheArea) -> Self {
        Self {
            version_names: Vec::new(),
            versions: BTreeMap::new(),
            processors: Vec::new(),
            storage,
            cache,
            store_dir: DEFAULT_STORE_DIR.to_string(),
            asset_host: None,
            default_url: None,
            move_to_cache: false,
            move_to_store: false,
            delete_tmp_file_after_storage: true,
            extension_allowlist: Vec::new(),
            conditions: BTreeMap::new(),
        }
    }

    /// Register a version, or refine an already registered one
    ///
    /// The first registration of `name` fixes its options; later calls with
    /// the same name only run `customize` again, so processing steps can be
    /// added incrementally.
    pub fn version<F>(
        &mut self,
        name: impl Into<String>,
        options: VersionOptions,
        customize: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut UploaderDef),
    {
        let name = name.into();

        if self.versions.contains_key(&name) {
            debug!("Version {} already registered, keeping its options", name);
        } else {
            let uploader = Arc::new(self.derive_version(&name));
            self.versions.insert(
                name.clone(),
                VersionDefinition {
                    name: name.clone(),
                    uploader,
                    options,
                },
            );
        }

        if let Some(definition) = self.versions.get_mut(&name) {
            customize(Arc::make_mut(&mut definition.uploader));
        }
        self
    }

    /// Apply `f` to every version definition below this one, depth first
    pub fn apply_to_all_versions<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&mut UploaderDef),
    {
        self.apply_recursively(&mut f);
        self
    }

    fn apply_recursively(&mut self, f: &mut dyn FnMut(&mut UploaderDef)) {
        for definition in self.versions.values_mut() {
            let uploader = Arc::make_mut(&mut definition.uploader);
            f(uploader);
            uploader.apply_recursively(f);
        }
    }

    /// Seed the definition of a newly registered version
    fn derive_version(&self, name: &str) -> UploaderDef {
        let mut version_names = self.version_names.clone();
        version_names.push(name.to_string());

        Self {
            version_names,
            versions: BTreeMap::new(),
            processors: Vec::new(),
            storage: Arc::clone(&self.storage),
            cache: self.cache.clone(),
            store_dir: self.store_dir.clone(),
            asset_host: self.asset_host.clone(),
            default_url: self.default_url.clone(),
            move_to_cache: false,
            move_to_store: self.move_to_store,
            delete_tmp_file_after_storage: self.delete_tmp_file_after_storage,
            extension_allowlist: self.extension_allowlist.clone(),
            conditions: self.conditions.clone(),
        }
    }

    /// Append a processor to this definition's pipeline
    pub fn process(&mut self, processor: impl Processor + 'static) -> &mut Self {
        self.processors.push(Arc::new(processor));
        self
    }

    /// Register a named condition usable with `VersionOptions::when_named`
    ///
    /// Versions registered afterwards inherit it.
    pub fn condition<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&Uploader, Option<&UploadedFile>) -> bool + Send + Sync + 'static,
    {
        self.conditions.insert(name.into(), Arc::new(f));
        self
    }

    pub fn set_storage(&mut self, storage: Arc<dyn StorageBackend>) -> &mut Self {
        self.storage = storage;
        self
    }

    pub fn set_cache_area(&mut self, cache: CacheArea) -> &mut Self {
        self.cache = cache;
        self
    }

    /// Store directory template, see `Mount::expand`
    pub fn set_store_dir(&mut self, store_dir: impl Into<String>) -> &mut Self {
        self.store_dir = store_dir.into();
        self
    }

    pub fn set_asset_host(&mut self, host: Option<String>) -> &mut Self {
        self.asset_host = host;
        self
    }

    /// URL returned when there is no file; `{version}` expands to the
    /// version name
    pub fn set_default_url(&mut self, url: Option<String>) -> &mut Self {
        self.default_url = url;
        self
    }

    pub fn set_move_to_cache(&mut self, value: bool) -> &mut Self {
        self.move_to_cache = value;
        self
    }

    pub fn set_move_to_store(&mut self, value: bool) -> &mut Self {
        self.move_to_store = value;
        self
    }

    pub fn set_delete_tmp_file_after_storage(&mut self, value: bool) -> &mut Self {
        self.delete_tmp_file_after_storage = value;
        self
    }

    pub fn set_extension_allowlist<I, S>(&mut self, extensions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extension_allowlist = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Registered versions, by name
    pub fn versions(&self) -> &BTreeMap<String, VersionDefinition> {
        &self.versions
    }

    /// Names from the outermost version down to this one; empty for a root
    pub fn version_names(&self) -> &[String] {
        &self.version_names
    }

    /// Display name: the version chain joined with `_`
    pub fn version_name(&self) -> Option<String> {
        if self.version_names.is_empty() {
            None
        } else {
            Some(self.version_names.join("_"))
        }
    }

    /// Filename prefixed with the version name, e.g. `thumb_small_photo.jpg`
    pub fn full_filename(&self, for_file: &str) -> String {
        match self.version_name() {
            Some(name) => format!("{}_{}", name, for_file),
            None => for_file.to_string(),
        }
    }

    pub fn processors(&self) -> &[Arc<dyn Processor>] {
        &self.processors
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    pub fn cache_area(&self) -> &CacheArea {
        &self.cache
    }

    /// Path a file named `for_file` is cached at under `id`
    pub fn cache_path(&self, id: &CacheId, for_file: &str) -> PathBuf {
        self.cache.path_for(id, &self.full_filename(for_file))
    }

    /// Store directory for `mount`
    pub fn store_dir(&self, mount: &Mount) -> String {
        mount.expand(&self.store_dir)
    }

    /// Storage key for a file named `for_file`
    pub fn store_path(&self, mount: &Mount, for_file: &str) -> String {
        let dir = self.store_dir(mount);
        let filename = self.full_filename(for_file);
        if dir.is_empty() {
            filename
        } else {
            format!("{}/{}", dir, filename)
        }
    }

    pub fn asset_host(&self) -> Option<&str> {
        self.asset_host.as_deref()
    }

    pub fn default_url(&self) -> Option<String> {
        self.default_url
            .as_ref()
            .map(|url| url.replace("{version}", &self.version_name().unwrap_or_default()))
    }

    /// Whether the uploaded file is moved into the cache
    ///
    /// Always false for versions: they must never consume the file they
    /// are derived from.
    pub fn move_to_cache(&self) -> bool {
        self.version_names.is_empty() && self.move_to_cache
    }

    pub fn move_to_store(&self) -> bool {
        self.move_to_store
    }

    pub fn delete_tmp_file_after_storage(&self) -> bool {
        self.delete_tmp_file_after_storage
    }

    pub fn extension_allowlist(&self) -> &[String] {
        &self.extension_allowlist
    }

    pub(crate) fn named_condition(&self, name: &str) -> Option<&Arc<NamedCondition>> {
        self.conditions.get(name)
    }

    /// Reject files whose extension is not allowlisted
    pub fn check_extension(&self, file: &UploadedFile) -> OffshootResult<()> {
        if self.extension_allowlist.is_empty() {
            return Ok(());
        }

        let allowed = file
            .extension()
            .is_some_and(|ext| self.extension_allowlist.contains(&ext));

        if allowed {
            Ok(())
        } else {
            Err(OffshootError::IntegrityError {
                filename: file.filename(),
                allowed: self.extension_allowlist.join(", "),
            })
        }
    }
}

impl fmt::Debug for UploaderDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploaderDef")
            .field("version_names", &self.version_names)
            .field("versions", &self.versions.keys().collect::<Vec<_>>())
            .field(
                "processors",
                &self.processors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("storage", &self.storage.backend_name())
            .field("cache", &self.cache)
            .field("store_dir", &self.store_dir)
            .field("move_to_cache", &self.move_to_cache())
            .field("move_to_store", &self.move_to_store)
            .finish_non_exhaustive()
    }
}
