//! Version instances and lifecycle cascades
//!
//! Each uploader lazily builds one child `Uploader` per registered version.
//! Cache, remove and retrieve cascades walk the children sequentially,
//! depth first; the store cascade fans out over all targeted children
//! concurrently and only reports once every child has finished.

use crate::error::{OffshootError, OffshootResult};
use crate::file::UploadedFile;
use crate::uploader::definition::{Condition, UploaderDef, VersionContext};
use crate::uploader::mount::Mount;
use crate::uploader::Uploader;
use futures_util::future::{join_all, BoxFuture};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Version instances of one uploader, by name
#[derive(Debug)]
pub struct VersionMap {
    entries: BTreeMap<String, Uploader>,
}

impl VersionMap {
    fn build(def: &UploaderDef, mount: &Arc<Mount>) -> Self {
        let entries = def
            .versions()
            .iter()
            .map(|(name, definition)| {
                let uploader = Uploader::with_mount(
                    Arc::clone(definition.uploader()),
                    Arc::clone(mount),
                );
                (name.clone(), uploader)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Uploader> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Uploader> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uploader)> {
        self.entries.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Uploader)> {
        self.entries.iter_mut().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Uploader {
    /// Version instances, built on first access
    pub fn versions(&self) -> &VersionMap {
        self.versions
            .get_or_init(|| VersionMap::build(&self.def, &self.mount))
    }

    pub(crate) fn versions_mut(&mut self) -> OffshootResult<&mut VersionMap> {
        self.versions();
        self.versions
            .get_mut()
            .ok_or_else(|| OffshootError::Internal("version map unavailable".to_string()))
    }

    /// The version instance registered as `name`
    pub fn version(&self, name: &str) -> Option<&Uploader> {
        self.versions().get(name)
    }

    pub fn version_mut(&mut self, name: &str) -> Option<&mut Uploader> {
        self.versions_mut().ok()?.get_mut(name)
    }

    /// Whether version `name` applies to the current file
    ///
    /// Unregistered names are simply reported as absent.
    pub fn version_exists(&self, name: &str) -> bool {
        let Some(definition) = self.def.versions().get(name) else {
            return false;
        };

        match definition.options().condition {
            None => true,
            Some(Condition::Predicate(ref predicate)) => predicate(
                self,
                &VersionContext {
                    version: name,
                    file: self.file.as_ref(),
                },
            ),
            Some(Condition::Named(ref method)) => match self.def.named_condition(method) {
                Some(condition) => condition(self, self.file.as_ref()),
                None => {
                    warn!("Unknown condition '{}' on version {}", method, name);
                    false
                }
            },
        }
    }

    /// Versions whose condition currently holds
    pub fn active_versions(&self) -> Vec<(&str, &Uploader)> {
        self.versions()
            .iter()
            .filter(|(name, _)| self.version_exists(name))
            .collect()
    }

    fn active_version_names(&self) -> Vec<String> {
        self.active_versions()
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Hand this uploader's cache id to every active version
    pub(crate) fn assign_parent_cache_id(&mut self) -> OffshootResult<()> {
        let Some(id) = self.cache_id.clone() else {
            return Ok(());
        };

        let active = self.active_version_names();
        let versions = self.versions_mut()?;
        for name in &active {
            if let Some(version) = versions.get_mut(name) {
                version.parent_cache_id = Some(id.clone());
            }
        }
        Ok(())
    }

    /// Cache every active version from this uploader's processed file
    pub(crate) async fn cache_versions(&mut self, original_filename: &str) -> OffshootResult<()> {
        let Some(parent) = self.file.clone() else {
            return Ok(());
        };

        let mut done = HashSet::new();
        for name in self.active_version_names() {
            if done.contains(&name) {
                continue;
            }
            self.cache_version(&name, &parent, original_filename, &mut done, &mut Vec::new())
                .await?;
        }
        Ok(())
    }

    /// Cache one version, caching its `from_version` source first if that
    /// has not been cached in this pass
    fn cache_version<'a>(
        &'a mut self,
        name: &'a str,
        parent: &'a UploadedFile,
        original_filename: &'a str,
        done: &'a mut HashSet<String>,
        chain: &'a mut Vec<String>,
    ) -> BoxFuture<'a, OffshootResult<()>> {
        Box::pin(async move {
            let from_version = self
                .def
                .versions()
                .get(name)
                .ok_or_else(|| OffshootError::UnknownVersion(name.to_string()))?
                .options()
                .from_version
                .clone();

            if chain.iter().any(|n| n == name) {
                return Err(OffshootError::Internal(format!(
                    "circular from_version: {} -> {}",
                    chain.join(" -> "),
                    name
                )));
            }

            let input = match from_version {
                Some(source) => {
                    if !done.contains(&source) {
                        debug!("Caching {} first, {} is built from it", source, name);
                        chain.push(name.to_string());
                        let result = self
                            .cache_version(&source, parent, original_filename, done, chain)
                            .await;
                        chain.pop();
                        result?;
                    }

                    let source_file = self
                        .versions()
                        .get(&source)
                        .ok_or_else(|| OffshootError::UnknownVersion(source.clone()))?
                        .file()
                        .cloned()
                        .ok_or(OffshootError::NotCached)?;
                    source_file.with_filename(original_filename)
                }
                None => parent.clone().with_filename(original_filename),
            };

            let cache_id = self.cache_id.clone();
            let version = self
                .versions_mut()?
                .get_mut(name)
                .ok_or_else(|| OffshootError::UnknownVersion(name.to_string()))?;
            version.cache_id = cache_id;
            debug!("Caching version {}", name);
            version.cache(input).await?;

            done.insert(name.to_string());
            Ok(())
        })
    }

    /// Store active versions concurrently
    ///
    /// With `only`, just the listed versions that are active are stored;
    /// unknown or inactive names are skipped. Versions that are not cached
    /// yet are cached from `new_file` first (sequentially, so `from_version`
    /// sources are ready). Every store runs to completion; if any failed,
    /// the failures are reported together.
    pub async fn store_versions(
        &mut self,
        new_file: Option<UploadedFile>,
        only: Option<&[String]>,
    ) -> OffshootResult<()> {
        self.store_selected_versions(new_file, only, false).await
    }

    /// With `rebuild`, every target is re-cached from `new_file` even if it
    /// already holds a cached file
    async fn store_selected_versions(
        &mut self,
        new_file: Option<UploadedFile>,
        only: Option<&[String]>,
        rebuild: bool,
    ) -> OffshootResult<()> {
        let active = self.active_version_names();
        let targets: Vec<String> = match only {
            Some(names) if !names.is_empty() => {
                let mut targets = Vec::with_capacity(names.len());
                for name in names {
                    if !active.contains(name) {
                        debug!("Version {} is not active, skipping", name);
                    } else if !targets.contains(name) {
                        targets.push(name.clone());
                    }
                }
                targets
            }
            _ => active,
        };

        if targets.is_empty() {
            return Ok(());
        }

        if let Some(ref file) = new_file {
            self.cache_targets(&targets, file, rebuild).await?;
        }

        debug!("Storing {} version(s): {}", targets.len(), targets.join(", "));
        let jobs = self
            .versions_mut()?
            .iter_mut()
            .filter(|(name, _)| targets.iter().any(|t| t == name))
            .map(|(name, version)| {
                let file = new_file.clone();
                async move { (name.to_string(), version.store(file).await) }
            });
        let results = join_all(jobs).await;

        let mut failed = Vec::new();
        let mut first = None;
        for (name, result) in results {
            if let Err(e) = result {
                warn!("Failed to store version {}: {}", name, e);
                failed.push(name);
                first.get_or_insert(e);
            }
        }

        match first {
            None => Ok(()),
            Some(first) => Err(OffshootError::StoreVersionsFailed {
                failed,
                first: Box::new(first),
            }),
        }
    }

    /// Cache the targeted versions from `file`
    ///
    /// Unless rebuilding, versions that are cached already are left as is.
    /// A rebuild also re-caches the `from_version` sources of the targets.
    async fn cache_targets(
        &mut self,
        targets: &[String],
        file: &UploadedFile,
        rebuild: bool,
    ) -> OffshootResult<()> {
        let mut done: HashSet<String> = if rebuild {
            HashSet::new()
        } else {
            self.versions()
                .iter()
                .filter(|(_, v)| v.is_cached())
                .map(|(name, _)| name.to_string())
                .collect()
        };

        let original_filename = file.filename();
        for name in targets {
            if done.contains(name) {
                continue;
            }
            self.cache_version(name, file, &original_filename, &mut done, &mut Vec::new())
                .await?;
        }
        Ok(())
    }

    /// Regenerate versions from the current file
    ///
    /// With names, only those versions (and the versions they are built
    /// from) are re-cached and stored; the root is left alone. Without,
    /// the whole tree is re-cached and stored.
    pub async fn recreate_versions<S: AsRef<str>>(&mut self, names: &[S]) -> OffshootResult<()> {
        let file = self.local_file().await?;

        if names.is_empty() {
            if !self.is_cached() {
                if let Some(file) = file {
                    self.cache(file).await?;
                }
            }
            return self.store(None).await;
        }

        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        self.store_selected_versions(file, Some(names.as_slice()), true)
            .await
    }

    /// A handle to the current file that caching can safely consume
    ///
    /// Stored files are read into memory so that moving into the cache
    /// never touches the stored copy.
    async fn local_file(&self) -> OffshootResult<Option<UploadedFile>> {
        let Some(ref file) = self.file else {
            return Ok(None);
        };
        let filename = self
            .filename()
            .map(str::to_string)
            .unwrap_or_else(|| file.filename());

        if self.is_cached() {
            return Ok(Some(file.clone().with_filename(filename)));
        }
        Ok(Some(UploadedFile::from_bytes(file.read().await?, filename)))
    }

    /// Remove every registered version, active or not
    pub(crate) async fn remove_versions(&mut self) -> OffshootResult<()> {
        for (name, version) in self.versions_mut()?.iter_mut() {
            debug!("Removing version {}", name);
            version.remove().await?;
        }
        Ok(())
    }

    pub(crate) async fn retrieve_versions_from_cache(
        &mut self,
        cache_name: &str,
    ) -> OffshootResult<()> {
        for (_, version) in self.versions_mut()?.iter_mut() {
            version.retrieve_from_cache(cache_name).await?;
        }
        Ok(())
    }

    pub(crate) async fn retrieve_versions_from_store(
        &mut self,
        identifier: &str,
    ) -> OffshootResult<()> {
        for (_, version) in self.versions_mut()?.iter_mut() {
            version.retrieve_from_store(identifier).await?;
        }
        Ok(())
    }
}
