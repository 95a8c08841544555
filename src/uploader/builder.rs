//! Building uploader definitions from configuration

use crate::cache::CacheArea;
use crate::config::{Config, StorageConfig, VersionConfig};
use crate::processing::CommandProcessor;
use crate::storage::create_storage;
use crate::uploader::definition::{UploaderDef, VersionOptions};
use crate::uploader::mount::DEFAULT_STORE_DIR;
use std::collections::BTreeMap;
use tracing::debug;

impl UploaderDef {
    /// Build a root definition and its version tree from `config`
    pub fn from_config(config: &Config) -> Self {
        let storage = &config.storage;
        let mut def = Self::new(
            create_storage(storage),
            CacheArea::new(storage.root.clone(), storage.cache_dir.clone()),
        );
        def.apply_storage_config(storage);
        def.add_configured_versions(&config.versions);
        def
    }

    fn apply_storage_config(&mut self, storage: &StorageConfig) {
        self.set_store_dir(storage.store_dir.as_deref().unwrap_or(DEFAULT_STORE_DIR))
            .set_asset_host(storage.asset_host.clone())
            .set_default_url(storage.default_url.clone())
            .set_move_to_cache(storage.move_to_cache)
            .set_move_to_store(storage.move_to_store)
            .set_delete_tmp_file_after_storage(storage.delete_tmp_file_after_storage)
            .set_extension_allowlist(storage.extension_allowlist.iter().cloned());
    }

    fn add_configured_versions(&mut self, versions: &BTreeMap<String, VersionConfig>) {
        for (name, version) in versions {
            debug!("Configuring version {}", name);
            self.version(name.clone(), version_options(version), |def| {
                for processor in &version.processors {
                    def.process(CommandProcessor::from(processor));
                }
                def.add_configured_versions(&version.versions);
            });
        }
    }
}

fn version_options(version: &VersionConfig) -> VersionOptions {
    let mut options = VersionOptions::new();

    if let Some(ref source) = version.from_version {
        options = options.from_version(source.clone());
    }

    if !version.if_extension.is_empty() {
        let extensions: Vec<String> = version
            .if_extension
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        options = options.when(move |_, ctx| {
            ctx.file
                .and_then(|file| file.extension())
                .is_some_and(|ext| extensions.contains(&ext))
        });
    }

    options
}
