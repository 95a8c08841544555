//! CLI command implementations

pub mod cache;
pub mod config;
pub mod recreate;
pub mod remove;
pub mod store;
pub mod url;

pub use cache::execute as cache;
pub use config::execute as config;
pub use recreate::execute as recreate;
pub use remove::execute as remove;
pub use store::execute as store;
pub use url::execute as url;

use crate::config::Config;
use crate::error::{OffshootError, OffshootResult};
use crate::uploader::{Mount, Uploader, UploaderDef};
use std::sync::Arc;

/// Root uploader for the configured versions and mount
fn configured_uploader(config: &Config) -> Uploader {
    let def = UploaderDef::from_config(config);
    Uploader::new(Arc::new(def), Mount::from(&config.mount))
}

/// Uploader attached to the stored file `identifier`
async fn stored_uploader(config: &Config, identifier: &str) -> OffshootResult<Uploader> {
    let mut uploader = configured_uploader(config);
    uploader.retrieve_from_store(identifier).await?;

    let exists = match uploader.file() {
        Some(file) => file.exists().await && !file.is_empty().await,
        None => false,
    };
    if !exists {
        return Err(OffshootError::User(format!(
            "No stored file '{}' at {}",
            identifier,
            uploader.store_path(identifier)
        )));
    }
    Ok(uploader)
}
