//! Cache command - manage the local upload cache

use crate::cache::CacheArea;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::OffshootResult;
use crate::ui::{self, Status, UiContext};
use chrono::Duration;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> OffshootResult<()> {
    match args.action {
        CacheAction::Gc { hours } => gc_cache(config, hours).await,
    }
}

/// Remove cache directories older than `hours`
async fn gc_cache(config: &Config, hours: u32) -> OffshootResult<()> {
    let ctx = UiContext::detect();
    let area = CacheArea::new(config.storage.root.clone(), config.storage.cache_dir.clone());

    ui::line(
        &ctx,
        Status::Note,
        &format!(
            "Cleaning {} (older than {} hours)",
            area.base_path().display(),
            hours
        ),
    );

    let removed = area.clean(Duration::hours(i64::from(hours))).await?;

    if removed == 0 {
        ui::line(&ctx, Status::Done, "Nothing to clean");
    } else {
        ui::line(&ctx, Status::Done, &format!("Removed {} cached upload(s)", removed));
    }
    Ok(())
}
