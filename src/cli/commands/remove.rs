//! Remove command - delete a stored file and every version

use crate::cli::args::RemoveArgs;
use crate::config::Config;
use crate::error::OffshootResult;
use crate::ui::{self, Status, UiContext};

/// Execute the remove command
pub async fn execute(args: RemoveArgs, config: &Config) -> OffshootResult<()> {
    let ctx = UiContext::detect();
    let mut uploader = super::stored_uploader(config, &args.identifier).await?;
    let path = uploader.store_path(&args.identifier);

    uploader.remove().await?;

    ui::line_with(&ctx, Status::Done, &format!("Removed {}", args.identifier), &path);
    Ok(())
}
