//! Recreate command - regenerate versions of a stored file

use crate::cli::args::RecreateArgs;
use crate::config::Config;
use crate::error::{OffshootError, OffshootResult};
use crate::ui::{self, Status, TaskSpinner, UiContext};

/// Execute the recreate command
pub async fn execute(args: RecreateArgs, config: &Config) -> OffshootResult<()> {
    let ctx = UiContext::detect();
    let mut uploader = super::stored_uploader(config, &args.identifier).await?;

    for name in &args.versions {
        if !uploader.versions().contains(name) {
            return Err(OffshootError::UnknownVersion(name.clone()));
        }
        if !uploader.version_exists(name) {
            ui::line_with(
                &ctx,
                Status::Warn,
                &format!("Version {} does not apply to {}", name, args.identifier),
                "skipped",
            );
        }
    }

    let target = if args.versions.is_empty() {
        "all versions".to_string()
    } else {
        args.versions.join(", ")
    };

    let spinner = TaskSpinner::start(&ctx, &format!("Recreating {}...", target));

    match uploader.recreate_versions(args.versions.as_slice()).await {
        Ok(()) => {
            spinner.finish(Status::Done, &format!("Recreated {} of {}", target, args.identifier));
            Ok(())
        }
        Err(e) => {
            spinner.finish(Status::Failed, "Recreate failed");
            Err(e)
        }
    }
}
