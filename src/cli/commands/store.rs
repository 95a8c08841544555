//! Store command - cache, process and store a file with its versions

use crate::cli::args::{OutputFormat, StoreArgs};
use crate::config::Config;
use crate::error::{OffshootError, OffshootResult};
use crate::file::UploadedFile;
use crate::ui::{self, Status, TaskSpinner, UiContext};
use crate::uploader::Uploader;
use serde::Serialize;
use std::collections::BTreeMap;

/// What was stored, and where it can be fetched
#[derive(Debug, Serialize)]
struct StoreReport {
    identifier: String,
    url: Option<String>,
    versions: BTreeMap<String, Option<String>>,
}

impl StoreReport {
    fn collect(uploader: &Uploader, identifier: &str) -> OffshootResult<Self> {
        let mut versions = BTreeMap::new();
        collect_version_urls(uploader, &mut Vec::new(), &mut versions)?;

        Ok(Self {
            identifier: identifier.to_string(),
            url: uploader.url(&[])?,
            versions,
        })
    }
}

/// Walk the active version tree, keyed by dotted version path
fn collect_version_urls(
    uploader: &Uploader,
    path: &mut Vec<String>,
    out: &mut BTreeMap<String, Option<String>>,
) -> OffshootResult<()> {
    for (name, version) in uploader.active_versions() {
        path.push(name.to_string());
        out.insert(path.join("."), version.url(&[])?);
        collect_version_urls(version, path, out)?;
        path.pop();
    }
    Ok(())
}

/// Execute the store command
pub async fn execute(args: StoreArgs, config: &Config) -> OffshootResult<()> {
    if !args.file.is_file() {
        return Err(OffshootError::User(format!(
            "File not found: {}",
            args.file.display()
        )));
    }

    let ctx = match args.format {
        OutputFormat::Table => UiContext::detect(),
        OutputFormat::Json | OutputFormat::Plain => UiContext::silent(),
    };

    let mut file = UploadedFile::from_path(&args.file);
    if let Some(name) = args.name {
        file = file.with_filename(name);
    }

    let mut uploader = super::configured_uploader(config);
    let spinner = TaskSpinner::start(&ctx, &format!("Storing {}...", file.filename()));

    if let Err(e) = uploader.store(Some(file)).await {
        spinner.finish(Status::Failed, "Store failed");
        return Err(e);
    }

    let Some(identifier) = uploader.identifier().map(str::to_string) else {
        spinner.finish(
            Status::Warn,
            &format!("Nothing stored from {}, the file is empty", args.file.display()),
        );
        return Ok(());
    };
    spinner.finish(Status::Done, &format!("Stored {}", identifier));

    let report = StoreReport::collect(&uploader, &identifier)?;

    match args.format {
        OutputFormat::Table => print_report_table(&ctx, &report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            for url in report.url.iter().chain(report.versions.values().flatten()) {
                println!("{}", url);
            }
        }
    }

    Ok(())
}

fn print_report_table(ctx: &UiContext, report: &StoreReport) {
    let url = report.url.as_deref().unwrap_or("-");
    ui::key_value(ctx, "url", url);

    if report.versions.is_empty() {
        return;
    }

    ui::section(ctx, "Versions");
    for (name, url) in &report.versions {
        ui::key_value(ctx, name, url.as_deref().unwrap_or("-"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendKind, VersionConfig};
    use crate::uploader::{Mount, UploaderDef};
    use std::sync::Arc;

    #[tokio::test]
    async fn report_lists_nested_versions() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.backend = BackendKind::Memory;
        config.storage.root = temp.path().to_path_buf();

        let mut thumb = VersionConfig::default();
        thumb.versions.insert("small".to_string(), VersionConfig::default());
        config.versions.insert("thumb".to_string(), thumb);

        let def = Arc::new(UploaderDef::from_config(&config));
        let mut uploader = Uploader::new(def, Mount::new("user", "1", "avatar"));
        uploader
            .store(Some(UploadedFile::from_bytes(b"img".to_vec(), "a.png")))
            .await
            .unwrap();

        let report = StoreReport::collect(&uploader, "a.png").unwrap();
        assert_eq!(report.url.as_deref(), Some("/uploads/user/avatar/1/a.png"));
        assert_eq!(
            report.versions["thumb.small"].as_deref(),
            Some("/uploads/user/avatar/1/thumb_small_a.png")
        );
        assert_eq!(report.versions.len(), 2);
    }
}
