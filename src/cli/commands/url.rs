//! Url command - resolve the URL of a stored file or a nested version

use crate::cli::args::UrlArgs;
use crate::config::Config;
use crate::error::OffshootResult;
use crate::uploader::{UrlArg, UrlOptions};
use tracing::debug;

/// Execute the url command
pub async fn execute(args: UrlArgs, config: &Config) -> OffshootResult<()> {
    let mut uploader = super::configured_uploader(config);
    uploader.retrieve_from_store(&args.identifier).await?;

    let url_args = url_args(args.versions, args.query);
    match uploader.url(&url_args)? {
        Some(url) => println!("{}", url),
        None => debug!("No URL: version does not apply to {}", args.identifier),
    }
    Ok(())
}

fn url_args(versions: Vec<String>, query: Vec<(String, String)>) -> Vec<UrlArg> {
    let mut args: Vec<UrlArg> = versions.into_iter().map(UrlArg::Version).collect();
    if !query.is_empty() {
        args.push(UrlArg::Options(query.into_iter().collect::<UrlOptions>()));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_goes_last() {
        let args = url_args(
            vec!["thumb".to_string()],
            vec![("v".to_string(), "1".to_string())],
        );
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], UrlArg::Version("thumb".to_string()));
        assert!(matches!(args[1], UrlArg::Options(ref o) if o["v"] == "1"));
    }

    #[test]
    fn no_query_no_options() {
        assert!(url_args(vec![], vec![]).is_empty());
    }
}
