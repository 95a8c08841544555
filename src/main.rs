//! Offshoot - versioned file uploads
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use offshoot::cli::{Cli, Commands};
use offshoot::config::{Config, ConfigManager};
use offshoot::error::OffshootResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> OffshootResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Store(args) => offshoot::cli::commands::store(args, &config).await,
        Commands::Recreate(args) => offshoot::cli::commands::recreate(args, &config).await,
        Commands::Remove(args) => offshoot::cli::commands::remove(args, &config).await,
        Commands::Url(args) => offshoot::cli::commands::url(args, &config).await,
        Commands::Config(args) => {
            offshoot::cli::commands::config(args, &config, &config_manager).await
        }
        Commands::Cache(args) => offshoot::cli::commands::cache(args, &config).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `RUST_LOG` wins when set
fn init_logging(verbose: u8, config: &Config) {
    let default = match verbose {
        0 => "offshoot=warn",
        1 => "offshoot=info",
        _ => "offshoot=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
