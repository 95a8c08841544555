//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Offshoot - versioned file uploads
///
/// Caches, processes and stores a file together with every version
/// configured for it.
#[derive(Parser, Debug)]
#[command(name = "offshoot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "OFFSHOOT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cache and store a file with all of its versions
    Store(StoreArgs),

    /// Regenerate versions of a stored file
    Recreate(RecreateArgs),

    /// Remove a stored file and all of its versions
    Remove(RemoveArgs),

    /// Print the URL of a stored file or one of its versions
    Url(UrlArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Manage the local upload cache
    Cache(CacheArgs),
}

/// Arguments for the store command
#[derive(Parser, Debug)]
pub struct StoreArgs {
    /// File to upload
    pub file: PathBuf,

    /// Store under this filename instead of the file's own
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the recreate command
#[derive(Parser, Debug)]
pub struct RecreateArgs {
    /// Identifier of the stored file
    pub identifier: String,

    /// Versions to regenerate (all when omitted)
    pub versions: Vec<String>,
}

/// Arguments for the remove command
#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Identifier of the stored file
    pub identifier: String,
}

/// Arguments for the url command
#[derive(Parser, Debug)]
pub struct UrlArgs {
    /// Identifier of the stored file
    pub identifier: String,

    /// Version path, outermost first (e.g. `thumb small`)
    pub versions: Vec<String>,

    /// Query parameters (KEY=VALUE)
    #[arg(short, long, value_parser = parse_query_param)]
    pub query: Vec<(String, String)>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for the store report
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one URL per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Remove cached uploads that were never stored
    Gc {
        /// Remove cache directories older than N hours
        #[arg(long, default_value = "24")]
        hours: u32,
    },
}

/// Parse a query parameter in KEY=VALUE format
fn parse_query_param(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE format: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}
