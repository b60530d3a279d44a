//! Configuration settings for DriveMove
//!
//! Defines the CLI arguments and the validated runtime configuration
//! derived from them.

use crate::drive::{
    CredentialSource, DriveConfig, MigrationPolicy, ACCESS_TOKEN_ENV, DEFAULT_API_BASE,
    MAX_PAGE_SIZE, TOKEN_FILE_ENV,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// DriveMove - move a Google Drive folder tree into another folder
#[derive(Parser, Debug, Clone)]
#[command(name = "drivemove")]
#[command(author = "DriveMove Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Move a Google Drive folder tree, merging folders by name")]
#[command(long_about = r#"
DriveMove moves everything under a source Drive folder into a destination
folder. Subfolders are merged into existing destination folders with the
same name, or created when missing. Files are moved, or copied when they
cannot be moved and --copy-on-permission-error is given.

Examples:
  drivemove --src 1AbC --dst 9XyZ --token-file token.json
  drivemove --src 1AbC --dst 9XyZ --copy-on-permission-error --progress
"#)]
pub struct CliArgs {
    /// Source folder ID
    #[arg(long, value_name = "FOLDER_ID")]
    pub src: String,

    /// Destination folder ID
    #[arg(long, value_name = "FOLDER_ID")]
    pub dst: String,

    /// Copy files that can't be moved due to permission errors
    #[arg(long)]
    pub copy_on_permission_error: bool,

    /// OAuth access token
    #[arg(long, env = ACCESS_TOKEN_ENV, hide_env_values = true, value_name = "TOKEN")]
    pub access_token: Option<String>,

    /// File containing an access token (raw or JSON with "access_token")
    #[arg(long, env = TOKEN_FILE_ENV, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Include shared drives
    #[arg(long)]
    pub shared_drives: bool,

    /// Entries per listing request (1-1000)
    #[arg(long, default_value = "100", value_name = "NUM")]
    pub page_size: u32,

    /// Rescan destination folders for every source folder instead of caching lookups
    #[arg(long)]
    pub no_folder_cache: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "60", value_name = "SECS")]
    pub timeout: u64,

    /// Drive API base URL
    #[arg(long, default_value = DEFAULT_API_BASE, hide = true)]
    pub api_base: String,

    /// Show a progress spinner
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl CliArgs {
    /// Default log directive for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Source folder ID
    pub source: String,
    /// Destination folder ID
    pub destination: String,
    /// Relocation policy
    pub policy: MigrationPolicy,
    /// Where credentials come from
    pub credentials: CredentialSource,
    /// Drive client settings
    pub drive: DriveConfig,
    /// Cache destination folder lookups
    pub folder_cache: bool,
    /// Show progress
    pub progress: bool,
}

impl MigrationConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let source = args.src.trim();
        let destination = args.dst.trim();

        if source.is_empty() {
            return Err("Source folder ID required".to_string());
        }
        if destination.is_empty() {
            return Err("Destination folder ID required".to_string());
        }
        if source == destination {
            return Err(format!("Source and destination are the same folder: {}", source));
        }
        if args.page_size == 0 || args.page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "Invalid page size {}: must be between 1 and {}",
                args.page_size, MAX_PAGE_SIZE
            ));
        }
        if args.timeout == 0 {
            return Err("Timeout must be at least 1 second".to_string());
        }

        Ok(Self {
            source: source.to_string(),
            destination: destination.to_string(),
            policy: MigrationPolicy {
                copy_on_permission_error: args.copy_on_permission_error,
            },
            credentials: CredentialSource {
                access_token: args.access_token.clone(),
                token_file: args.token_file.clone(),
            },
            drive: DriveConfig {
                api_base: args.api_base.clone(),
                page_size: args.page_size,
                shared_drives: args.shared_drives,
                timeout: Duration::from_secs(args.timeout),
            },
            folder_cache: !args.no_folder_cache,
            progress: args.progress && !args.quiet,
        })
    }
}
