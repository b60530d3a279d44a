//! DriveMove CLI - move a Google Drive folder tree into another folder

use anyhow::Context;
use clap::Parser;
use drivemove::config::{CliArgs, LogFormat, MigrationConfig};
use drivemove::core::TreeMigrator;
use drivemove::drive::{acquire_credentials, DriveClient};
use drivemove::progress::ProgressReporter;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG overrides the verbosity flags
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    // Handle result
    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> anyhow::Result<()> {
    let config = MigrationConfig::from_cli(args).map_err(anyhow::Error::msg)?;

    tracing::info!("Authenticating");
    let session =
        acquire_credentials(&config.credentials).context("could not acquire credentials")?;

    tracing::info!("Starting DriveClient");
    let client = DriveClient::new(session, config.drive.clone())
        .context("could not create Drive client")?;

    let progress = if config.progress {
        ProgressReporter::new()
    } else {
        ProgressReporter::disabled()
    };

    let migrator = TreeMigrator::new(&client, config.policy)
        .with_folder_cache(config.folder_cache)
        .with_progress(progress);

    let summary = migrator
        .migrate(&config.source, &config.destination)
        .with_context(|| {
            format!(
                "migration from {} to {} failed",
                config.source, config.destination
            )
        })?;

    if !args.quiet {
        summary.print_summary();
    }

    Ok(())
}
