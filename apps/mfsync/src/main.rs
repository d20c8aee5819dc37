//! mfsync - manifest-driven file verification and sync
//!
//! Loads the settings and manifest, then either verifies the input directory
//! (`--dry-run`) or existence-checks it and copies the listed files into a
//! destination directory.

mod cli;
mod error;
mod logging;

use crate::cli::{Command, Invocation, USAGE};
use crate::error::{CliError, EXIT_FAILURE, EXIT_USAGE};
use mfsync_config::Config;
use mfsync_guard::Verifier;
use mfsync_manifest::{Manifest, ManifestFormat};
use mfsync_sync::Syncer;
use std::process;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init_tracing();

    let command = match Invocation::parse_from(std::env::args_os()) {
        Some(Invocation::Run(command)) => command,
        Some(Invocation::Help) | None => {
            eprint!("{USAGE}");
            process::exit(EXIT_USAGE);
        }
    };

    if let Err(e) = run(command).await {
        debug!("Application error: {e:?}");
        eprintln!("Error: {e}");
        process::exit(EXIT_FAILURE);
    }
}

/// Main application logic
async fn run(command: Command) -> Result<(), CliError> {
    debug!("Starting mfsync v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().await?;
    let format = ManifestFormat::from_checksum_mode(config.checksum_mode);
    let manifest = Manifest::load(&config.filelist, format).await?;

    match command {
        Command::DryRun => {
            Verifier::new(&config)
                .verify(&manifest)
                .await
                .into_result()?;
        }
        Command::Materialize(destination) => {
            Syncer::new(&config)
                .materialize(&manifest, &destination)
                .await?;
        }
    }

    debug!("Command completed successfully");
    Ok(())
}
