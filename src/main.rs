//! Command-line entry point for the discv5 discovery service.

use anyhow::{Context, Result};
use clap::Parser;
use discv5_service::cli::{Cli, Command};
use discv5_service::{lifecycle, DiscoveryService};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let Command::Run(args) = Cli::parse().into_command();
    let config = args.into_config();

    // Handlers go in before loading so an early SIGTERM is not lost.
    let signals = lifecycle::os_signals().context("failed to install signal handlers")?;

    let service = DiscoveryService::init(config)
        .await
        .context("failed to start discovery service")?;
    service
        .run(signals)
        .await
        .context("discovery service did not shut down cleanly")?;

    Ok(())
}
