//! Constellation CLI binary.

use anyhow::Result;
use constellation::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the constellation CLI.
///
/// A current-thread runtime is enough for one sequential command.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // RUST_LOG overrides, e.g. RUST_LOG=constellation=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("constellation=info,constellation_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting constellation CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Constellation CLI completed successfully");
    Ok(())
}
