//! Response Cache - maintenance tool for the on-disk response cache
//!
//! Reads, writes and clears cached payloads from the command line.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use response_cache::cli::{self, Cli, Outcome};
use response_cache::{CacheManager, Config};

/// Entry point for the `response-cache` tool.
///
/// # Startup Sequence
/// 1. Parse command-line arguments
/// 2. Initialize tracing subscriber for logging (stderr)
/// 3. Load configuration from environment variables and flags
/// 4. Open the cache with its disk tier
/// 5. Run the subcommand
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Defaults to "warn" so payloads on stdout stay clean; override with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "response_cache=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = cli.config(Config::from_env());
    debug!(?config, "Configuration loaded");

    let cache = CacheManager::open(&config)
        .with_context(|| format!("Cannot use cache directory {}", config.cache_dir.display()))?;

    let outcome = cli::run(&cli.command, &cache, &mut io::stdin().lock(), &mut io::stdout().lock())
        .await?;

    Ok(match outcome {
        Outcome::Done => ExitCode::SUCCESS,
        Outcome::Incomplete => ExitCode::FAILURE,
    })
}
