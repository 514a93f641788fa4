//! Command-line interface for inspecting and maintaining the disk cache
//!
//! Payloads are read from stdin and written to stdout unchanged, so the tool
//! can sit in a shell pipeline in front of a slow fetch.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::cache::CacheManager;
use crate::config::Config;

/// Response cache maintenance tool
#[derive(Parser, Debug)]
#[command(name = "response-cache")]
#[command(about = "Inspect and maintain the on-disk response cache")]
#[command(version)]
pub struct Cli {
    /// Cache directory, overrides CACHE_DIR
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write a cached payload to stdout; exits 1 if absent or expired
    Get { key: String },
    /// Cache the payload read from stdin
    Put {
        key: String,
        /// Time-to-live in seconds, defaults to DEFAULT_TTL
        #[arg(long, value_name = "SECS")]
        ttl: Option<u64>,
    },
    /// Remove a key from the cache
    Remove { key: String },
    /// Delete every cached record and report how many files were removed
    Clear,
    /// Print the cache directory, or a key's artifact paths
    Path { key: Option<String> },
}

/// Result of a command that ran without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command did what was asked
    Done,
    /// `get` found nothing live, `put` only reached memory, or `clear` left
    /// artifacts behind
    Incomplete,
}

impl Cli {
    /// Applies command-line overrides on top of an environment config.
    pub fn config(&self, mut base: Config) -> Config {
        if let Some(dir) = &self.cache_dir {
            base.cache_dir = dir.clone();
        }
        base
    }
}

/// Runs `command` against `cache`.
///
/// # Arguments
/// * `command` - The parsed subcommand
/// * `cache` - Cache with a disk tier attached
/// * `input` - Payload source for `put`
/// * `output` - Destination for payloads and paths
pub async fn run<R: Read, W: Write>(
    command: &Command,
    cache: &CacheManager,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<Outcome> {
    match command {
        Command::Get { key } => match cache.get_bytes(key).await {
            Some(payload) => {
                output.write_all(&payload).context("Failed to write payload")?;
                Ok(Outcome::Done)
            }
            None => Ok(Outcome::Incomplete),
        },
        Command::Put { key, ttl } => {
            let mut payload = Vec::new();
            input
                .read_to_end(&mut payload)
                .context("Failed to read payload from stdin")?;
            let ttl = ttl.map(Duration::from_secs).unwrap_or(cache.default_ttl());
            Ok(if cache.set_bytes(key.clone(), payload, ttl).await {
                Outcome::Done
            } else {
                Outcome::Incomplete
            })
        }
        Command::Remove { key } => {
            cache.remove(key).await;
            Ok(Outcome::Done)
        }
        Command::Clear => {
            let report = cache.clear_all().await;
            writeln!(output, "Removed {} cache files", report.removed)?;
            for (path, error) in &report.failures {
                writeln!(output, "Failed to remove {}: {}", path.display(), error)?;
            }
            Ok(if report.is_complete() {
                Outcome::Done
            } else {
                Outcome::Incomplete
            })
        }
        Command::Path { key } => {
            match key {
                Some(key) => {
                    let paths = cache
                        .artifact_paths(key)
                        .context("Cache has no disk tier")?;
                    writeln!(output, "{}", paths.payload.display())?;
                    writeln!(output, "{}", paths.metadata.display())?;
                }
                None => {
                    let dir = cache.disk_dir().context("Cache has no disk tier")?;
                    writeln!(output, "{}", dir.display())?;
                }
            }
            Ok(Outcome::Done)
        }
    }
}
