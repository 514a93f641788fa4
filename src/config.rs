//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;

/// Subdirectory of the platform cache location that holds the disk tier.
const CACHE_SUBDIR: &str = "api";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the disk tier artifacts
    pub cache_dir: PathBuf,
    /// Default TTL in seconds for entries written without an explicit TTL
    pub default_ttl: u64,
    /// Memory tier sweep interval in seconds, 0 disables the sweep
    pub cleanup_interval: u64,
    /// Upper bound on a single disk operation, in milliseconds
    pub io_timeout_ms: u64,
    /// Whether a disk hit is copied back into the memory tier
    pub promote_on_disk_hit: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Disk tier directory (default: platform cache dir + `api`)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Memory sweep frequency in seconds (default: 60)
    /// - `IO_TIMEOUT_MS` - Disk operation timeout in milliseconds (default: 2000)
    /// - `PROMOTE_ON_DISK_HIT` - Copy disk hits into memory (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            cache_dir: lookup("CACHE_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            default_ttl: parse_var(&lookup, "DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            cleanup_interval: parse_var(&lookup, "CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            io_timeout_ms: parse_var(&lookup, "IO_TIMEOUT_MS").unwrap_or(defaults.io_timeout_ms),
            promote_on_disk_hit: parse_var(&lookup, "PROMOTE_ON_DISK_HIT")
                .unwrap_or(defaults.promote_on_disk_hit),
        }
    }

    /// Returns a default Config rooted at a custom directory.
    ///
    /// Useful for testing or when a specific cache location is needed.
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Disk operation timeout as a Duration.
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Memory sweep interval, or `None` when the sweep is disabled.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval > 0).then(|| Duration::from_secs(self.cleanup_interval))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            default_ttl: 300,
            cleanup_interval: 60,
            io_timeout_ms: 2000,
            promote_on_disk_hit: true,
        }
    }
}

/// Looks up `name` and parses it, ignoring surrounding whitespace.
fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse().ok())
}

/// Platform cache location (`~/.cache/response_cache/api` on Linux).
///
/// Falls back to the system temp directory when no home directory is known.
fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "response_cache")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| env::temp_dir().join("response_cache"))
        .join(CACHE_SUBDIR)
}
