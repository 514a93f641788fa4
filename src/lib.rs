//! Response Cache - A two-tier response cache
//!
//! Keeps opaque payloads in memory and mirrors raw byte payloads to disk,
//! with time-based expiry in both tiers.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod persistent;
pub mod tasks;

pub use cache::{CacheManager, CacheStats, CachedValue};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use persistent::{ClearReport, PersistentStore};
pub use tasks::{spawn_cleanup_task, spawn_configured_cleanup};
