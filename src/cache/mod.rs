//! Cache Module
//!
//! Two-tier caching: a volatile memory tier in front of a persistent disk tier,
//! both with TTL expiration.

mod entry;
mod manager;
mod memory;
mod stats;


// Re-export public types
pub use entry::{expiry_from, CacheEntry, CachedValue, MAX_TTL};
pub use manager::CacheManager;
pub use memory::MemoryTier;
pub use stats::{CacheStats, StatsRecorder};
