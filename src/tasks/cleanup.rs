//! TTL Cleanup Task
//!
//! Background task that periodically removes expired memory tier entries.
//! Disk records are never scanned; they expire when next read.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::config::Config;

/// Spawns a background task that periodically sweeps the memory tier.
///
/// The task runs until aborted, sleeping for `interval` between sweeps.
///
/// # Example
/// ```ignore
/// let cache = CacheManager::open_or_memory_only(&config);
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: CacheManager, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting memory tier cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired().await;
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

/// Spawns the sweep at `config.cleanup_interval`.
///
/// Returns `None` without spawning when the interval is zero.
pub fn spawn_configured_cleanup(cache: CacheManager, config: &Config) -> Option<JoinHandle<()>> {
    match config.cleanup_interval() {
        Some(interval) => Some(spawn_cleanup_task(cache, interval)),
        None => {
            debug!("Memory tier cleanup disabled");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use chrono::Utc;
    use std::sync::Arc;

    fn memory_cache(clock: Arc<ManualClock>) -> CacheManager {
        CacheManager::memory_only_with_clock(&Config::default(), clock)
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = memory_cache(clock.clone());
        cache
            .set_bytes("expire_soon", b"value".to_vec(), Duration::from_secs(1))
            .await;

        clock.advance(chrono::Duration::seconds(2));
        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(cache.stats().await.total_entries, 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = memory_cache(clock);
        cache
            .set_bytes("long_lived", b"value".to_vec(), Duration::from_secs(3600))
            .await;

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(cache.get_bytes("long_lived").await.unwrap(), b"value");
        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let cache = CacheManager::memory_only(&Config::default());

        let handle = spawn_cleanup_task(cache, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }

    #[tokio::test]
    async fn test_configured_cleanup_disabled_by_zero_interval() {
        let mut config = Config::default();
        config.cleanup_interval = 0;
        let cache = CacheManager::memory_only(&config);

        assert!(spawn_configured_cleanup(cache, &config).is_none());
    }

    #[tokio::test]
    async fn test_configured_cleanup_uses_interval() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mut config = Config::default();
        config.cleanup_interval = 1;
        let cache = CacheManager::memory_only_with_clock(&config, clock.clone());
        cache
            .set_bytes("expire_soon", b"value".to_vec(), Duration::from_secs(1))
            .await;
        clock.advance(chrono::Duration::seconds(2));

        let handle = spawn_configured_cleanup(cache.clone(), &config).expect("Sweep should start");
        tokio::time::sleep(Duration::from_millis(1300)).await;

        assert_eq!(cache.stats().await.total_entries, 0);
        handle.abort();
    }
}
