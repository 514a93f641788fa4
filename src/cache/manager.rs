//! Cache Manager Module
//!
//! Single entry point for cache reads and writes. Coordinates the memory tier
//! and the persistent tier and enforces expiry across both.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::entry::expiry_from;
use crate::cache::{CacheStats, CachedValue, MemoryTier, StatsRecorder};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::persistent::{ArtifactPaths, ClearReport, PersistentStore};

// == Cache Manager ==
/// Two-tier cache facade.
///
/// Clones share both tiers, so one instance built at startup can be handed to
/// every consumer. Disk failures never reach the caller: they are logged and
/// the operation behaves as a miss or as a memory-only write.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Volatile tier, always present
    memory: Arc<RwLock<MemoryTier>>,
    /// Durable tier, `None` when running memory-only
    disk: Option<PersistentStore>,
    /// Hit/miss/error counters, updated without the tier lock
    stats: Arc<StatsRecorder>,
    /// Shared by both tiers so one `set` yields one expiry
    clock: Arc<dyn Clock>,
    /// Upper bound on a single disk operation, zero for none
    io_timeout: Duration,
    /// Copy disk hits back into memory
    promote_on_disk_hit: bool,
    /// TTL suggested to callers that have none of their own
    default_ttl: Duration,
}

impl CacheManager {
    // == Constructors ==
    /// Opens a two-tier cache using the system clock.
    ///
    /// Fails with `StorageUnavailable` if the disk tier cannot be set up.
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Opens a two-tier cache with a custom clock.
    pub fn open_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let disk = PersistentStore::open(&config.cache_dir, clock.clone())?;
        info!(dir = %disk.dir().display(), "Cache opened with disk tier");
        Ok(Self::build(config, Some(disk), clock))
    }

    /// Opens a two-tier cache, degrading to memory-only if the disk tier is
    /// unavailable.
    pub fn open_or_memory_only(config: &Config) -> Self {
        match Self::open(config) {
            Ok(manager) => manager,
            Err(e) => {
                warn!(error = %e, "Disk tier unavailable, running memory-only");
                Self::memory_only(config)
            }
        }
    }

    /// Creates a cache without a disk tier.
    pub fn memory_only(config: &Config) -> Self {
        Self::memory_only_with_clock(config, Arc::new(SystemClock))
    }

    pub fn memory_only_with_clock(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self::build(config, None, clock)
    }

    fn build(config: &Config, disk: Option<PersistentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: Arc::new(RwLock::new(MemoryTier::new())),
            disk,
            stats: Arc::new(StatsRecorder::new()),
            clock,
            io_timeout: config.io_timeout(),
            promote_on_disk_hit: config.promote_on_disk_hit,
            default_ttl: config.default_ttl(),
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`.
    ///
    /// Both tiers receive the same expiry. `Bytes` values are mirrored to
    /// disk; an `Opaque` value instead drops any older disk record for the key
    /// so a later memory miss cannot surface the superseded payload.
    ///
    /// Returns true if the value was written to the disk tier. The memory
    /// write always happens, so `false` is not an error for the caller.
    pub async fn set(&self, key: impl Into<String>, value: CachedValue, ttl: Duration) -> bool {
        let key = key.into();
        let expires_at = expiry_from(self.clock.now(), ttl);
        let payload = value.as_bytes().map(<[u8]>::to_vec);

        self.memory
            .write()
            .await
            .insert(key.clone(), value, expires_at);

        match payload {
            Some(payload) => self
                .run_disk("put", move |store| store.put(&key, &payload, expires_at))
                .await
                .is_some(),
            None => {
                self.run_disk("remove", move |store| store.remove(&key)).await;
                false
            }
        }
    }

    /// Stores a raw payload; it survives restarts until `ttl` elapses.
    ///
    /// Returns true if the payload reached the disk tier.
    pub async fn set_bytes(
        &self,
        key: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        ttl: Duration,
    ) -> bool {
        self.set(key, CachedValue::Bytes(payload.into()), ttl).await
    }

    /// Stores an in-process value in the memory tier only.
    pub async fn set_transient<T: Any + Send + Sync>(
        &self,
        key: impl Into<String>,
        value: T,
        ttl: Duration,
    ) {
        self.set(key, CachedValue::opaque(value), ttl).await;
    }

    // == Get ==
    /// Looks `key` up in memory, then on disk.
    ///
    /// Memory hits only take a shared lock. A disk hit is copied into memory
    /// with its on-disk expiry unless promotion is disabled, a live memory
    /// entry appeared meanwhile, or a `remove`/`clear_all` ran during the
    /// disk read.
    pub async fn get(&self, key: &str) -> Option<CachedValue> {
        let (generation, stale) = {
            let memory = self.memory.read().await;
            match memory.peek(key) {
                Some(entry) if !entry.is_expired_at(self.clock.now()) => {
                    self.stats.record_memory_hit();
                    return Some(entry.value.clone());
                }
                entry => (memory.generation(), entry.is_some()),
            }
        };

        let owned_key = key.to_string();
        let record = self
            .run_disk("get", move |store| store.get(&owned_key))
            .await
            .flatten();

        match &record {
            Some(_) => self.stats.record_disk_hit(),
            None => self.stats.record_miss(),
        }

        let promote = self.promote_on_disk_hit && record.is_some();
        if stale || promote {
            let mut memory = self.memory.write().await;
            let now = self.clock.now();
            match &record {
                Some(record) if promote => {
                    let promoted = memory.promote(
                        key,
                        CachedValue::Bytes(record.payload.clone()),
                        record.expires_at,
                        now,
                        generation,
                    );
                    if promoted {
                        debug!(key, "Promoted disk hit to memory");
                    }
                }
                _ => {
                    memory.drop_expired(key, now);
                }
            }
        }

        record.map(|record| CachedValue::Bytes(record.payload))
    }

    /// Looks up a raw payload. `Opaque` values read as absent.
    pub async fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.get(key).await.and_then(CachedValue::into_bytes)
    }

    /// Looks up an in-process value of type `T`.
    pub async fn get_transient<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key).await.and_then(|value| value.downcast::<T>())
    }

    // == Remove ==
    /// Removes `key` from both tiers. Absent keys are a no-op.
    ///
    /// Memory is purged again once the disk record is gone, so a concurrent
    /// `get` that read the record before deletion cannot leave it promoted.
    pub async fn remove(&self, key: &str) {
        self.memory.write().await.remove(key);

        let owned_key = key.to_string();
        self.run_disk("remove", move |store| store.remove(&owned_key))
            .await;

        if self.disk.is_some() {
            self.memory.write().await.remove(key);
        }
    }

    // == Clear ==
    /// Empties both tiers.
    ///
    /// The disk side is best effort; the report lists artifacts that could not
    /// be deleted. It is empty when running memory-only. As with `remove`,
    /// memory is purged again after the disk clear.
    pub async fn clear_all(&self) -> ClearReport {
        let dropped = self.memory.write().await.clear();
        debug!(dropped, "Memory tier cleared");

        let Some(report) = self.run_disk("clear", |store| store.clear()).await else {
            if self.disk.is_some() {
                self.memory.write().await.clear();
            }
            return ClearReport::default();
        };
        self.memory.write().await.clear();

        if report.is_complete() {
            info!(removed = report.removed, "Cache cleared");
        } else {
            warn!(
                removed = report.removed,
                failed = report.failures.len(),
                "Cache cleared with failures"
            );
        }
        report
    }

    // == Maintenance ==
    /// Drops expired memory entries. Disk records expire lazily on access.
    pub async fn cleanup_expired(&self) -> usize {
        self.memory
            .write()
            .await
            .cleanup_expired(self.clock.now())
    }

    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.memory.read().await.len();
        self.stats.snapshot(total_entries)
    }

    /// Returns true if a disk tier is attached.
    pub fn is_persistent(&self) -> bool {
        self.disk.is_some()
    }

    /// Directory of the disk tier, if any.
    pub fn disk_dir(&self) -> Option<&Path> {
        self.disk.as_ref().map(PersistentStore::dir)
    }

    /// On-disk artifact locations for `key`, if a disk tier is attached.
    pub fn artifact_paths(&self, key: &str) -> Option<ArtifactPaths> {
        self.disk.as_ref().map(|store| store.artifact_paths(key))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Disk Dispatch ==
    /// Runs a blocking disk operation off the async worker threads.
    ///
    /// Returns `None` when there is no disk tier or the operation failed,
    /// panicked or timed out; failures are logged and counted. A timed-out
    /// operation keeps running on the blocking pool and may land after
    /// later operations on the same key.
    async fn run_disk<T, F>(&self, operation: &'static str, f: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&PersistentStore) -> Result<T> + Send + 'static,
    {
        let store = self.disk.clone()?;
        let task = tokio::task::spawn_blocking(move || f(&store));

        let joined = if self.io_timeout.is_zero() {
            task.await
        } else {
            match tokio::time::timeout(self.io_timeout, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        operation,
                        timeout_ms = self.io_timeout.as_millis() as u64,
                        "Disk tier operation timed out"
                    );
                    self.stats.record_disk_error();
                    return None;
                }
            }
        };

        match joined {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Disk tier operation failed");
                self.stats.record_disk_error();
                None
            }
            Err(e) => {
                warn!(operation, error = %e, "Disk tier task did not complete");
                self.stats.record_disk_error();
                None
            }
        }
    }
}
