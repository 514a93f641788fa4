//! Memory Tier Module
//!
//! Volatile HashMap storage with lazy TTL expiration. Callers share it behind
//! a lock owned by [`crate::CacheManager`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, CachedValue};

// == Memory Tier ==
/// In-memory tier of the cache.
#[derive(Debug, Default)]
pub struct MemoryTier {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Bumped by every removal; a disk read that started under an older
    /// generation must not be promoted
    generation: u64,
}

impl MemoryTier {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Stores a value, replacing any previous entry and its expiry.
    pub fn insert(&mut self, key: String, value: CachedValue, expires_at: DateTime<Utc>) {
        self.entries.insert(key, CacheEntry::new(value, expires_at));
    }

    /// Inserts a value read back from disk.
    ///
    /// Skipped when a live entry already exists, or when a removal happened
    /// since `seen_generation` was read. Returns whether the value was inserted.
    pub fn promote(
        &mut self,
        key: &str,
        value: CachedValue,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
        seen_generation: u64,
    ) -> bool {
        self.drop_expired(key, now);
        if self.generation != seen_generation || self.entries.contains_key(key) {
            return false;
        }
        self.insert(key.to_string(), value, expires_at);
        true
    }

    // == Peek ==
    /// Borrows the entry for `key`, live or not.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Get ==
    /// Retrieves a live value by key, dropping it if it has expired.
    pub fn get(&mut self, key: &str, now: DateTime<Utc>) -> Option<CachedValue> {
        self.drop_expired(key, now);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Removes the entry for `key` only if it has expired as of `now`.
    pub fn drop_expired(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));
        if expired {
            self.entries.remove(key);
        }
        expired
    }

    // == Remove ==
    /// Removes an entry by key. Returns whether one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.generation = self.generation.wrapping_add(1);
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) -> usize {
        self.generation = self.generation.wrapping_add(1);
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    // == Cleanup Expired ==
    /// Removes all entries expired as of `now`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    /// Current removal generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
