//! Result cache with TTL expiry and least-recently-used eviction.
//!
//! Entries are servable for `ttl` after insertion regardless of how often they
//! are read; reads only refresh their LRU position. The number of stored
//! entries never exceeds `capacity`: the insert that would overflow evicts the
//! least recently accessed entry inside the same critical section.
//!
//! The cache is read-aside. It never fetches; the dispatcher fills it on a miss.

use crate::clock::duration_millis;
use crate::config::CacheConfig;
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: u64,
}

/// Point-in-time counters for a [`ResultCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed to respect capacity.
    pub evictions: u64,
    /// Entries removed because their TTL elapsed.
    pub expirations: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

/// Thread-safe TTL + LRU cache.
pub struct ResultCache<K, V> {
    entries: Mutex<LruCache<K, Entry<V>>>,
    config: CacheConfig,
    counters: Counters,
}

impl<K: Hash + Eq, V> std::fmt::Debug for ResultCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.lock().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("ResultCache")
            .field("len", &len)
            .field("config", &self.config)
            .field("counters", &self.counters)
            .finish()
    }
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity()).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)), config, counters: Counters::default() }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, inserted_at: u64, now: u64) -> bool {
        now.saturating_sub(inserted_at) > duration_millis(self.config.ttl())
    }

    /// Look up `key` at clock reading `now`.
    ///
    /// A hit refreshes the entry's LRU position but not its TTL. An expired
    /// entry is removed and reported as a miss.
    pub fn get(&self, key: &K, now: u64) -> Option<V> {
        let mut entries = self.lock();

        let expired = match entries.peek(key) {
            Some(entry) => self.is_expired(entry.inserted_at, now),
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if expired {
            entries.pop(key);
            self.counters.expirations.fetch_add(1, Ordering::Relaxed);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let value = entries.get(key).map(|entry| entry.value.clone());
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Insert or overwrite `key`, stamping it with `now`.
    ///
    /// Returns the number of entries evicted to stay within capacity.
    pub fn put(&self, key: K, value: V, now: u64) -> usize {
        let mut entries = self.lock();
        let overwrite = entries.contains(&key);

        // push hands back either the overwritten entry or the evicted LRU one
        let displaced = entries.push(key, Entry { value, inserted_at: now });
        let evicted = usize::from(!overwrite && displaced.is_some());

        if evicted > 0 {
            self.counters.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        }
        evicted
    }

    /// Remove every entry whose TTL has elapsed at `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: u64) -> usize {
        let mut entries = self.lock();
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry.inserted_at, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }

        self.counters.expirations.fetch_add(expired.len() as u64, Ordering::Relaxed);
        expired.len()
    }

    /// Stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
        }
    }
}
