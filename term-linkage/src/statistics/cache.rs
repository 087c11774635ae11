//! Caching of distinct counts across analysis runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{ColumnStatistics, StatisticsResult};

/// Cache entry with timestamp.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: u64,
    timestamp: Instant,
}

/// Time-bounded store of distinct counts keyed by `table.column`.
#[derive(Debug)]
pub struct StatsCache {
    cache: HashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl StatsCache {
    /// Creates a cache with a five minute TTL and room for 1000 entries.
    pub fn new() -> Self {
        Self::with_config(Duration::from_secs(300), 1000)
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(ttl: Duration, max_entries: usize) -> Self {
        Self {
            cache: HashMap::new(),
            ttl,
            max_entries,
        }
    }

    /// Builds the cache key for a column.
    pub fn key(table: &str, column: &str) -> String {
        format!("{table}.{column}")
    }

    /// Gets a value from the cache if it has not expired.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.cache.get(key).and_then(|entry| {
            if entry.timestamp.elapsed() < self.ttl {
                Some(entry.value)
            } else {
                None
            }
        })
    }

    /// Stores a count. A full cache first drops expired counts, then the
    /// oldest one.
    pub fn set(&mut self, key: String, value: u64) {
        if self.max_entries == 0 {
            return;
        }
        if self.cache.len() >= self.max_entries && !self.cache.contains_key(&key) {
            self.remove_expired();
            if self.cache.len() >= self.max_entries {
                self.evict_oldest();
            }
        }
        let entry = CacheEntry {
            value,
            timestamp: Instant::now(),
        };
        self.cache.insert(key, entry);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Drops counts older than the TTL.
    pub fn remove_expired(&mut self) {
        let ttl = self.ttl;
        self.cache.retain(|_, entry| entry.timestamp.elapsed() < ttl);
    }

    /// Number of stored counts, expired or not.
    pub fn size(&self) -> usize {
        self.cache.len()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|(_, entry)| entry.timestamp)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            debug!(key = %key, "Evicting cached distinct count");
            self.cache.remove(&key);
        }
    }

    pub fn stats(&self) -> CacheStats {
        let expired_entries = self
            .cache
            .values()
            .filter(|entry| entry.timestamp.elapsed() >= self.ttl)
            .count();
        CacheStats {
            total_entries: self.cache.len(),
            expired_entries,
            active_entries: self.cache.len() - expired_entries,
        }
    }
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of expired entries
    pub expired_entries: usize,
    /// Number of active (non-expired) entries
    pub active_entries: usize,
}

/// Wraps a provider and serves repeated distinct-count requests from a
/// [`StatsCache`].
///
/// Only successful answers are cached, so a missing column is asked about
/// again on the next run. The lock is never held across the inner query.
#[derive(Debug)]
pub struct CachedStatistics<S> {
    inner: S,
    cache: Mutex<StatsCache>,
}

impl<S: ColumnStatistics> CachedStatistics<S> {
    /// Wraps a provider with the default cache configuration.
    pub fn new(inner: S) -> Self {
        Self::with_cache(inner, StatsCache::new())
    }

    /// Wraps a provider with a preconfigured cache.
    pub fn with_cache(inner: S, cache: StatsCache) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops every cached count.
    pub fn invalidate(&self) {
        self.lock().clear();
    }

    /// Current cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.lock().stats()
    }

    fn lock(&self) -> MutexGuard<'_, StatsCache> {
        // Recover from poisoning
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<S: ColumnStatistics> ColumnStatistics for CachedStatistics<S> {
    async fn distinct_count(&self, table: &str, column: &str) -> StatisticsResult<u64> {
        let key = StatsCache::key(table, column);
        let cached = self.lock().get(&key);
        if let Some(count) = cached {
            debug!(table, column, count, "Distinct count served from cache");
            return Ok(count);
        }

        let count = self.inner.distinct_count(table, column).await?;
        self.lock().set(key, count);
        Ok(count)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
