//! Cache Handle Module
//!
//! Thread-safe facade that prices values, then runs every store operation
//! under one exclusive lock.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{CacheStats, CacheStore, EvictionPolicy, ExpiryPolicy, ItemLimit};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::size::{HeapSize, SizeEstimator};

// == Cache ==
/// In-memory cache bounded by the estimated retained size of its values.
///
/// Cloning a `Cache` creates a new handle to the same underlying data.
///
/// ```
/// use sizecache::Cache;
///
/// let cache: Cache<String, Vec<u8>> = Cache::new(1024, 60_000, -1);
/// assert!(cache.put("k".to_string(), vec![0u8; 8]));
/// assert_eq!(cache.get("k"), Some(vec![0u8; 8]));
/// assert_eq!(cache.bytes_used(), 24);
/// ```
pub struct Cache<K, V> {
    /// Map, recency order and byte count, guarded together
    store: Arc<Mutex<CacheStore<K, V>>>,
    /// Time source for insertion stamps and expiry checks
    clock: Arc<dyn Clock>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone, V: HeapSize> Cache<K, V> {
    // == Constructor ==
    /// Creates a cache reading wall-clock time.
    ///
    /// # Arguments
    /// * `capacity_bytes` - Total byte budget
    /// * `ttl_ms` - Lifetime of each entry after insertion
    /// * `max_item_bytes` - Per-entry cap; any negative value means unlimited
    pub fn new(capacity_bytes: u64, ttl_ms: u64, max_item_bytes: i64) -> Self {
        Self::with_clock(capacity_bytes, ttl_ms, max_item_bytes, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(
        capacity_bytes: u64,
        ttl_ms: u64,
        max_item_bytes: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let eviction = EvictionPolicy::new(capacity_bytes, ItemLimit::from_signed(max_item_bytes));
        Self {
            store: Arc::new(Mutex::new(CacheStore::new(
                eviction,
                ExpiryPolicy::new(ttl_ms),
            ))),
            clock,
        }
    }

    /// Creates a cache from configuration.
    ///
    /// The background sweep is not started here; pass the cache to
    /// [`spawn_configured_cleanup`](crate::tasks::spawn_configured_cleanup)
    /// inside a tokio runtime to honour `cleanup_interval_ms`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.capacity_bytes, config.ttl_ms, config.max_item_bytes)
    }

    // == Put ==
    /// Stores `value` under `key`, evicting least recently used entries as
    /// needed.
    ///
    /// Returns false if the value is larger than the per-item cap or the
    /// total capacity; the cache is left unchanged in that case.
    pub fn put(&self, key: K, value: V) -> bool {
        // Priced before locking; the value is not shared with the cache yet.
        let size_bytes = SizeEstimator::estimate(&value);
        let mut store = self.store.lock();
        let now_ms = self.clock.now_millis();
        store.insert(key, value, size_bytes, now_ms)
    }

    // == Get ==
    /// Returns a copy of the live value under `key` and marks it most
    /// recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let mut store = self.store.lock();
        let now_ms = self.clock.now_millis();
        store.get(key, now_ms).cloned()
    }

    // == Contains Key ==
    /// Checks for a live entry without changing its recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.store.lock();
        store.contains_key(key, self.clock.now_millis())
    }

    // == Remove ==
    /// Removes the entry under `key`, if any.
    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().remove(key);
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    // == Size ==
    /// Returns the number of tracked entries.
    ///
    /// Expired entries keep counting until a lookup, an eviction or
    /// [`cleanup_expired`](Self::cleanup_expired) discovers them.
    pub fn size(&self) -> usize {
        self.store.lock().len()
    }

    /// Snapshot of the tracked keys, most recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.store.lock().keys()
    }

    /// Snapshot of the tracked values, most recently used first.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.store.lock().values()
    }

    pub fn bytes_used(&self) -> u64 {
        self.store.lock().bytes_used()
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.store.lock().capacity_bytes()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    // == Cleanup Expired ==
    /// Purges every expired entry now, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut store = self.store.lock();
        let now_ms = self.clock.now_millis();
        store.cleanup_expired(now_ms)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::thread;

    const KIB: usize = 1024;

    fn manual_cache(
        capacity_bytes: u64,
        ttl_ms: u64,
    ) -> (Cache<String, Vec<u8>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = Cache::with_clock(capacity_bytes, ttl_ms, -1, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_put_charges_estimated_size() {
        let (cache, _) = manual_cache(1024, 1_000);

        assert!(cache.put("k".to_string(), vec![0u8; 8]));
        assert_eq!(cache.bytes_used(), 24);
        assert_eq!(cache.capacity_bytes(), 1024);
    }

    #[test]
    fn test_get_clones_value() {
        let (cache, _) = manual_cache(1024, 1_000);

        cache.put("k".to_string(), vec![1, 2, 3]);
        assert_eq!(cache.get("k"), Some(vec![1, 2, 3]));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_get_after_ttl_purges() {
        let (cache, clock) = manual_cache(1024, 400);

        cache.put("k".to_string(), vec![0u8; 8]);
        clock.advance(400);
        assert!(cache.get("k").is_some());

        clock.advance(200);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.bytes_used(), 0);
    }

    #[test]
    fn test_size_is_lazy_about_expiry() {
        let (cache, clock) = manual_cache(1024, 400);

        cache.put("a".to_string(), vec![0u8; 8]);
        cache.put("b".to_string(), vec![0u8; 8]);
        clock.advance(600);

        assert_eq!(cache.size(), 2);
        assert!(!cache.contains_key("a"));

        assert_eq!(cache.cleanup_expired(), 2);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let (cache, _) = manual_cache(1024, 1_000);
        cache.remove("missing");
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let (cache, _) = manual_cache(1024, 1_000);
        let other = cache.clone();

        other.put("k".to_string(), vec![0u8; 4]);
        assert!(cache.contains_key("k"));
    }

    #[test]
    fn test_concurrent_puts_respect_capacity() {
        let capacity = (64 * KIB) as u64;
        let (cache, _) = manual_cache(capacity, 60_000);

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("w{}-{}", worker, i % 50);
                        cache.put(key, vec![0u8; KIB + i]);
                        assert!(cache.bytes_used() <= capacity);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert!(stats.bytes_used <= capacity);
        assert_eq!(stats.total_entries, cache.keys().len());
        let charged: u64 = cache
            .values()
            .iter()
            .map(SizeEstimator::estimate)
            .sum();
        assert_eq!(charged, stats.bytes_used);
    }
}
