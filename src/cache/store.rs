//! Cache Store Module
//!
//! Single-threaded cache engine combining HashMap storage with LRU tracking,
//! a byte budget and TTL expiration. Callers supply the current time and the
//! estimated size of each value.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::cache::{CacheEntry, CacheStats, EvictionPolicy, ExpiryPolicy, LruTracker};

// == Cache Store ==
/// Main cache storage with byte-budget LRU eviction and TTL support.
///
/// `bytes_used` always equals the sum of `size_bytes` over the stored
/// entries, and never exceeds the capacity after an insertion.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Sum of the sizes of all stored entries
    bytes_used: u64,
    /// Byte budget and per-item cap
    eviction: EvictionPolicy,
    /// Entry lifetime
    expiry: ExpiryPolicy,
}

impl<K: Hash + Eq + Clone, V> CacheStore<K, V> {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `eviction` - Byte budget and per-item cap
    /// * `expiry` - TTL applied to every entry
    pub fn new(eviction: EvictionPolicy, expiry: ExpiryPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            bytes_used: 0,
            eviction,
            expiry,
        }
    }

    // == Insert ==
    /// Stores a value whose estimated size is `size_bytes`.
    ///
    /// An existing entry under `key` is replaced and stops counting against
    /// the budget before room is made, so a replacement only evicts other
    /// entries when the new value itself needs the space. Least recently
    /// used entries are evicted until the new entry fits.
    ///
    /// Returns false, leaving the store untouched, if the value exceeds the
    /// per-item cap or the whole capacity.
    pub fn insert(&mut self, key: K, value: V, size_bytes: u64, now_ms: u64) -> bool {
        if !self.eviction.admits(size_bytes) {
            self.stats.record_rejection();
            debug!(
                "Rejected entry of {} bytes (capacity {} bytes, item limit {:?})",
                size_bytes, self.eviction.capacity_bytes, self.eviction.item_limit
            );
            return false;
        }

        // Replacing never counts the old value against the new one.
        self.purge(&key);
        self.make_room(size_bytes, now_ms);

        self.entries
            .insert(key.clone(), CacheEntry::new(value, size_bytes, now_ms));
        self.lru.touch(key);
        self.bytes_used += size_bytes;

        self.debug_check_invariants();
        true
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Expired entries are purged and counted as misses.
    pub fn get<Q>(&mut self, key: &Q, now_ms: u64) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = match self.entries.get(key) {
            Some(entry) => self.expiry.is_expired(entry, now_ms),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.purge(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!("Purged expired entry on lookup");
            self.debug_check_invariants();
            return None;
        }

        self.lru.refresh(key);
        self.stats.record_hit();
        trace!("Cache hit");
        self.entries.get(key).map(|entry| &entry.value)
    }

    // == Contains Key ==
    /// Checks whether a live entry exists without touching recency.
    pub fn contains_key<Q>(&self, key: &Q, now_ms: u64) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .is_some_and(|entry| !self.expiry.is_expired(entry, now_ms))
    }

    // == Remove ==
    /// Removes an entry by key, returning its value if it was stored.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.purge(key).map(|entry| entry.value);
        self.debug_check_invariants();
        removed
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.bytes_used = 0;
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self, now_ms: u64) -> usize {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.expiry.is_expired(entry, now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.purge(key);
            self.stats.record_expiration();
        }

        self.debug_check_invariants();
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats.bytes_used = self.bytes_used;
        stats.capacity_bytes = self.eviction.capacity_bytes;
        stats
    }

    // == Keys ==
    /// Returns the tracked keys, most recently used first.
    pub fn keys(&self) -> Vec<K> {
        self.lru.most_recent_first().cloned().collect()
    }

    // == Values ==
    /// Returns the tracked values, most recently used first.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.lru
            .most_recent_first()
            .filter_map(|key| self.entries.get(key))
            .map(|entry| entry.value.clone())
            .collect()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    ///
    /// Expired entries count until a lookup, an eviction or a cleanup
    /// discovers them.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the estimated bytes held by all entries.
    pub fn bytes_used(&self) -> u64 {
        self.bytes_used
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.eviction.capacity_bytes
    }

    // == Make Room ==
    /// Evicts least recently used entries until `size_bytes` more fit.
    fn make_room(&mut self, size_bytes: u64, now_ms: u64) {
        while !self.eviction.fits(self.bytes_used, size_bytes) {
            let Some(victim) = self.lru.evict_oldest() else {
                break;
            };
            let Some(entry) = self.entries.remove(&victim) else {
                continue;
            };
            self.bytes_used -= entry.size_bytes;

            // Entries that had already expired leave as expirations.
            if self.expiry.is_expired(&entry, now_ms) {
                self.stats.record_expiration();
            } else {
                self.stats.record_eviction();
            }
            debug!(
                "Evicted entry of {} bytes, {} of {} bytes in use",
                entry.size_bytes, self.bytes_used, self.eviction.capacity_bytes
            );
        }
    }

    /// Removes an entry from the map, the tracker and the byte count.
    fn purge<Q>(&mut self, key: &Q) -> Option<CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.bytes_used -= entry.size_bytes;
        Some(entry)
    }

    fn debug_check_invariants(&self) {
        debug_assert_eq!(
            self.bytes_used,
            self.entries.values().map(|entry| entry.size_bytes).sum::<u64>(),
            "bytes_used drifted from the stored entry sizes"
        );
        debug_assert!(self.bytes_used <= self.eviction.capacity_bytes);
        debug_assert_eq!(self.entries.len(), self.lru.len());
        debug_assert!(
            self.entries.keys().all(|key| self.lru.contains(key)),
            "stored key missing from the LRU order"
        );
    }
}
