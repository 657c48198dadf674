//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch hands the key a fresh, strictly increasing stamp:
/// - Lowest stamp = Least recently used
/// - Highest stamp = Most recently used
#[derive(Debug)]
pub struct LruTracker<K> {
    /// Keys ordered by their latest stamp
    order: BTreeMap<u64, K>,
    /// Latest stamp of each tracked key
    stamps: HashMap<K, u64>,
    /// Stamp handed out by the next touch
    next_stamp: u64,
}

impl<K: Hash + Eq + Clone> LruTracker<K> {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            stamps: HashMap::new(),
            next_stamp: 0,
        }
    }

    // == Touch ==
    /// Marks a key as most recently used, tracking it if it is new.
    pub fn touch(&mut self, key: K) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        if let Some(previous) = self.stamps.insert(key.clone(), stamp) {
            self.order.remove(&previous);
        }
        self.order.insert(stamp, key);
    }

    // == Refresh ==
    /// Marks an already tracked key as most recently used.
    ///
    /// Returns false if the key is not tracked.
    pub fn refresh<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let stamp = self.next_stamp;
        let previous = match self.stamps.get_mut(key) {
            Some(slot) => std::mem::replace(slot, stamp),
            None => return false,
        };
        self.next_stamp += 1;

        if let Some(tracked) = self.order.remove(&previous) {
            self.order.insert(stamp, tracked);
        }
        true
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(stamp) = self.stamps.remove(key) {
            self.order.remove(&stamp);
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.stamps.remove(&key);
        Some(key)
    }

    // == Most Recent First ==
    /// Iterates tracked keys from most to least recently used.
    pub fn most_recent_first(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.values().rev()
    }

    // == Clear ==
    /// Forgets every tracked key.
    pub fn clear(&mut self) {
        self.order.clear();
        self.stamps.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.stamps.contains_key(key)
    }
}

impl<K: Hash + Eq + Clone> Default for LruTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}
