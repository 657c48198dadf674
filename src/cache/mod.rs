//! Cache Module
//!
//! Provides in-memory caching bounded by estimated retained bytes, with TTL
//! expiration and LRU eviction.

mod entry;
mod eviction;
mod expiry;
mod handle;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use eviction::{EvictionPolicy, ItemLimit};
pub use expiry::ExpiryPolicy;
pub use handle::Cache;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Sentinel for `max_item_bytes` meaning no per-item cap.
pub const UNLIMITED_ITEM_BYTES: i64 = -1;
