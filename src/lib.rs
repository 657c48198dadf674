//! Sizecache - An in-memory cache bounded by retained bytes
//!
//! Prices every value with a deep size estimate, evicts least recently used
//! entries to stay within a byte budget, and expires entries after a TTL.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod size;
pub mod tasks;

pub use cache::{Cache, CacheStats};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use size::{FieldSize, HeapSize, SizeEstimator};
pub use tasks::{spawn_cleanup_task, spawn_configured_cleanup};
