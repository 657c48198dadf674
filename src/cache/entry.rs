//! Cache Entry Module
//!
//! Defines the structure for individual cache entries.

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Entries are replaced wholesale on overwrite, never mutated in place.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Estimated retained size of the value in bytes
    pub size_bytes: u64,
    /// Insertion timestamp in milliseconds
    pub inserted_at_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `size_bytes` - Estimated retained size of `value`
    /// * `now_ms` - Insertion time in milliseconds
    pub fn new(value: V, size_bytes: u64, now_ms: u64) -> Self {
        Self {
            value,
            size_bytes,
            inserted_at_ms: now_ms,
        }
    }

    // == Age ==
    /// Returns how long ago the entry was inserted, in milliseconds.
    ///
    /// A clock that moved backwards reads as age zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.inserted_at_ms)
    }

}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value".to_string(), 40, 1_000);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.size_bytes, 40);
        assert_eq!(entry.inserted_at_ms, 1_000);
    }

    #[test]
    fn test_entry_age() {
        let entry = CacheEntry::new((), 8, 1_000);

        assert_eq!(entry.age_ms(1_000), 0);
        assert_eq!(entry.age_ms(1_250), 250);
    }

    #[test]
    fn test_entry_age_with_clock_behind() {
        let entry = CacheEntry::new((), 8, 1_000);
        assert_eq!(entry.age_ms(900), 0);
    }
}
