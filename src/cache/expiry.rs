//! Expiry Policy Module
//!
//! Decides whether an entry is still logically present.

use crate::cache::CacheEntry;

// == Expiry Policy ==
/// Fixed time-to-live applied to every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Lifetime of an entry after insertion, in milliseconds
    pub ttl_ms: u64,
}

impl ExpiryPolicy {
    pub fn new(ttl_ms: u64) -> Self {
        Self { ttl_ms }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived the TTL at `now_ms`.
    ///
    /// Boundary condition: an entry exactly `ttl_ms` old is still live; it
    /// expires once its age is strictly greater.
    pub fn is_expired<V>(&self, entry: &CacheEntry<V>, now_ms: u64) -> bool {
        entry.age_ms(now_ms) > self.ttl_ms
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_is_live() {
        let policy = ExpiryPolicy::new(400);
        let entry = CacheEntry::new("bar", 31, 10_000);

        assert!(!policy.is_expired(&entry, 10_000));
        assert!(!policy.is_expired(&entry, 10_399));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let policy = ExpiryPolicy::new(400);
        let entry = CacheEntry::new("bar", 31, 10_000);

        assert!(!policy.is_expired(&entry, 10_400), "Entry should be live at boundary");
        assert!(policy.is_expired(&entry, 10_401));
    }

    #[test]
    fn test_zero_ttl_expires_after_any_delay() {
        let policy = ExpiryPolicy::new(0);
        let entry = CacheEntry::new("bar", 31, 10_000);

        assert!(!policy.is_expired(&entry, 10_000));
        assert!(policy.is_expired(&entry, 10_001));
    }
}
