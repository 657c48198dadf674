//! Eviction Policy Module
//!
//! Byte budget and per-item cap that decide admission and eviction.

// == Item Limit ==
/// Upper bound on the size of a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLimit {
    /// Any entry that fits the total capacity is admitted
    Unlimited,
    /// Entries larger than this many bytes are rejected
    Bytes(u64),
}

impl ItemLimit {
    // == From Signed ==
    /// Converts a signed byte count, where any negative value means
    /// unlimited.
    pub fn from_signed(max_item_bytes: i64) -> Self {
        u64::try_from(max_item_bytes)
            .map(ItemLimit::Bytes)
            .unwrap_or(ItemLimit::Unlimited)
    }

    /// Checks whether an entry of `size_bytes` is within the limit.
    pub fn allows(&self, size_bytes: u64) -> bool {
        match self {
            ItemLimit::Unlimited => true,
            ItemLimit::Bytes(max) => size_bytes <= *max,
        }
    }
}

// == Eviction Policy ==
/// Capacity rules shared by every insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Total byte budget for all live entries
    pub capacity_bytes: u64,
    /// Per-entry size cap
    pub item_limit: ItemLimit,
}

impl EvictionPolicy {
    pub fn new(capacity_bytes: u64, item_limit: ItemLimit) -> Self {
        Self {
            capacity_bytes,
            item_limit,
        }
    }

    // == Admits ==
    /// Checks whether an entry of `size_bytes` can ever be stored: it must
    /// pass the per-item cap and fit an otherwise empty cache.
    pub fn admits(&self, size_bytes: u64) -> bool {
        self.item_limit.allows(size_bytes) && size_bytes <= self.capacity_bytes
    }

    // == Fits ==
    /// Checks whether `size_bytes` more fit next to `used_bytes`.
    pub fn fits(&self, used_bytes: u64, size_bytes: u64) -> bool {
        used_bytes
            .checked_add(size_bytes)
            .is_some_and(|total| total <= self.capacity_bytes)
    }
}
