//! Cache Module
//!
//! Provides the bounded, internally synchronized LRU cache used by the
//! detection client for device-id and header-fingerprint lookups.

mod entry;
mod lru;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use lru::LruCache;
pub use stats::CacheStats;

// == Public Constants ==
/// Capacity used when a caller requests a cache size of zero.
pub const DEFAULT_CACHE_CAPACITY: usize = 20_000;
