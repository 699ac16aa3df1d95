//! LRU Cache Module
//!
//! Bounded, fixed-capacity cache with least-recently-used eviction.
//!
//! Combines a key-to-slot `HashMap` index with an arena-backed doubly-linked
//! recency list: head is the most-recently-used entry, tail the
//! least-recently-used. All operations are O(1) average and execute under a
//! single mutex per cache instance, so callers never need external locking
//! and no operation can observe a partially rewired list.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::cache::entry::EntryArena;
use crate::cache::{CacheStats, DEFAULT_CACHE_CAPACITY};

// == LRU Cache ==
/// Thread-safe LRU cache with a fixed capacity.
///
/// `get` and `put` both count as "use": a hit promotes the entry to the
/// most-recently-used position, and inserting over capacity evicts the
/// least-recently-used entry. Operations never fail and never perform I/O;
/// any key, including the empty string, is an ordinary token.
#[derive(Debug)]
pub struct LruCache<K, V> {
    /// Maximum number of distinct keys, fixed at construction
    capacity: usize,
    /// All mutable state, serialized under one coarse lock
    inner: Mutex<LruInner<K, V>>,
}

/// Mutable cache state: the index, the slot arena, and the list endpoints.
#[derive(Debug)]
struct LruInner<K, V> {
    /// Key to arena-slot index
    index: HashMap<K, usize>,
    /// Slot storage for the recency list
    arena: EntryArena<K, V>,
    /// Most-recently-used entry
    head: Option<usize>,
    /// Least-recently-used entry
    tail: Option<usize>,
    /// Performance counters
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a new cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is replaced by [`DEFAULT_CACHE_CAPACITY`]; the
    /// substitution is logged but is not an error, so callers must not rely
    /// on zero meaning "no caching".
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity > 0 {
            capacity
        } else {
            warn!(
                default = DEFAULT_CACHE_CAPACITY,
                "cache capacity of zero requested, falling back to default"
            );
            DEFAULT_CACHE_CAPACITY
        };

        Self {
            capacity,
            inner: Mutex::new(LruInner {
                index: HashMap::new(),
                arena: EntryArena::new(),
                head: None,
                tail: None,
                stats: CacheStats::new(),
            }),
        }
    }

    // == Get ==
    /// Returns a clone of the value mapped to `key`, or None if absent.
    ///
    /// A hit promotes the entry to the most-recently-used position. A miss
    /// touches nothing beyond the miss counter.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        match inner.index.get(key).copied() {
            Some(idx) => {
                inner.promote(idx);
                inner.stats.record_hit();
                inner.arena.get(idx).map(|slot| slot.value.clone())
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts `value` under `key`, making the entry most-recently-used.
    ///
    /// If the key is already present, the value is replaced in place and the
    /// size does not change. If the key is new and the cache is full, the
    /// least-recently-used entry is evicted first.
    pub fn put(&self, key: K, value: V) {
        let mut inner = self.lock();
        if let Some(idx) = inner.index.get(&key).copied() {
            inner.arena.get_mut(idx).value = value;
            inner.promote(idx);
            return;
        }

        if inner.index.len() == self.capacity {
            inner.evict_tail();
        }

        let idx = inner.arena.insert(key.clone(), value);
        inner.push_front(idx);
        inner.index.insert(key, idx);
    }

    // == Clear ==
    /// Removes all entries. Capacity and statistics counters are preserved.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.index.clear();
        inner.arena.clear();
        inner.head = None;
        inner.tail = None;
    }

    // == Length ==
    /// Returns the current number of distinct keys held.
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().index.is_empty()
    }

    // == Capacity ==
    /// Returns the fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Stats ==
    /// Returns a snapshot of the hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats.clone()
    }

    /// Acquires the state lock, recovering from a poisoned mutex.
    ///
    /// Cache operations only rewire indices, so state stays consistent even
    /// if a caller panicked while holding the lock.
    fn lock(&self) -> MutexGuard<'_, LruInner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Consistency Check (test support) ==
    /// Walks the recency list in both directions and asserts it is a single
    /// acyclic chain enumerating exactly `len()` entries, each present in
    /// the index. Returns the entry count.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) -> usize {
        let inner = self.lock();
        let expected = inner.index.len();

        // Forward walk from head via next
        let mut count = 0;
        let mut cursor = inner.head;
        let mut last = None;
        while let Some(idx) = cursor {
            let slot = inner.arena.get(idx).expect("list points at vacant slot");
            assert_eq!(
                inner.index.get(&slot.key).copied(),
                Some(idx),
                "list entry missing from index"
            );
            count += 1;
            assert!(count <= expected, "cycle detected in recency list");
            last = Some(idx);
            cursor = slot.next;
        }
        assert_eq!(count, expected, "forward walk did not cover all entries");
        assert_eq!(last, inner.tail, "forward walk did not end at tail");

        // Backward walk from tail via prev
        let mut back_count = 0;
        let mut cursor = inner.tail;
        let mut first = None;
        while let Some(idx) = cursor {
            let slot = inner.arena.get(idx).expect("list points at vacant slot");
            back_count += 1;
            assert!(back_count <= expected, "cycle detected in recency list");
            first = Some(idx);
            cursor = slot.prev;
        }
        assert_eq!(back_count, expected, "backward walk did not cover all entries");
        assert_eq!(first, inner.head, "backward walk did not end at head");

        count
    }
}

impl<K, V> LruInner<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Unlinks the entry at `idx` from the recency list.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = self.arena.get_mut(idx);
            (slot.prev.take(), slot.next.take())
        };

        match prev {
            Some(p) => self.arena.get_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.arena.get_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    /// Links the unlinked entry at `idx` in as the new head.
    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let slot = self.arena.get_mut(idx);
            slot.prev = None;
            slot.next = old_head;
        }
        if let Some(h) = old_head {
            self.arena.get_mut(h).prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    /// Moves the entry at `idx` to the most-recently-used position.
    ///
    /// Promoting the current head is a no-op; promoting the current tail
    /// must re-point the tail at its predecessor.
    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.push_front(idx);
    }

    /// Evicts the least-recently-used entry, if any.
    fn evict_tail(&mut self) {
        let Some(idx) = self.tail else {
            return;
        };
        self.detach(idx);
        let slot = self.arena.remove(idx);
        self.index.remove(&slot.key);
        self.stats.record_eviction();
    }
}
