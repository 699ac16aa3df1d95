//! Cache Entry Module
//!
//! Defines the entry slot and the arena backing the recency list.
//!
//! The recency list is a doubly-linked list expressed with indices into a
//! growable slot vector instead of owned pointers. Freed slots are recycled
//! through a free list, so eviction is an index swap rather than a
//! deallocation, and there is no cyclic ownership to manage.

// == Entry Slot ==
/// A single cache entry: a key, a value, and its links into the recency list.
///
/// `prev` points toward the most-recently-used end (head), `next` toward the
/// least-recently-used end (tail). Both are indices into the owning arena.
#[derive(Debug)]
pub(crate) struct EntrySlot<K, V> {
    /// The cache key, duplicated here so eviction can unlink the index entry
    pub key: K,
    /// The cached payload
    pub value: V,
    /// Index of the neighbor toward the head, None if this entry is the head
    pub prev: Option<usize>,
    /// Index of the neighbor toward the tail, None if this entry is the tail
    pub next: Option<usize>,
}

// == Entry Arena ==
/// Slot storage for the recency list.
///
/// Occupied slots hold `Some(EntrySlot)`; vacated slots are `None` and their
/// indices are queued for reuse. An index handed out by [`EntryArena::insert`]
/// stays valid until it is passed to [`EntryArena::remove`].
#[derive(Debug, Default)]
pub(crate) struct EntryArena<K, V> {
    slots: Vec<Option<EntrySlot<K, V>>>,
    free: Vec<usize>,
}

impl<K, V> EntryArena<K, V> {
    // == Constructor ==
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    // == Insert ==
    /// Stores a new unlinked entry and returns its slot index.
    ///
    /// Reuses a freed slot when one is available, otherwise grows the
    /// slot vector.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        let slot = EntrySlot {
            key,
            value,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        }
    }

    // == Remove ==
    /// Vacates a slot and returns the entry it held.
    ///
    /// # Panics
    /// Panics if `idx` does not refer to an occupied slot. The cache keeps
    /// the index map and the arena in lockstep, so a vacant index here means
    /// internal state is already corrupt.
    pub fn remove(&mut self, idx: usize) -> EntrySlot<K, V> {
        let slot = self.slots[idx].take().expect("remove on vacant entry slot");
        self.free.push(idx);
        slot
    }

    // == Accessors ==
    /// Returns a reference to the entry at `idx`, or None if vacant.
    pub fn get(&self, idx: usize) -> Option<&EntrySlot<K, V>> {
        self.slots.get(idx).and_then(|s| s.as_ref())
    }

    /// Returns a mutable reference to the entry at `idx`.
    ///
    /// # Panics
    /// Panics if `idx` refers to a vacant slot.
    pub fn get_mut(&mut self, idx: usize) -> &mut EntrySlot<K, V> {
        self.slots[idx].as_mut().expect("vacant entry slot")
    }

    // == Clear ==
    /// Drops every entry and forgets the free list.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
