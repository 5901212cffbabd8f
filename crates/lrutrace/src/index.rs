//! Lookup index: key → entry handle

use std::collections::HashMap;
use std::hash::Hash;
use ahash::RandomState;

use crate::list::EntryId;

/// Non-owning key lookup over the entries of an [`OrderList`](crate::OrderList).
///
/// The cache keeps this strictly in sync with the list; it never changes on
/// its own.
pub struct LookupIndex<K> {
    map: HashMap<K, EntryId, RandomState>,
}

impl<K> LookupIndex<K>
where
    K: Hash + Eq,
{
    /// Create an index sized for `capacity` keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
        }
    }

    /// Check whether `key` is indexed
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Handle of the entry holding `key`
    pub fn get(&self, key: &K) -> Option<EntryId> {
        self.map.get(key).copied()
    }

    /// Map `key` to `id`, replacing any previous mapping
    pub fn set(&mut self, key: K, id: EntryId) {
        self.map.insert(key, id);
    }

    /// Drop the mapping for `key`
    pub fn remove(&mut self, key: &K) -> Option<EntryId> {
        self.map.remove(key)
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate indexed keys (arbitrary order)
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys()
    }

    /// Iterate `(key, handle)` pairs (arbitrary order)
    pub fn iter(&self) -> impl Iterator<Item = (&K, EntryId)> {
        self.map.iter().map(|(k, &id)| (k, id))
    }
}
