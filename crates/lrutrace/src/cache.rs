//! LruCache: lookup index + ordering list, with a step trace per operation

use std::collections::HashSet;
use std::hash::Hash;
use std::num::NonZeroUsize;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::index::LookupIndex;
use crate::list::{Entry, EntryId, OrderList};
use crate::stats::CacheStats;
use crate::trace::{Line, Step, Trace};

/// Result of [`LruCache::get`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetOutcome<K, V> {
    /// Cached value, `None` on a miss
    pub value: Option<V>,
    /// Everything the lookup did, in order
    pub trace: Trace<K, V>,
}

impl<K, V> GetOutcome<K, V> {
    /// Whether the key was present
    pub fn found(&self) -> bool {
        self.value.is_some()
    }
}

/// Result of [`LruCache::put`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome<K, V> {
    /// Key evicted to make room, if any
    pub evicted: Option<K>,
    /// Everything the insert/update did, in order
    pub trace: Trace<K, V>,
}

/// Fixed-capacity LRU cache that records every internal step it takes.
///
/// All mutation happens synchronously inside [`get`](Self::get) and
/// [`put`](Self::put); the returned trace is a description of what already
/// happened, so replaying it never touches the cache again.
pub struct LruCache<K, V> {
    index: LookupIndex<K>,
    list: OrderList<K, V>,
    capacity: NonZeroUsize,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Returns
    /// * `Err(Error::InvalidCapacity)` - if `capacity` is 0
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or(Error::InvalidCapacity(capacity))?;
        Ok(Self::with_capacity(capacity))
    }

    /// Create a new LRU cache from a capacity that is already known to be positive
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        debug!(capacity = capacity.get(), "creating LRU cache");

        Self {
            index: LookupIndex::with_capacity(capacity.get()),
            list: OrderList::with_capacity(capacity.get()),
            capacity,
            stats: CacheStats::new(),
        }
    }

    /// Look up `key`, marking it most-recently-used on a hit
    pub fn get(&mut self, key: &K) -> GetOutcome<K, V> {
        let mut trace = Trace::new();
        trace.record(Line::GetCheck, Step::BeginGet { key: key.clone() });

        let Some(id) = self.index.get(key) else {
            trace.record(Line::GetMiss, Step::Miss { key: key.clone() });
            self.stats.record_miss();
            return GetOutcome { value: None, trace };
        };

        trace.record(Line::GetHit, Step::Hit { key: key.clone() });
        self.stats.record_hit();

        self.touch(id, key, Line::GetUnlink, Line::GetAttach, &mut trace);

        let value = self.list.entry(id).map(|entry| entry.value.clone());
        trace.record(Line::GetReturn, Step::Return { value: value.clone() });

        GetOutcome { value, trace }
    }

    /// Insert or update `key`, evicting the LRU entry if a new key would overflow
    pub fn put(&mut self, key: K, value: V) -> PutOutcome<K, V> {
        let mut trace = Trace::new();
        trace.record(
            Line::PutCheck,
            Step::BeginPut {
                key: key.clone(),
                value: value.clone(),
            },
        );

        if let Some(id) = self.index.get(&key) {
            // Update existing; cardinality is unchanged so capacity is not consulted
            trace.record(
                Line::PutUpdate,
                Step::Update {
                    key: key.clone(),
                    value: value.clone(),
                },
            );
            if let Some(entry) = self.list.entry_mut(id) {
                entry.value = value;
            }
            self.stats.record_update();

            self.touch(id, &key, Line::PutUnlink, Line::PutAttach, &mut trace);
            trace.record(Line::PutReturn, Step::Return { value: None });

            return PutOutcome {
                evicted: None,
                trace,
            };
        }

        // Insert new
        trace.record(Line::PutCapacity, Step::CheckCapacity { key: key.clone() });
        let evicted = if self.index.len() >= self.capacity.get() {
            self.evict(&mut trace)
        } else {
            None
        };

        trace.record(
            Line::PutCreate,
            Step::Create {
                key: key.clone(),
                value: value.clone(),
            },
        );
        let id = self.list.alloc(Entry {
            key: key.clone(),
            value,
        });

        trace.record(Line::PutInsert, Step::Insert { key: key.clone() });
        self.list.attach_front(id);

        trace.record(Line::PutIndex, Step::IndexSet { key: key.clone() });
        self.index.set(key, id);
        self.stats.record_insert();

        PutOutcome { evicted, trace }
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Check whether `key` is cached, without touching it or recording a trace
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains(key)
    }

    /// `(key, value)` pairs from MRU to LRU
    pub fn ordered_snapshot(&self) -> Vec<(K, V)> {
        self.list
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }

    /// Keys currently present
    pub fn keys_snapshot(&self) -> HashSet<K> {
        self.index.keys().cloned().collect()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Walk the list and the index and report the first inconsistency found.
    pub fn check_invariants(&self) -> Result<()> {
        if self.index.len() != self.list.len() {
            return Err(Error::Invariant(format!(
                "index holds {} keys but list links {} entries",
                self.index.len(),
                self.list.len()
            )));
        }

        if self.list.len() > self.capacity.get() {
            return Err(Error::Invariant(format!(
                "{} entries exceed capacity {}",
                self.list.len(),
                self.capacity
            )));
        }

        if self.list.occupied() != self.list.len() {
            return Err(Error::Invariant(format!(
                "{} slots occupied but only {} linked",
                self.list.occupied(),
                self.list.len()
            )));
        }

        let mut walked = 0;
        let mut prev: Option<EntryId> = None;
        for id in self.list.ids() {
            walked += 1;

            if self.list.prev_of(id) != prev {
                return Err(Error::Invariant(format!(
                    "back-link of list position {} does not match its predecessor",
                    walked - 1
                )));
            }

            let entry = self
                .list
                .entry(id)
                .ok_or_else(|| Error::Invariant("list links an empty slot".to_string()))?;
            if self.index.get(&entry.key) != Some(id) {
                return Err(Error::Invariant(format!(
                    "list position {} is not indexed under its key",
                    walked - 1
                )));
            }

            prev = Some(id);
        }

        if walked != self.list.len() {
            return Err(Error::Invariant(format!(
                "walked {} entries between sentinels, expected {}",
                walked,
                self.list.len()
            )));
        }

        if self.list.back() != prev {
            return Err(Error::Invariant(
                "back sentinel does not point at the last walked entry".to_string(),
            ));
        }

        for (key, id) in self.index.iter() {
            let linked = self.list.is_linked(id);
            let matches = self.list.entry(id).is_some_and(|entry| entry.key == *key);
            if !linked || !matches {
                return Err(Error::Invariant(
                    "index points at an entry that is not in the list".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Unlink then re-attach at the front, recording both halves
    fn touch(&mut self, id: EntryId, key: &K, unlink: Line, attach: Line, trace: &mut Trace<K, V>) {
        trace.record(unlink, Step::Delete { key: key.clone() });
        self.list.unlink(id);

        trace.record(attach, Step::MoveToFront { key: key.clone() });
        self.list.attach_front(id);
    }

    fn evict(&mut self, trace: &mut Trace<K, V>) -> Option<K> {
        let victim = self.list.back()?;
        let key = self.list.entry(victim)?.key.clone();

        trace.record(Line::PutEvict, Step::Evict { key: key.clone() });
        self.list.unlink(victim);
        self.list.release(victim);

        trace.record(Line::PutForget, Step::Forget { key: key.clone() });
        self.index.remove(&key);
        self.stats.record_eviction();

        trace!(len = self.list.len(), capacity = self.capacity.get(), "evicted LRU entry");
        Some(key)
    }
}
