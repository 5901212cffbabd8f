//! Ordering list: doubly-linked, MRU at the front, LRU at the back.
//!
//! Entries live in a slot table and link to each other by index, so the
//! list needs no shared ownership. Two sentinel slots bound the sequence:
//!
//! ```text
//!   slot 0 (FRONT) ⇄ [MRU] ⇄ ... ⇄ [LRU] ⇄ slot 1 (BACK)
//! ```
//!
//! Sentinels never carry data and are never handed out as [`EntryId`]s.

const FRONT: usize = 0;
const BACK: usize = 1;

/// Stable handle to an entry stored in an [`OrderList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(usize);

/// A cached key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<K, V> {
    /// Key the entry is indexed under
    pub key: K,
    /// Current value
    pub value: V,
}

struct Node<K, V> {
    entry: Option<Entry<K, V>>,
    prev: usize,
    next: usize,
    linked: bool,
}

impl<K, V> Node<K, V> {
    fn sentinel(prev: usize, next: usize) -> Self {
        Self {
            entry: None,
            prev,
            next,
            linked: true,
        }
    }
}

/// Doubly-linked ordering list with front/back sentinels.
pub struct OrderList<K, V> {
    nodes: Vec<Node<K, V>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<K, V> OrderList<K, V> {
    /// Create an empty list (only the two sentinels, linked to each other)
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty list with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity + 2);
        nodes.push(Node::sentinel(FRONT, BACK));
        nodes.push(Node::sentinel(FRONT, BACK));

        Self {
            nodes,
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Number of entries linked between the sentinels
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no entry is linked
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `entry` in a slot. The entry starts out unlinked.
    pub fn alloc(&mut self, entry: Entry<K, V>) -> EntryId {
        let node = Node {
            entry: Some(entry),
            prev: FRONT,
            next: BACK,
            linked: false,
        };

        if let Some(idx) = self.free_list.pop() {
            self.nodes[idx] = node;
            EntryId(idx)
        } else {
            self.nodes.push(node);
            EntryId(self.nodes.len() - 1)
        }
    }

    /// Free the slot of an unlinked entry and hand the entry back.
    pub fn release(&mut self, id: EntryId) -> Option<Entry<K, V>> {
        let node = self.nodes.get_mut(id.0)?;
        debug_assert!(!node.linked, "release() on a linked entry");
        if node.linked {
            return None;
        }

        let entry = node.entry.take()?;
        self.free_list.push(id.0);
        Some(entry)
    }

    /// Detach an entry, joining its neighbours directly.
    ///
    /// The entry's own links are stale afterwards until [`attach_front`](Self::attach_front).
    pub fn unlink(&mut self, id: EntryId) {
        let idx = id.0;
        debug_assert!(self.is_data_slot(idx), "unlink() on a sentinel or free slot");
        debug_assert!(self.nodes[idx].linked, "unlink() on an unlinked entry");
        if !self.is_data_slot(idx) || !self.nodes[idx].linked {
            return;
        }

        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[idx].linked = false;
        self.len -= 1;
    }

    /// Insert an unlinked entry right after the front sentinel (new MRU).
    pub fn attach_front(&mut self, id: EntryId) {
        let idx = id.0;
        debug_assert!(self.is_data_slot(idx), "attach_front() on a sentinel or free slot");
        debug_assert!(!self.nodes[idx].linked, "attach_front() on a linked entry");
        if !self.is_data_slot(idx) || self.nodes[idx].linked {
            return;
        }

        let old_front = self.nodes[FRONT].next;
        self.nodes[idx].prev = FRONT;
        self.nodes[idx].next = old_front;
        self.nodes[old_front].prev = idx;
        self.nodes[FRONT].next = idx;
        self.nodes[idx].linked = true;
        self.len += 1;
    }

    /// Most-recently-used entry
    pub fn front(&self) -> Option<EntryId> {
        let idx = self.nodes[FRONT].next;
        (idx != BACK).then_some(EntryId(idx))
    }

    /// Least-recently-used entry (the eviction candidate)
    pub fn back(&self) -> Option<EntryId> {
        let idx = self.nodes[BACK].prev;
        (idx != FRONT).then_some(EntryId(idx))
    }

    /// Borrow the entry stored at `id`
    pub fn entry(&self, id: EntryId) -> Option<&Entry<K, V>> {
        self.nodes.get(id.0).and_then(|node| node.entry.as_ref())
    }

    /// Mutably borrow the entry stored at `id`
    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry<K, V>> {
        self.nodes.get_mut(id.0).and_then(|node| node.entry.as_mut())
    }

    /// Whether `id` currently sits between the sentinels
    pub fn is_linked(&self, id: EntryId) -> bool {
        self.is_data_slot(id.0) && self.nodes[id.0].linked
    }

    /// Iterate entries from MRU to LRU
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.nodes[FRONT].next,
            hops: 0,
        }
    }

    /// Iterate entry ids from MRU to LRU
    pub(crate) fn ids(&self) -> impl Iterator<Item = EntryId> + '_ {
        let mut cursor = self.nodes[FRONT].next;
        let mut hops = 0;
        std::iter::from_fn(move || {
            // `hops` bounds the walk if the links were ever corrupted into a cycle
            if cursor == BACK || hops > self.nodes.len() {
                return None;
            }
            let id = EntryId(cursor);
            cursor = self.nodes[cursor].next;
            hops += 1;
            Some(id)
        })
    }

    /// Previous-link of an entry (`None` when it points at the front sentinel)
    pub(crate) fn prev_of(&self, id: EntryId) -> Option<EntryId> {
        let prev = self.nodes.get(id.0)?.prev;
        (prev != FRONT).then_some(EntryId(prev))
    }

    /// Slots ever allocated, excluding sentinels and free slots
    pub(crate) fn occupied(&self) -> usize {
        self.nodes.len() - 2 - self.free_list.len()
    }

    fn is_data_slot(&self, idx: usize) -> bool {
        idx > BACK && idx < self.nodes.len() && self.nodes[idx].entry.is_some()
    }
}

impl<K, V> Default for OrderList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over entries from MRU to LRU
pub struct Iter<'a, K, V> {
    list: &'a OrderList<K, V>,
    cursor: usize,
    hops: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == BACK || self.hops > self.list.nodes.len() {
            return None;
        }
        let node = &self.list.nodes[self.cursor];
        self.cursor = node.next;
        self.hops += 1;
        node.entry.as_ref()
    }
}
