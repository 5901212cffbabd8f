//! Step traces produced by [`LruCache::get`](crate::LruCache::get) and
//! [`LruCache::put`](crate::LruCache::put).
//!
//! A trace is an append-only list of the smallest named sub-actions an
//! operation performed, in order. Each step also points at the line of
//! [`LISTING`] it corresponds to, so a presentation layer can highlight the
//! algorithm as it replays.

use std::fmt;

use serde::Serialize;

/// Pseudocode of the cache algorithm. [`Line::number`] is a 1-based index into this.
pub const LISTING: [&str; 19] = [
    "get(key):",
    "    if key not in map:",
    "        return None",
    "    node = map[key]",
    "    unlink(node)",
    "    attach_front(node)",
    "    return node.value",
    "put(key, value):",
    "    if key in map:",
    "        node = map[key]; node.value = value",
    "        unlink(node)",
    "        attach_front(node)",
    "        return",
    "    if map.size() == capacity:",
    "        victim = back.prev; unlink(victim)",
    "        map.remove(victim.key)",
    "    node = Entry(key, value)",
    "    attach_front(node)",
    "    map[key] = node",
];

/// Semantic tag of a step, consumed by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Looking something up before deciding
    Check,
    /// Key found
    Hit,
    /// Key absent
    Miss,
    /// Entry detached from the list
    Delete,
    /// Entry attached at the front
    Insert,
    /// LRU entry dropped to make room
    Evict,
    /// Value overwritten in place
    Update,
    /// New entry allocated
    Create,
    /// Operation finished
    Return,
}

impl Action {
    /// Upper-case label, e.g. `EVICT`
    pub fn label(self) -> &'static str {
        match self {
            Action::Check => "CHECK",
            Action::Hit => "HIT",
            Action::Miss => "MISS",
            Action::Delete => "DELETE",
            Action::Insert => "INSERT",
            Action::Evict => "EVICT",
            Action::Update => "UPDATE",
            Action::Create => "CREATE",
            Action::Return => "RETURN",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Line of [`LISTING`] a step executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    /// `if key not in map` (get)
    GetCheck = 2,
    /// `return None`
    GetMiss = 3,
    /// `node = map[key]` (get)
    GetHit = 4,
    /// `unlink(node)` (get)
    GetUnlink = 5,
    /// `attach_front(node)` (get)
    GetAttach = 6,
    /// `return node.value`
    GetReturn = 7,
    /// `if key in map` (put)
    PutCheck = 9,
    /// `node.value = value`
    PutUpdate = 10,
    /// `unlink(node)` (put, existing key)
    PutUnlink = 11,
    /// `attach_front(node)` (put, existing key)
    PutAttach = 12,
    /// `return` (put, existing key)
    PutReturn = 13,
    /// `if map.size() == capacity`
    PutCapacity = 14,
    /// `victim = back.prev; unlink(victim)`
    PutEvict = 15,
    /// `map.remove(victim.key)`
    PutForget = 16,
    /// `node = Entry(key, value)`
    PutCreate = 17,
    /// `attach_front(node)` (put, new key)
    PutInsert = 18,
    /// `map[key] = node`
    PutIndex = 19,
}

impl Line {
    /// 1-based line number in [`LISTING`]
    pub fn number(self) -> usize {
        self as usize
    }

    /// Source text of this line
    pub fn source(self) -> &'static str {
        LISTING[self.number() - 1]
    }
}

/// One sub-action of a cache operation.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<K, V> {
    /// `get(key)` entered, about to consult the index
    BeginGet { key: K },
    /// Key not in the index
    Miss { key: K },
    /// Key found in the index
    Hit { key: K },
    /// Entry unlinked from the list
    Delete { key: K },
    /// Existing entry re-attached at the front
    MoveToFront { key: K },
    /// Operation returns (`get` hits carry the value)
    Return { value: Option<V> },
    /// `put(key, value)` entered, about to consult the index
    BeginPut { key: K, value: V },
    /// Existing entry's value overwritten
    Update { key: K, value: V },
    /// Key absent, checking whether the cache is full
    CheckCapacity { key: K },
    /// LRU entry unlinked to make room
    Evict { key: K },
    /// Evicted key dropped from the index
    Forget { key: K },
    /// New entry allocated
    Create { key: K, value: V },
    /// New entry attached at the front
    Insert { key: K },
    /// New key mapped in the index
    IndexSet { key: K },
}

impl<K, V> Step<K, V> {
    /// Semantic tag, if the step has one
    pub fn action(&self) -> Option<Action> {
        match self {
            Step::BeginGet { .. } | Step::BeginPut { .. } | Step::CheckCapacity { .. } => {
                Some(Action::Check)
            }
            Step::Miss { .. } => Some(Action::Miss),
            Step::Hit { .. } => Some(Action::Hit),
            Step::Delete { .. } => Some(Action::Delete),
            Step::MoveToFront { .. } | Step::Insert { .. } => Some(Action::Insert),
            Step::Return { .. } => Some(Action::Return),
            Step::Update { .. } => Some(Action::Update),
            Step::Evict { .. } => Some(Action::Evict),
            Step::Create { .. } => Some(Action::Create),
            Step::Forget { .. } | Step::IndexSet { .. } => None,
        }
    }

    /// Key the step concerns
    pub fn key(&self) -> Option<&K> {
        match self {
            Step::BeginGet { key }
            | Step::Miss { key }
            | Step::Hit { key }
            | Step::Delete { key }
            | Step::MoveToFront { key }
            | Step::BeginPut { key, .. }
            | Step::Update { key, .. }
            | Step::CheckCapacity { key }
            | Step::Evict { key }
            | Step::Forget { key }
            | Step::Create { key, .. }
            | Step::Insert { key }
            | Step::IndexSet { key } => Some(key),
            Step::Return { .. } => None,
        }
    }

    /// Victim key, for eviction steps only
    pub fn evicted_key(&self) -> Option<&K> {
        match self {
            Step::Evict { key } => Some(key),
            _ => None,
        }
    }

    /// Value the step carries (written, created or returned)
    pub fn value(&self) -> Option<&V> {
        match self {
            Step::BeginPut { value, .. } | Step::Update { value, .. } | Step::Create { value, .. } => {
                Some(value)
            }
            Step::Return { value } => value.as_ref(),
            _ => None,
        }
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Step<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::BeginGet { key } => write!(f, "get({}) called, check map", key),
            Step::Miss { key } => write!(f, "map does not contain key {}: MISS", key),
            Step::Hit { key } => write!(f, "map contains key {}: HIT, retrieve node", key),
            Step::Delete { key } => write!(f, "unlink(node {}): detach from list", key),
            Step::MoveToFront { key } => {
                write!(f, "attach_front(node {}): move to head (MRU)", key)
            }
            Step::Return { value: Some(value) } => write!(f, "return node.value ({})", value),
            Step::Return { value: None } => f.write_str("return"),
            Step::BeginPut { key, value } => {
                write!(f, "put({}, {}) called, check if key exists", key, value)
            }
            Step::Update { key, value } => {
                write!(f, "key {} exists: node.value = {}", key, value)
            }
            Step::CheckCapacity { key } => write!(f, "key {} not in map, check capacity", key),
            Step::Evict { key } => {
                write!(f, "capacity full: remove back.prev (LRU) key={}", key)
            }
            Step::Forget { key } => write!(f, "map.remove({})", key),
            Step::Create { key, value } => write!(f, "create Entry({}, {})", key, value),
            Step::Insert { key } => write!(f, "attach_front(node {}): insert at head (MRU)", key),
            Step::IndexSet { key } => write!(f, "map[{}] = node", key),
        }
    }
}

/// A step together with the listing line it executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep<K, V> {
    /// Listing line
    pub line: Line,
    /// What happened
    pub step: Step<K, V>,
}

/// Ordered record of everything one `get`/`put` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace<K, V> {
    steps: Vec<TraceStep<K, V>>,
}

impl<K, V> Trace<K, V> {
    pub(crate) fn new() -> Self {
        Self { steps: Vec::with_capacity(8) }
    }

    pub(crate) fn record(&mut self, line: Line, step: Step<K, V>) {
        self.steps.push(TraceStep { line, step });
    }

    /// All steps in execution order
    pub fn steps(&self) -> &[TraceStep<K, V>] {
        &self.steps
    }

    /// Iterate steps in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, TraceStep<K, V>> {
        self.steps.iter()
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if no step was recorded
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps tagged with `action`
    pub fn count(&self, action: Action) -> usize {
        self.steps
            .iter()
            .filter(|s| s.step.action() == Some(action))
            .count()
    }

    /// Convert into the flat record form handed to renderers
    pub fn to_records(&self) -> Vec<StepRecord<K, V>>
    where
        K: Clone + fmt::Display,
        V: Clone + fmt::Display,
    {
        self.steps.iter().map(StepRecord::from).collect()
    }
}

impl<K, V> IntoIterator for Trace<K, V> {
    type Item = TraceStep<K, V>;
    type IntoIter = std::vec::IntoIter<TraceStep<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a Trace<K, V> {
    type Item = &'a TraceStep<K, V>;
    type IntoIter = std::slice::Iter<'a, TraceStep<K, V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Flat, serializable form of a step.
///
/// Field names are the wire contract renderers depend on:
/// `{description, line, key?, action?, evictedKey?, value?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord<K, V> {
    /// Human-readable description
    pub description: String,
    /// 1-based [`LISTING`] line
    pub line: usize,
    /// Key the step concerns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<K>,
    /// Semantic tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Victim of an eviction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evicted_key: Option<K>,
    /// Value written, created or returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<V>,
}

impl<K, V> From<&TraceStep<K, V>> for StepRecord<K, V>
where
    K: Clone + fmt::Display,
    V: Clone + fmt::Display,
{
    fn from(ts: &TraceStep<K, V>) -> Self {
        Self {
            description: ts.step.to_string(),
            line: ts.line.number(),
            key: ts.step.key().cloned(),
            action: ts.step.action(),
            evicted_key: ts.step.evicted_key().cloned(),
            value: ts.step.value().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_numbers_point_into_listing() {
        assert_eq!(Line::GetCheck.source(), "    if key not in map:");
        assert_eq!(Line::PutEvict.source(), "        victim = back.prev; unlink(victim)");
        assert_eq!(Line::PutIndex.source(), "    map[key] = node");
        assert_eq!(Line::PutIndex.number(), 19);
    }

    #[test]
    fn test_step_tags() {
        let evict: Step<u32, u32> = Step::Evict { key: 4 };
        assert_eq!(evict.action(), Some(Action::Evict));
        assert_eq!(evict.key(), Some(&4));
        assert_eq!(evict.evicted_key(), Some(&4));

        let forget: Step<u32, u32> = Step::Forget { key: 4 };
        assert_eq!(forget.action(), None);
        assert_eq!(forget.evicted_key(), None);

        let ret: Step<u32, u32> = Step::Return { value: Some(9) };
        assert_eq!(ret.key(), None);
        assert_eq!(ret.value(), Some(&9));
    }

    #[test]
    fn test_descriptions() {
        let step: Step<&str, &str> = Step::BeginPut { key: "a", value: "x" };
        assert_eq!(step.to_string(), "put(a, x) called, check if key exists");

        let step: Step<&str, &str> = Step::Return { value: None };
        assert_eq!(step.to_string(), "return");
    }

    #[test]
    fn test_trace_count() {
        let mut trace: Trace<u32, u32> = Trace::new();
        trace.record(Line::GetCheck, Step::BeginGet { key: 1 });
        trace.record(Line::GetMiss, Step::Miss { key: 1 });

        assert_eq!(trace.len(), 2);
        assert_eq!(trace.count(Action::Check), 1);
        assert_eq!(trace.count(Action::Miss), 1);
        assert_eq!(trace.count(Action::Hit), 0);
    }

    #[test]
    fn test_record_serialization_omits_absent_fields() {
        let mut trace: Trace<String, String> = Trace::new();
        trace.record(Line::PutEvict, Step::Evict { key: "b".to_string() });
        trace.record(Line::PutReturn, Step::Return { value: None });

        let records = trace.to_records();
        let evict = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(evict["action"], "evict");
        assert_eq!(evict["evictedKey"], "b");
        assert_eq!(evict["key"], "b");
        assert_eq!(evict["line"], 15);

        let ret = serde_json::to_value(&records[1]).unwrap();
        assert_eq!(ret["action"], "return");
        assert!(ret.get("key").is_none());
        assert!(ret.get("evictedKey").is_none());
        assert!(ret.get("value").is_none());
    }
}
