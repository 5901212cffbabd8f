//! # lrutrace
//!
//! Fixed-capacity LRU cache that explains itself: every `get` and `put`
//! returns, next to its result, an ordered trace of the internal steps it
//! performed (index lookups, unlinks, front insertions, evictions).
//!
//! ## Architecture
//! - **Lookup index**: AHash map from key to entry handle (O(1))
//! - **Ordering list**: sentinel-bounded doubly-linked list over a slot table (O(1) touch/evict)
//! - **Trace**: tagged [`Step`]s, each tied to a line of the algorithm [`LISTING`]
//! - **Batch interpreter**: nom parser for `put`/`get` command scripts
//!
//! ```
//! use lrutrace::{Action, LruCache};
//!
//! let mut cache = LruCache::new(2).unwrap();
//! cache.put(1, "one");
//! cache.put(2, "two");
//! cache.get(&1);
//!
//! let put = cache.put(3, "three");
//! assert_eq!(put.evicted, Some(2));
//! assert_eq!(put.trace.count(Action::Evict), 1);
//! ```

#![warn(missing_docs)]

mod cache;
mod command;
mod error;
mod index;
mod list;
mod stats;
mod trace;

pub use cache::{GetOutcome, LruCache, PutOutcome};
pub use command::{execute, parse_batch, parse_command, run_batch, BatchItem, Command};
pub use error::{Error, Result};
pub use index::LookupIndex;
pub use list::{Entry, EntryId, Iter, OrderList};
pub use stats::CacheStats;
pub use trace::{Action, Line, Step, StepRecord, Trace, TraceStep, LISTING};
