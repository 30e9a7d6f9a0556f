//! multidex - a strict, deterministic, multi-index in-memory collection
//!
//! One primary store of elements plus any number of synchronized secondary
//! indices: unique, hash, range, prefix trie, and membership (inverted).
//! Queries dispatch to exactly one index by name; mutations are
//! all-or-nothing across every structure.
//!
//! ```
//! use multidex::{IndexKey, IndexedSetBuilder};
//!
//! #[derive(Debug, Clone)]
//! struct Entry { id: i64, score: i64 }
//!
//! let mut board = IndexedSetBuilder::new()
//!     .primary_key("id", |e: &Entry| IndexKey::from_int(e.id))
//!     .range("score", |e: &Entry| IndexKey::from_int(e.score))
//!     .build()
//!     .unwrap();
//!
//! board.add(Entry { id: 1, score: 40 }).unwrap();
//! board.add(Entry { id: 2, score: 90 }).unwrap();
//!
//! assert_eq!(board.max("score").unwrap().id, 2);
//! assert_eq!(board.order_by_desc("score", 0, 1).unwrap().next().unwrap().id, 2);
//! ```

pub mod concurrent;
pub mod descriptor;
pub mod errors;
pub mod index;
pub mod key;
pub mod set;

pub use concurrent::ConcurrentIndexedSet;
pub use descriptor::{IndexDescriptor, IndexKind, IndexedSetBuilder};
pub use errors::{BuildError, BuildResult, SetError, SetResult};
pub use key::{Collation, IndexKey};
pub use set::{ElementId, IndexedSet, Matches};
