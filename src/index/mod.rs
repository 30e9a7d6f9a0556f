//! Secondary index structures
//!
//! One `IndexState` per descriptor, created at build time and mutated only
//! by the collection's mutation path. Dispatch from a descriptor's kind to
//! its structure lives here; query routing by name lives in `set`.
//!
//! # Design Principles
//!
//! - Derived state: indices mirror the primary store, never the source of truth
//! - In-memory only: no persistence
//! - Deterministic: sorted range iteration, insertion-ordered buckets

pub mod hash;
pub mod inverted;
pub mod range;
pub mod trie;

pub use hash::{HashIndex, UniqueIndex};
pub use inverted::MembershipIndex;
pub use range::RangeIndex;
pub use trie::PrefixIndex;

use crate::descriptor::{CachedKeys, IndexDescriptor, IndexKind};
use crate::key::IndexKey;
use crate::set::ElementId;

/// The live structure backing one descriptor
#[derive(Debug)]
pub enum IndexState {
    Unique(UniqueIndex),
    Hash(HashIndex),
    Range(RangeIndex),
    Prefix(PrefixIndex),
    Membership(MembershipIndex),
}

impl IndexState {
    /// Build the empty structure a descriptor calls for
    pub fn for_descriptor<T>(descriptor: &IndexDescriptor<T>) -> Self {
        match descriptor.kind() {
            IndexKind::Unique => IndexState::Unique(UniqueIndex::new()),
            IndexKind::Hash => IndexState::Hash(HashIndex::new()),
            IndexKind::Range => IndexState::Range(RangeIndex::new()),
            IndexKind::Prefix => IndexState::Prefix(PrefixIndex::new(descriptor.collation())),
            IndexKind::Membership => IndexState::Membership(MembershipIndex::new()),
        }
    }

    /// The kind of structure held, for error messages
    pub fn kind(&self) -> IndexKind {
        match self {
            IndexState::Unique(_) => IndexKind::Unique,
            IndexState::Hash(_) => IndexKind::Hash,
            IndexState::Range(_) => IndexKind::Range,
            IndexState::Prefix(_) => IndexKind::Prefix,
            IndexState::Membership(_) => IndexKind::Membership,
        }
    }

    /// True if inserting `keys` would collide with an existing entry.
    ///
    /// Only unique structures can conflict; every other kind accepts any
    /// key. Called during validation, before any structure is written.
    pub fn would_conflict(&self, keys: &CachedKeys) -> Option<IndexKey> {
        match (self, keys) {
            (IndexState::Unique(index), CachedKeys::One(key)) if index.contains(key) => {
                Some(key.clone())
            }
            _ => None,
        }
    }

    /// Write one element's cached keys into the structure
    pub fn apply_insert(&mut self, keys: &CachedKeys, id: ElementId) {
        match (self, keys) {
            (IndexState::Unique(index), CachedKeys::One(key)) => index.insert(key.clone(), id),
            (IndexState::Hash(index), CachedKeys::One(key)) => index.insert(key.clone(), id),
            (IndexState::Range(index), CachedKeys::One(key)) => index.insert(key.clone(), id),
            (IndexState::Prefix(index), CachedKeys::One(key)) => {
                index.insert(key.as_text().unwrap_or_default(), id)
            }
            (IndexState::Membership(index), CachedKeys::Many(members)) => {
                index.insert(members, id)
            }
            // Kind and extractor arity are paired by the builder
            _ => unreachable!("descriptor kind does not match cached key shape"),
        }
    }

    /// Remove one element's cached keys from the structure
    pub fn apply_remove(&mut self, keys: &CachedKeys, id: ElementId) {
        match (self, keys) {
            (IndexState::Unique(index), CachedKeys::One(key)) => index.remove(key),
            (IndexState::Hash(index), CachedKeys::One(key)) => index.remove(key, id),
            (IndexState::Range(index), CachedKeys::One(key)) => index.remove(key.clone(), id),
            (IndexState::Prefix(index), CachedKeys::One(key)) => {
                index.remove(key.as_text().unwrap_or_default(), id)
            }
            (IndexState::Membership(index), CachedKeys::Many(members)) => {
                index.remove(members, id)
            }
            _ => unreachable!("descriptor kind does not match cached key shape"),
        }
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        match self {
            IndexState::Unique(index) => index.clear(),
            IndexState::Hash(index) => index.clear(),
            IndexState::Range(index) => index.clear(),
            IndexState::Prefix(index) => index.clear(),
            IndexState::Membership(index) => index.clear(),
        }
    }

    /// Distinct element handles held, for consistency audits
    pub fn audit_ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = match self {
            IndexState::Unique(index) => index.ids().collect(),
            IndexState::Hash(index) => index.ids().collect(),
            IndexState::Range(index) => index.ids().collect(),
            IndexState::Prefix(index) => index.ids(),
            IndexState::Membership(index) => index.ids().collect(),
        };
        ids.sort();
        ids.dedup();
        ids
    }
}
