//! Unique and non-unique hash indices
//!
//! Both map extracted keys to element handles through a `HashMap`. The
//! unique variant holds exactly one handle per key and never overwrites;
//! conflicts are caught during validation, before any structure changes.

use std::collections::HashMap;

use crate::key::IndexKey;
use crate::set::ElementId;

/// Maps one key to exactly one element
#[derive(Debug, Default)]
pub struct UniqueIndex {
    map: HashMap<IndexKey, ElementId>,
}

impl UniqueIndex {
    /// Creates an empty unique index
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a key is already present
    pub fn contains(&self, key: &IndexKey) -> bool {
        self.map.contains_key(key)
    }

    /// Insert a key. The caller has already validated uniqueness.
    pub fn insert(&mut self, key: IndexKey, id: ElementId) {
        self.map.insert(key, id);
    }

    /// Remove a key
    pub fn remove(&mut self, key: &IndexKey) {
        self.map.remove(key);
    }

    /// Lookup the element for a key
    pub fn get(&self, key: &IndexKey) -> Option<ElementId> {
        self.map.get(key).copied()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if no keys are held
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// All element handles, in arbitrary order (consistency audits)
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.map.values().copied()
    }
}

/// Maps one key to an insertion-ordered group of elements
#[derive(Debug, Default)]
pub struct HashIndex {
    map: HashMap<IndexKey, Vec<ElementId>>,
}

impl HashIndex {
    /// Creates an empty hash index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element to a key's bucket
    pub fn insert(&mut self, key: IndexKey, id: ElementId) {
        self.map.entry(key).or_default().push(id);
    }

    /// Remove an element from a key's bucket.
    ///
    /// If the bucket becomes empty, removes the key entirely.
    pub fn remove(&mut self, key: &IndexKey, id: ElementId) {
        if let Some(bucket) = self.map.get_mut(key) {
            bucket.retain(|held| *held != id);
            if bucket.is_empty() {
                self.map.remove(key);
            }
        }
    }

    /// All elements for a key, in insertion order
    pub fn get(&self, key: &IndexKey) -> &[ElementId] {
        self.map.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.map.len()
    }

    /// All element handles across all buckets (consistency audits)
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.map.values().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_insert_and_get() {
        let mut index = UniqueIndex::new();
        index.insert(IndexKey::from_str("alice"), ElementId(1));
        index.insert(IndexKey::from_str("bob"), ElementId(2));

        assert_eq!(index.get(&IndexKey::from_str("alice")), Some(ElementId(1)));
        assert_eq!(index.get(&IndexKey::from_str("carol")), None);
        assert!(index.contains(&IndexKey::from_str("bob")));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_unique_remove() {
        let mut index = UniqueIndex::new();
        index.insert(IndexKey::from_int(7), ElementId(1));
        index.remove(&IndexKey::from_int(7));
        assert!(index.is_empty());
    }

    #[test]
    fn test_hash_bucket_insertion_order() {
        let mut index = HashIndex::new();
        index.insert(IndexKey::from_str("red"), ElementId(3));
        index.insert(IndexKey::from_str("red"), ElementId(1));
        index.insert(IndexKey::from_str("red"), ElementId(2));

        assert_eq!(
            index.get(&IndexKey::from_str("red")),
            &[ElementId(3), ElementId(1), ElementId(2)]
        );
    }

    #[test]
    fn test_hash_remove_drops_empty_bucket() {
        let mut index = HashIndex::new();
        index.insert(IndexKey::from_str("red"), ElementId(1));
        index.insert(IndexKey::from_str("red"), ElementId(2));

        index.remove(&IndexKey::from_str("red"), ElementId(1));
        assert_eq!(index.get(&IndexKey::from_str("red")), &[ElementId(2)]);

        index.remove(&IndexKey::from_str("red"), ElementId(2));
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn test_hash_get_missing_is_empty() {
        let index = HashIndex::new();
        assert!(index.get(&IndexKey::from_int(0)).is_empty());
    }
}
