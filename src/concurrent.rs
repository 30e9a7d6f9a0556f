//! Thread-safe wrapper
//!
//! One shared/exclusive lock guards the whole collection: queries take the
//! shared mode, `add`/`remove`/`clear` take the exclusive mode. Whole-
//! instance locking is what makes a multi-index mutation appear atomic to
//! readers; per-index locks cannot give that without a lock-ordering
//! protocol.
//!
//! Query results are materialized to owned values before the guard drops,
//! so no lock is ever held across the caller's consumption of a result and
//! lock hold time stays bounded by the query itself.

use std::sync::RwLock;

use tracing::trace;

use crate::errors::{SetError, SetResult};
use crate::key::IndexKey;
use crate::set::{ElementId, IndexedSet};

/// [`IndexedSet`] behind a shared/exclusive lock.
///
/// Writes are totally ordered; a read that begins after a write's
/// exclusive section ends observes that write's complete effect on every
/// index, never a subset. A panicking writer poisons the lock, which every
/// later call surfaces as [`SetError::Poisoned`].
pub struct ConcurrentIndexedSet<T> {
    inner: RwLock<IndexedSet<T>>,
}

impl<T: Clone> ConcurrentIndexedSet<T> {
    pub(crate) fn from_set(set: IndexedSet<T>) -> Self {
        Self {
            inner: RwLock::new(set),
        }
    }

    fn read(&self) -> SetResult<std::sync::RwLockReadGuard<'_, IndexedSet<T>>> {
        self.inner.read().map_err(|_| SetError::Poisoned)
    }

    fn write(&self) -> SetResult<std::sync::RwLockWriteGuard<'_, IndexedSet<T>>> {
        self.inner.write().map_err(|_| SetError::Poisoned)
    }

    // ------------------------------------------------------------------
    // Mutations (exclusive mode)
    // ------------------------------------------------------------------

    /// Add an element. See [`IndexedSet::add`].
    pub fn add(&self, element: T) -> SetResult<ElementId> {
        self.write()?.add(element)
    }

    /// Remove the element holding a primary key. See [`IndexedSet::remove`].
    pub fn remove(&self, key: &IndexKey) -> SetResult<T> {
        self.write()?.remove(key)
    }

    /// Remove an element by handle
    pub fn remove_id(&self, id: ElementId) -> SetResult<T> {
        self.write()?.remove_id(id)
    }

    /// Atomically empty every structure
    pub fn clear(&self) -> SetResult<()> {
        self.write()?.clear();
        trace!("concurrent collection cleared");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries (shared mode, eagerly materialized)
    // ------------------------------------------------------------------

    /// The one element matching `key`, cloned out under the shared lock
    pub fn single(&self, name: &str, key: impl Into<IndexKey>) -> SetResult<T> {
        Ok(self.read()?.single(name, key)?.clone())
    }

    /// All elements matching `key`, materialized before the lock drops
    pub fn where_eq(&self, name: &str, key: impl Into<IndexKey>) -> SetResult<Vec<T>> {
        Ok(self.read()?.where_eq(name, key)?.cloned().collect())
    }

    /// All elements whose collection contains `value`
    pub fn where_contains(&self, name: &str, value: impl Into<IndexKey>) -> SetResult<Vec<T>> {
        Ok(self.read()?.where_contains(name, value)?.cloned().collect())
    }

    /// Bounded range scan in ascending key order
    pub fn range(
        &self,
        name: &str,
        start: Option<IndexKey>,
        end: Option<IndexKey>,
        inclusive_start: bool,
        inclusive_end: bool,
    ) -> SetResult<Vec<T>> {
        Ok(self
            .read()?
            .range(name, start, end, inclusive_start, inclusive_end)?
            .cloned()
            .collect())
    }

    /// Ascending skip/take walk of a range index
    pub fn order_by(&self, name: &str, skip: usize, take: usize) -> SetResult<Vec<T>> {
        Ok(self.read()?.order_by(name, skip, take)?.cloned().collect())
    }

    /// Descending skip/take walk of a range index
    pub fn order_by_desc(&self, name: &str, skip: usize, take: usize) -> SetResult<Vec<T>> {
        Ok(self
            .read()?
            .order_by_desc(name, skip, take)?
            .cloned()
            .collect())
    }

    /// All elements whose text starts with `prefix` under the index collation
    pub fn starts_with(&self, name: &str, prefix: &str) -> SetResult<Vec<T>> {
        Ok(self.read()?.starts_with(name, prefix)?.cloned().collect())
    }

    /// Element with the greatest key in a range index
    pub fn max(&self, name: &str) -> SetResult<T> {
        Ok(self.read()?.max(name)?.clone())
    }

    /// Element with the least key in a range index
    pub fn min(&self, name: &str) -> SetResult<T> {
        Ok(self.read()?.min(name)?.clone())
    }

    /// Every element, bypassing all indices
    pub fn full_scan(&self) -> SetResult<Vec<T>> {
        Ok(self.read()?.full_scan().cloned().collect())
    }

    /// Element count
    pub fn len(&self) -> SetResult<usize> {
        Ok(self.read()?.len())
    }

    /// True when no elements are held
    pub fn is_empty(&self) -> SetResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// The element a handle addresses, if still present
    pub fn get(&self, id: ElementId) -> SetResult<Option<T>> {
        Ok(self.read()?.get(id).cloned())
    }

    /// True if the primary key is present
    pub fn contains_key(&self, key: &IndexKey) -> bool {
        self.read().map(|set| set.contains_key(key)).unwrap_or(false)
    }

    /// Handles of every element in the primary store, ascending
    pub fn ids(&self) -> SetResult<Vec<ElementId>> {
        Ok(self.read()?.ids())
    }

    /// Distinct handles a named index currently holds (consistency audits)
    pub fn audit_index(&self, name: &str) -> SetResult<Vec<ElementId>> {
        self.read()?.audit_index(name)
    }

    /// Handles a named index should hold given cached extraction
    pub fn expected_index_ids(&self, name: &str) -> SetResult<Vec<ElementId>> {
        self.read()?.expected_index_ids(name)
    }
}

impl<T> std::fmt::Debug for ConcurrentIndexedSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentIndexedSet").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::IndexedSetBuilder;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        id: i64,
        score: i64,
    }

    fn build() -> ConcurrentIndexedSet<Entry> {
        IndexedSetBuilder::new()
            .primary_key("id", |e: &Entry| IndexKey::from_int(e.id))
            .range("score", |e: &Entry| IndexKey::from_int(e.score))
            .build_concurrent()
            .unwrap()
    }

    #[test]
    fn test_reads_see_complete_writes() {
        let set = build();
        set.add(Entry { id: 1, score: 10 }).unwrap();
        set.add(Entry { id: 2, score: 20 }).unwrap();

        assert_eq!(set.len().unwrap(), 2);
        assert_eq!(set.single("id", 1i64).unwrap().score, 10);
        assert_eq!(set.max("score").unwrap().id, 2);
        assert_eq!(set.audit_index("score").unwrap(), set.ids().unwrap());
    }

    #[test]
    fn test_results_are_owned_snapshots() {
        let set = build();
        set.add(Entry { id: 1, score: 10 }).unwrap();

        let snapshot = set.where_eq("id", 1i64).unwrap();
        set.remove(&IndexKey::from_int(1)).unwrap();

        // The materialized result is unaffected by the later write
        assert_eq!(snapshot, vec![Entry { id: 1, score: 10 }]);
        assert_eq!(set.len().unwrap(), 0);
    }

    #[test]
    fn test_conflict_through_wrapper() {
        let set = build();
        set.add(Entry { id: 1, score: 10 }).unwrap();
        assert!(matches!(
            set.add(Entry { id: 1, score: 99 }).unwrap_err(),
            SetError::Conflict { .. }
        ));
        assert_eq!(set.len().unwrap(), 1);
    }
}
