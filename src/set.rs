//! The indexed collection
//!
//! `IndexedSet` owns the primary store (an arena of elements addressed by
//! `ElementId`), the frozen index registry, and the mutation path that keeps
//! every index consistent with the primary store.
//!
//! # Mutation discipline
//!
//! Every mutation is `Validating → Applying → Committed`, or
//! `Validating → Rejected` with zero observable change. Validation runs
//! every extractor exactly once and checks every uniqueness constraint
//! before any structure is written, so there is no rollback path: a
//! rejected Add never touched anything.
//!
//! # Invariants
//!
//! - Every element in the primary store has exactly one entry in every
//!   index, and no index holds a handle to a removed element
//! - A unique index never maps one key to more than one element
//! - Range iteration is ascending by key, insertion order among ties
//! - Cached keys are extracted at Add time and never recomputed

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::descriptor::{CachedKeys, IndexDescriptor, IndexKind};
use crate::errors::{SetError, SetResult};
use crate::index::IndexState;
use crate::key::IndexKey;

/// Stable handle addressing one element in the collection.
///
/// Assigned monotonically at Add and never reused within one collection's
/// lifetime; doubles as the insertion-sequence tie-break for range order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One stored element plus the keys every descriptor produced for it at
/// Add time (Cached Extraction). Removal replays these keys instead of
/// re-invoking extractors against a possibly-mutated element.
#[derive(Debug)]
struct ElementRecord<T> {
    element: T,
    cached: Vec<CachedKeys>,
}

/// In-memory collection with synchronized secondary indices.
///
/// Not internally synchronized; safe for single-threaded or externally
/// synchronized use. Wrap in [`ConcurrentIndexedSet`] for shared use.
///
/// [`ConcurrentIndexedSet`]: crate::concurrent::ConcurrentIndexedSet
pub struct IndexedSet<T> {
    descriptors: Vec<IndexDescriptor<T>>,
    states: Vec<IndexState>,
    by_name: HashMap<String, usize>,
    /// Position of the primary-key descriptor, if one was declared
    primary: Option<usize>,
    /// Primary store. BTreeMap keyed by monotonic handle gives full scans
    /// a deterministic insertion order.
    elements: BTreeMap<ElementId, ElementRecord<T>>,
    next_id: u64,
}

impl<T> IndexedSet<T> {
    pub(crate) fn from_parts(
        descriptors: Vec<IndexDescriptor<T>>,
        primary: Option<usize>,
    ) -> Self {
        let states = descriptors.iter().map(IndexState::for_descriptor).collect();
        let by_name = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();
        Self {
            descriptors,
            states,
            by_name,
            primary,
            elements: BTreeMap::new(),
            next_id: 1,
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add an element.
    ///
    /// Validation extracts every index key once and checks the primary key
    /// and every unique index; a conflict rejects the Add with no change to
    /// any structure. On success every index receives the element.
    pub fn add(&mut self, element: T) -> SetResult<ElementId> {
        // Validating
        let cached: Vec<CachedKeys> = self
            .descriptors
            .iter()
            .map(|d| d.extract(&element))
            .collect();

        for (pos, keys) in cached.iter().enumerate() {
            if let Some(key) = self.states[pos].would_conflict(keys) {
                let index = self.descriptors[pos].name().to_string();
                debug!(index = %index, key = %key, "add rejected: conflict");
                return Err(SetError::Conflict { index, key });
            }
        }

        // Applying
        let id = ElementId(self.next_id);
        self.next_id += 1;
        for (state, keys) in self.states.iter_mut().zip(cached.iter()) {
            state.apply_insert(keys, id);
        }
        self.elements.insert(id, ElementRecord { element, cached });
        trace!(id = %id, "add committed");
        Ok(id)
    }

    /// Remove the element holding a primary key.
    ///
    /// Fails with `NotFound` if the key is absent or if the collection was
    /// built without a primary-key declaration.
    pub fn remove(&mut self, key: &IndexKey) -> SetResult<T> {
        let id = self
            .primary
            .and_then(|pos| match &self.states[pos] {
                IndexState::Unique(index) => index.get(key),
                _ => None,
            })
            .ok_or(SetError::NotFound)?;
        self.remove_id(id)
    }

    /// Remove an element by handle
    pub fn remove_id(&mut self, id: ElementId) -> SetResult<T> {
        let record = self.elements.remove(&id).ok_or(SetError::NotFound)?;
        for (state, keys) in self.states.iter_mut().zip(record.cached.iter()) {
            state.apply_remove(keys, id);
        }
        trace!(id = %id, "remove committed");
        Ok(record.element)
    }

    /// Atomically empty every structure. Handles are not reused afterwards.
    pub fn clear(&mut self) {
        for state in &mut self.states {
            state.clear();
        }
        self.elements.clear();
        debug!("collection cleared");
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The one element matching `key` in the named index.
    ///
    /// Fails with `NotFound` on zero matches and `Ambiguous` on more than
    /// one; use [`where_eq`](Self::where_eq) for "may or may not exist".
    pub fn single(&self, name: &str, key: impl Into<IndexKey>) -> SetResult<&T> {
        let pos = self.resolve(name)?;
        let key = key.into().fold(self.descriptors[pos].collation());
        let ids = self.ids_for_key(pos, &key)?;
        match ids.len() {
            0 => Err(SetError::NotFound),
            1 => Ok(self.element(ids[0])),
            count => Err(SetError::Ambiguous {
                index: name.to_string(),
                key,
                count,
            }),
        }
    }

    /// All elements matching `key` in the named index, possibly empty.
    ///
    /// One-pass lazy sequence; matching handles are resolved to elements
    /// as the caller iterates.
    pub fn where_eq(&self, name: &str, key: impl Into<IndexKey>) -> SetResult<Matches<'_, T>> {
        let pos = self.resolve(name)?;
        let key = key.into().fold(self.descriptors[pos].collation());
        Ok(self.matches(self.ids_for_key(pos, &key)?))
    }

    /// All elements whose collection-valued property contains `value`.
    ///
    /// Only valid against a membership index.
    pub fn where_contains(
        &self,
        name: &str,
        value: impl Into<IndexKey>,
    ) -> SetResult<Matches<'_, T>> {
        let pos = self.resolve(name)?;
        match &self.states[pos] {
            IndexState::Membership(index) => {
                Ok(self.matches(index.get(&value.into()).to_vec()))
            }
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// Elements whose range-index key lies within the bound, ascending.
    ///
    /// `start > end` yields an empty sequence, not an error.
    pub fn range(
        &self,
        name: &str,
        start: Option<IndexKey>,
        end: Option<IndexKey>,
        inclusive_start: bool,
        inclusive_end: bool,
    ) -> SetResult<Matches<'_, T>> {
        let pos = self.resolve(name)?;
        match &self.states[pos] {
            IndexState::Range(index) => Ok(self.matches(
                index
                    .range(start, end, inclusive_start, inclusive_end)
                    .collect(),
            )),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// Ascending walk of a range index: skip `skip` elements, yield up to
    /// `take`. Costs O(skip + take), not a full sort.
    pub fn order_by(&self, name: &str, skip: usize, take: usize) -> SetResult<Matches<'_, T>> {
        let pos = self.resolve(name)?;
        match &self.states[pos] {
            IndexState::Range(index) => Ok(self.matches(index.order_by(skip, take).collect())),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// Descending counterpart of [`order_by`](Self::order_by)
    pub fn order_by_desc(
        &self,
        name: &str,
        skip: usize,
        take: usize,
    ) -> SetResult<Matches<'_, T>> {
        let pos = self.resolve(name)?;
        match &self.states[pos] {
            IndexState::Range(index) => {
                Ok(self.matches(index.order_by_desc(skip, take).collect()))
            }
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// All elements whose extracted text starts with `prefix` under the
    /// index's collation. Cost is O(|prefix| + matches).
    pub fn starts_with(&self, name: &str, prefix: &str) -> SetResult<Matches<'_, T>> {
        let pos = self.resolve(name)?;
        match &self.states[pos] {
            IndexState::Prefix(index) => Ok(self.matches(index.starts_with(prefix))),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// Element with the greatest key in a range index
    pub fn max(&self, name: &str) -> SetResult<&T> {
        let pos = self.resolve(name)?;
        match &self.states[pos] {
            IndexState::Range(index) => index
                .max()
                .map(|id| self.element(id))
                .ok_or(SetError::EmptySet),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// Element with the least key in a range index
    pub fn min(&self, name: &str) -> SetResult<&T> {
        let pos = self.resolve(name)?;
        match &self.states[pos] {
            IndexState::Range(index) => index
                .min()
                .map(|id| self.element(id))
                .ok_or(SetError::EmptySet),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// Every element, bypassing all indices, in insertion order.
    ///
    /// The only sanctioned full scan; a mistyped index name is an
    /// `UnknownIndex` error, never a silent fallback to this.
    pub fn full_scan(&self) -> impl Iterator<Item = &T> {
        self.elements.values().map(|record| &record.element)
    }

    /// Element count
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when no elements are held
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The element a handle addresses, if it is still present
    pub fn get(&self, id: ElementId) -> Option<&T> {
        self.elements.get(&id).map(|record| &record.element)
    }

    /// True if the primary key is present. Always false without a
    /// primary-key declaration.
    pub fn contains_key(&self, key: &IndexKey) -> bool {
        self.primary
            .map(|pos| match &self.states[pos] {
                IndexState::Unique(index) => index.contains(key),
                _ => false,
            })
            .unwrap_or(false)
    }

    /// Registered index names, in declaration order
    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.name())
    }

    // ------------------------------------------------------------------
    // Consistency audits
    // ------------------------------------------------------------------

    /// Handles of every element in the primary store, ascending
    pub fn ids(&self) -> Vec<ElementId> {
        self.elements.keys().copied().collect()
    }

    /// Distinct handles a named index currently holds.
    ///
    /// After any completed mutation this equals
    /// [`expected_index_ids`](Self::expected_index_ids); tests use the
    /// pair to audit index/store agreement.
    pub fn audit_index(&self, name: &str) -> SetResult<Vec<ElementId>> {
        let pos = self.resolve(name)?;
        Ok(self.states[pos].audit_ids())
    }

    /// Handles a named index should hold given cached extraction: every
    /// element, except that a membership index omits elements whose
    /// extraction yielded no members (they live in no bucket).
    pub fn expected_index_ids(&self, name: &str) -> SetResult<Vec<ElementId>> {
        let pos = self.resolve(name)?;
        Ok(self
            .elements
            .iter()
            .filter(|(_, record)| match &record.cached[pos] {
                CachedKeys::One(_) => true,
                CachedKeys::Many(members) => !members.is_empty(),
            })
            .map(|(id, _)| *id)
            .collect())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn resolve(&self, name: &str) -> SetResult<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SetError::UnknownIndex(name.to_string()))
    }

    fn wrong_kind(&self, name: &str, state: &IndexState) -> SetError {
        SetError::WrongKind {
            index: name.to_string(),
            kind: state.kind().as_str(),
        }
    }

    /// Matching handles for an exact key, per index kind
    fn ids_for_key(&self, pos: usize, key: &IndexKey) -> SetResult<Vec<ElementId>> {
        match &self.states[pos] {
            IndexState::Unique(index) => Ok(index.get(key).into_iter().collect()),
            IndexState::Hash(index) => Ok(index.get(key).to_vec()),
            IndexState::Range(index) => Ok(index
                .range(Some(key.clone()), Some(key.clone()), true, true)
                .collect()),
            IndexState::Prefix(index) => match key.as_text() {
                Some(text) => Ok(index.exact(text)),
                None => Ok(Vec::new()),
            },
            other @ IndexState::Membership(_) => {
                Err(self.wrong_kind(self.descriptors[pos].name(), other))
            }
        }
    }

    fn matches(&self, ids: Vec<ElementId>) -> Matches<'_, T> {
        Matches {
            set: self,
            ids: ids.into_iter(),
        }
    }

    fn element(&self, id: ElementId) -> &T {
        match self.elements.get(&id) {
            Some(record) => &record.element,
            // I1: no index holds a handle absent from the primary store
            None => unreachable!("index holds handle {id} absent from primary store"),
        }
    }

    /// Whether a primary-key index was declared, and its name
    pub fn primary_index(&self) -> Option<&str> {
        self.primary.map(|pos| self.descriptors[pos].name())
    }

    /// Kind of the named index
    pub fn index_kind(&self, name: &str) -> SetResult<IndexKind> {
        Ok(self.states[self.resolve(name)?].kind())
    }
}

impl<T> std::fmt::Debug for IndexedSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedSet")
            .field("len", &self.len())
            .field("indices", &self.by_name.len())
            .finish_non_exhaustive()
    }
}

/// One-pass sequence of query matches.
///
/// Holds the matched handles and resolves each to its element only as the
/// caller advances, so a query result costs O(matches) handles up front
/// and nothing more.
#[derive(Debug)]
pub struct Matches<'a, T> {
    set: &'a IndexedSet<T>,
    ids: std::vec::IntoIter<ElementId>,
}

impl<'a, T> Iterator for Matches<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.ids.next().map(|id| self.set.element(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<T> ExactSizeIterator for Matches<'_, T> {}
