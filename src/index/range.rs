//! Sorted range index
//!
//! Backed by a `BTreeMap` keyed by `(IndexKey, ElementId)` so elements with
//! equal keys still have a total order: ascending key, then insertion order
//! (handles are assigned monotonically and never reused). This is what makes
//! `order_by(skip, take)` an O(skip + take) walk instead of a full sort.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::key::IndexKey;
use crate::set::ElementId;

/// Maintains elements ordered by extracted key
#[derive(Debug, Default)]
pub struct RangeIndex {
    tree: BTreeMap<(IndexKey, ElementId), ElementId>,
}

impl RangeIndex {
    /// Creates an empty range index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element under its key
    pub fn insert(&mut self, key: IndexKey, id: ElementId) {
        self.tree.insert((key, id), id);
    }

    /// Remove an element from under its key
    pub fn remove(&mut self, key: IndexKey, id: ElementId) {
        self.tree.remove(&(key, id));
    }

    /// Elements whose key lies within the bound, in ascending key order.
    ///
    /// An inverted interval (start > end) selects nothing; that is an empty
    /// result, not an error.
    pub fn range(
        &self,
        start: Option<IndexKey>,
        end: Option<IndexKey>,
        inclusive_start: bool,
        inclusive_end: bool,
    ) -> impl Iterator<Item = ElementId> + '_ {
        // Composite bounds: an inclusive start admits every tie-break for
        // that key, an exclusive start skips past all of them.
        let low: Bound<(IndexKey, ElementId)> = match start {
            None => Bound::Unbounded,
            Some(key) if inclusive_start => Bound::Included((key, ElementId(0))),
            Some(key) => Bound::Excluded((key, ElementId(u64::MAX))),
        };
        let high: Bound<(IndexKey, ElementId)> = match end {
            None => Bound::Unbounded,
            Some(key) if inclusive_end => Bound::Included((key, ElementId(u64::MAX))),
            Some(key) => Bound::Excluded((key, ElementId(0))),
        };

        // BTreeMap panics on inverted bounds; an inverted interval is
        // defined here as empty instead.
        let empty = Self::inverted(&low, &high);
        let entries = if empty {
            self.tree.range(..)
        } else {
            self.tree.range((low, high))
        };
        entries.take(if empty { 0 } else { usize::MAX }).map(|(_, id)| *id)
    }

    fn inverted(low: &Bound<(IndexKey, ElementId)>, high: &Bound<(IndexKey, ElementId)>) -> bool {
        match (low, high) {
            (Bound::Included(a) | Bound::Excluded(a), Bound::Included(b) | Bound::Excluded(b)) => {
                a > b
            }
            _ => false,
        }
    }

    /// Ascending walk, skipping `skip` entries and yielding up to `take`
    pub fn order_by(&self, skip: usize, take: usize) -> impl Iterator<Item = ElementId> + '_ {
        self.tree.values().copied().skip(skip).take(take)
    }

    /// Descending walk, skipping `skip` entries and yielding up to `take`
    pub fn order_by_desc(&self, skip: usize, take: usize) -> impl Iterator<Item = ElementId> + '_ {
        self.tree.values().rev().copied().skip(skip).take(take)
    }

    /// Element with the greatest key (latest insertion among ties)
    pub fn max(&self) -> Option<ElementId> {
        self.tree.values().next_back().copied()
    }

    /// Element with the least key (earliest insertion among ties)
    pub fn min(&self) -> Option<ElementId> {
        self.tree.values().next().copied()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// All element handles in ascending order (consistency audits)
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.tree.values().copied()
    }
}
