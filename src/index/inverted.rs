//! Membership (inverted) index
//!
//! For a collection-valued property, maps each member value to the bucket
//! of elements whose collection contains it. A "contains" query is a single
//! map lookup, O(matches) rather than O(n × collection-size). Removal is
//! driven by the member list cached at Add time; the element's live
//! collection is never consulted again.

use std::collections::HashMap;

use crate::key::IndexKey;
use crate::set::ElementId;

/// Member value → elements whose collection contains it
#[derive(Debug, Default)]
pub struct MembershipIndex {
    buckets: HashMap<IndexKey, Vec<ElementId>>,
}

impl MembershipIndex {
    /// Creates an empty membership index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element to every member value's bucket.
    ///
    /// `members` has been de-duplicated at extraction time, so no bucket
    /// receives the same element twice.
    pub fn insert(&mut self, members: &[IndexKey], id: ElementId) {
        for member in members {
            self.buckets.entry(member.clone()).or_default().push(id);
        }
    }

    /// Remove an element from every bucket its cached members name.
    ///
    /// Empty buckets are dropped so the map never accumulates dead keys.
    pub fn remove(&mut self, members: &[IndexKey], id: ElementId) {
        for member in members {
            if let Some(bucket) = self.buckets.get_mut(member) {
                bucket.retain(|held| *held != id);
                if bucket.is_empty() {
                    self.buckets.remove(member);
                }
            }
        }
    }

    /// All elements whose collection contains `member`, in insertion order
    pub fn get(&self, member: &IndexKey) -> &[ElementId] {
        self.buckets.get(member).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// Number of distinct member values
    pub fn member_count(&self) -> usize {
        self.buckets.len()
    }

    /// All element handles across all buckets, duplicates included
    /// (consistency audits de-duplicate)
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.buckets.values().flatten().copied()
    }
}
