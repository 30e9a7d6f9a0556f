//! Engine Invariant Tests
//!
//! Tests for the core guarantees:
//! - Round-trip: an added element is reachable by primary key and full scan
//! - Atomic rejection: a conflicting Add changes nothing anywhere
//! - Query/full-scan equivalence for range, paging, prefix, membership
//! - Clear empties every structure

use multidex::{Collation, ElementId, IndexKey, IndexedSet, IndexedSetBuilder, SetError};
use proptest::prelude::*;

// =============================================================================
// Fixture
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Member {
    id: i64,
    handle: String,
    guild: String,
    level: i64,
    roles: Vec<String>,
}

fn member(id: i64, handle: &str, guild: &str, level: i64, roles: &[&str]) -> Member {
    Member {
        id,
        handle: handle.to_string(),
        guild: guild.to_string(),
        level,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

const INDEX_NAMES: [&str; 5] = ["id", "guild", "level", "handle", "roles"];

fn build() -> IndexedSet<Member> {
    IndexedSetBuilder::new()
        .primary_key("id", |m: &Member| IndexKey::from_int(m.id))
        .hash("guild", |m: &Member| IndexKey::from_str(&m.guild))
        .range("level", |m: &Member| IndexKey::from_int(m.level))
        .prefix_with("handle", Collation::CaseInsensitive, |m: &Member| {
            IndexKey::from_str(&m.handle)
        })
        .membership("roles", |m: &Member| {
            m.roles.iter().map(IndexKey::from_str).collect()
        })
        .build()
        .unwrap()
}

fn seed() -> IndexedSet<Member> {
    let mut set = build();
    set.add(member(1, "astra", "north", 12, &["healer", "scout"]))
        .unwrap();
    set.add(member(2, "aster", "north", 30, &["tank"])).unwrap();
    set.add(member(3, "brook", "south", 12, &["scout"])).unwrap();
    set.add(member(4, "cedar", "south", 45, &[])).unwrap();
    set
}

/// Every index's distinct handle set agrees with the primary store's
/// cached extraction (a membership index legitimately omits elements whose
/// extraction yielded no members).
fn assert_consistent(set: &IndexedSet<Member>) {
    for name in INDEX_NAMES {
        assert_eq!(
            set.audit_index(name).unwrap(),
            set.expected_index_ids(name).unwrap(),
            "index '{}'",
            name
        );
    }
}

// =============================================================================
// Round-trip
// =============================================================================

/// Every added element comes back by primary key, exactly once in full scan.
#[test]
fn test_round_trip() {
    let set = seed();
    for id in 1..=4i64 {
        let found = set.single("id", id).unwrap();
        assert_eq!(found.id, id);
        assert_eq!(set.full_scan().filter(|m| m.id == id).count(), 1);
    }
    assert_consistent(&set);
}

// =============================================================================
// Atomic rejection
// =============================================================================

/// A primary-key conflict leaves count and every index untouched.
#[test]
fn test_conflict_changes_nothing() {
    let mut set = seed();
    let before: Vec<Member> = set.full_scan().cloned().collect();
    let audits: Vec<Vec<ElementId>> = INDEX_NAMES
        .iter()
        .map(|n| set.audit_index(n).unwrap())
        .collect();

    let err = set
        .add(member(2, "zonal", "west", 99, &["tank", "healer"]))
        .unwrap_err();
    assert!(matches!(err, SetError::Conflict { ref index, .. } if index == "id"));

    let after: Vec<Member> = set.full_scan().cloned().collect();
    assert_eq!(before, after);
    for (name, audit) in INDEX_NAMES.iter().zip(audits) {
        assert_eq!(set.audit_index(name).unwrap(), audit);
    }
    // The rejected element is reachable through nothing
    assert_eq!(set.where_eq("guild", "west").unwrap().count(), 0);
    assert_eq!(set.starts_with("handle", "zon").unwrap().count(), 0);
}

// =============================================================================
// Query / full-scan equivalence
// =============================================================================

/// Range results equal the filtered full scan, in ascending key order.
#[test]
fn test_range_matches_full_scan() {
    let set = seed();
    let got: Vec<i64> = set
        .range(
            "level",
            Some(IndexKey::from_int(12)),
            Some(IndexKey::from_int(30)),
            true,
            true,
        )
        .unwrap()
        .map(|m| m.level)
        .collect();

    let mut want: Vec<i64> = set
        .full_scan()
        .filter(|m| (12..=30).contains(&m.level))
        .map(|m| m.level)
        .collect();
    want.sort();
    assert_eq!(got, want);
}

/// Prefix results equal the filtered full scan as sets.
#[test]
fn test_prefix_matches_full_scan() {
    let set = seed();
    let mut got: Vec<i64> = set
        .starts_with("handle", "ast")
        .unwrap()
        .map(|m| m.id)
        .collect();
    got.sort();

    let mut want: Vec<i64> = set
        .full_scan()
        .filter(|m| m.handle.to_lowercase().starts_with("ast"))
        .map(|m| m.id)
        .collect();
    want.sort();
    assert_eq!(got, want);
    assert_eq!(got, vec![1, 2]);
}

/// Membership results equal the filtered full scan as sets.
#[test]
fn test_membership_matches_full_scan() {
    let set = seed();
    let mut got: Vec<i64> = set
        .where_contains("roles", "scout")
        .unwrap()
        .map(|m| m.id)
        .collect();
    got.sort();

    let mut want: Vec<i64> = set
        .full_scan()
        .filter(|m| m.roles.iter().any(|r| r == "scout"))
        .map(|m| m.id)
        .collect();
    want.sort();
    assert_eq!(got, want);
}

// =============================================================================
// Clear
// =============================================================================

/// After clear, every query is empty or EmptySet and count is zero.
#[test]
fn test_clear_empties_every_query() {
    let mut set = seed();
    set.clear();

    assert_eq!(set.len(), 0);
    assert_eq!(set.full_scan().count(), 0);
    assert_eq!(set.where_eq("guild", "north").unwrap().count(), 0);
    assert_eq!(set.where_contains("roles", "scout").unwrap().count(), 0);
    assert_eq!(set.starts_with("handle", "a").unwrap().count(), 0);
    assert_eq!(set.max("level").unwrap_err(), SetError::EmptySet);
    assert_eq!(set.min("level").unwrap_err(), SetError::EmptySet);
    assert_consistent(&set);
}

// =============================================================================
// Interleaved add/remove keeps structures in lockstep
// =============================================================================

/// Removals by key and by handle both leave all indices agreeing with the
/// primary store.
#[test]
fn test_interleaved_mutations_stay_consistent() {
    let mut set = seed();

    set.remove(&IndexKey::from_int(2)).unwrap();
    assert_consistent(&set);

    let id = set
        .add(member(5, "delta", "north", 30, &["tank", "scout"]))
        .unwrap();
    assert_consistent(&set);

    set.remove_id(id).unwrap();
    assert_consistent(&set);

    assert_eq!(set.where_contains("roles", "tank").unwrap().count(), 0);
    assert_eq!(set.where_eq("guild", "north").unwrap().count(), 1);
}

// =============================================================================
// Property tests
// =============================================================================

/// One generated element: score payloads drive a range index.
fn entries() -> impl Strategy<Value = Vec<(i64, i64)>> {
    // (unique-ish id, score); ids deduplicated below
    prop::collection::vec((0i64..1000, -500i64..500), 0..60)
}

fn build_scored(pairs: &[(i64, i64)]) -> IndexedSet<(i64, i64)> {
    let mut set = IndexedSetBuilder::new()
        .primary_key("id", |e: &(i64, i64)| IndexKey::from_int(e.0))
        .range("score", |e: &(i64, i64)| IndexKey::from_int(e.1))
        .build()
        .unwrap();
    for pair in pairs {
        // Duplicate generated ids are legitimate conflicts; skip them
        let _ = set.add(*pair);
    }
    set
}

proptest! {
    /// Range equals the filtered, sorted full scan for arbitrary bounds.
    #[test]
    fn prop_range_equals_filtered_scan(
        pairs in entries(),
        start in -600i64..600,
        end in -600i64..600,
        incl_start: bool,
        incl_end: bool,
    ) {
        let set = build_scored(&pairs);
        let got: Vec<i64> = set
            .range(
                "score",
                Some(IndexKey::from_int(start)),
                Some(IndexKey::from_int(end)),
                incl_start,
                incl_end,
            )
            .unwrap()
            .map(|e| e.1)
            .collect();

        let mut want: Vec<i64> = set
            .full_scan()
            .map(|e| e.1)
            .filter(|s| {
                let lo = if incl_start { *s >= start } else { *s > start };
                let hi = if incl_end { *s <= end } else { *s < end };
                lo && hi
            })
            .collect();
        want.sort();
        prop_assert_eq!(got, want);
    }

    /// Descending paging equals sort-descending + skip + take.
    #[test]
    fn prop_paging_equals_sorted_scan(
        pairs in entries(),
        skip in 0usize..80,
        take in 0usize..80,
    ) {
        let set = build_scored(&pairs);
        let got: Vec<i64> = set
            .order_by_desc("score", skip, take)
            .unwrap()
            .map(|e| e.1)
            .collect();

        let mut want: Vec<i64> = set.full_scan().map(|e| e.1).collect();
        want.sort();
        want.reverse();
        let want: Vec<i64> = want.into_iter().skip(skip).take(take).collect();
        prop_assert_eq!(got, want);
    }

    /// Prefix query equals the filtered full scan for generated words.
    #[test]
    fn prop_prefix_equals_filtered_scan(
        words in prop::collection::vec("[a-d]{0,6}", 0..40),
        prefix in "[a-d]{0,3}",
    ) {
        let mut set = IndexedSetBuilder::new()
            .prefix("word", |w: &(usize, String)| IndexKey::from_str(&w.1))
            .build()
            .unwrap();
        for (i, w) in words.iter().enumerate() {
            set.add((i, w.clone())).unwrap();
        }

        let mut got: Vec<usize> = set
            .starts_with("word", &prefix)
            .unwrap()
            .map(|w| w.0)
            .collect();
        got.sort();

        let mut want: Vec<usize> = set
            .full_scan()
            .filter(|w| w.1.starts_with(&prefix))
            .map(|w| w.0)
            .collect();
        want.sort();
        prop_assert_eq!(got, want);
    }
}
