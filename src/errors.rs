//! # Errors
//!
//! Error types for collection construction and for queries/mutations.
//!
//! Every failure is an explicit result. Zero matches from a `where_*` query
//! is an empty sequence, never an error; `single` is the operation that
//! turns "zero" and "more than one" into failures.

use thiserror::Error;

use crate::key::IndexKey;

/// Result type for builder construction
pub type BuildResult<T> = Result<T, BuildError>;

/// Result type for collection operations
pub type SetResult<T> = Result<T, SetError>;

/// Errors raised while freezing the index registry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Two declarations share one index name
    #[error("Index '{0}' declared more than once")]
    DuplicateIndex(String),

    /// A second primary-key declaration
    #[error("Primary key declared more than once")]
    DuplicatePrimary,
}

/// Errors raised by queries and mutations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SetError {
    /// Add would violate primary or unique-index key uniqueness
    #[error("Key '{key}' already present in index '{index}'")]
    Conflict { index: String, key: IndexKey },

    /// Remove of an absent element, or `single` with zero matches
    #[error("No matching element")]
    NotFound,

    /// `single` matched more than one element
    #[error("Index '{index}' holds {count} elements for key '{key}', expected exactly one")]
    Ambiguous {
        index: String,
        key: IndexKey,
        count: usize,
    },

    /// Query named an index the registry does not hold
    #[error("Unknown index '{0}'")]
    UnknownIndex(String),

    /// `max`/`min` over an empty collection
    #[error("Collection is empty")]
    EmptySet,

    /// Operation routed through a kind of index that cannot serve it,
    /// e.g. a range query against a hash index
    #[error("Index '{index}' is a {kind} index and cannot serve this query")]
    WrongKind {
        index: String,
        kind: &'static str,
    },

    /// A writer panicked while holding the lock
    #[error("Collection lock poisoned by a panicked writer")]
    Poisoned,
}
