//! Index declarations and the construction surface
//!
//! An `IndexDescriptor` is created during configuration and frozen at
//! `build()`; after that only the collection's contents change, never its
//! set of indices. Extractors are treated as deterministic and side-effect
//! free: the engine invokes each one exactly once per element, at Add time,
//! and caches the result (see `set::ElementRecord`).

use crate::errors::{BuildError, BuildResult};
use crate::key::{Collation, IndexKey};
use crate::set::IndexedSet;

/// Extractor producing one key per element
pub type KeyFn<T> = Box<dyn Fn(&T) -> IndexKey + Send + Sync>;

/// Extractor producing zero or more member keys per element
/// (collection-valued properties)
pub type KeysFn<T> = Box<dyn Fn(&T) -> Vec<IndexKey> + Send + Sync>;

/// The structure backing an index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// One key maps to exactly one element; duplicates rejected
    Unique,
    /// One key maps to an insertion-ordered group of elements
    Hash,
    /// Elements kept in ascending key order for interval and paging queries
    Range,
    /// Trie over extracted text for prefix queries
    Prefix,
    /// Member value maps to the elements whose collection contains it
    Membership,
}

impl IndexKind {
    /// Human-readable kind name, used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Unique => "unique",
            IndexKind::Hash => "hash",
            IndexKind::Range => "range",
            IndexKind::Prefix => "prefix",
            IndexKind::Membership => "membership",
        }
    }
}

/// Key extraction function, scalar or collection-valued
pub enum Extractor<T> {
    /// One key per element
    Scalar(KeyFn<T>),
    /// Zero or more member keys per element
    Multi(KeysFn<T>),
}

/// Keys one descriptor produced for one element at Add time.
///
/// Retained for the element's whole lifetime in the collection so that
/// Remove never re-derives keys from a possibly-mutated element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedKeys {
    /// Scalar descriptor output
    One(IndexKey),
    /// Membership descriptor output, de-duplicated, extraction order kept
    Many(Vec<IndexKey>),
}

/// Immutable declaration of one secondary index
pub struct IndexDescriptor<T> {
    name: String,
    kind: IndexKind,
    collation: Collation,
    extractor: Extractor<T>,
}

impl<T> IndexDescriptor<T> {
    fn new(
        name: impl Into<String>,
        kind: IndexKind,
        collation: Collation,
        extractor: Extractor<T>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            collation,
            extractor,
        }
    }

    /// The registry name identifying this index
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The structure kind backing this index
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// The text comparison rule for this index
    pub fn collation(&self) -> Collation {
        self.collation
    }

    /// Run the extractor against an element, folding keys under the
    /// configured collation. Membership output is de-duplicated so a
    /// bucket never holds the same element twice.
    pub fn extract(&self, element: &T) -> CachedKeys {
        match &self.extractor {
            Extractor::Scalar(f) => CachedKeys::One(f(element).fold(self.collation)),
            Extractor::Multi(f) => {
                let mut keys: Vec<IndexKey> = Vec::new();
                for key in f(element) {
                    let key = key.fold(self.collation);
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                CachedKeys::Many(keys)
            }
        }
    }
}

impl<T> std::fmt::Debug for IndexDescriptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("collation", &self.collation)
            .finish_non_exhaustive()
    }
}

/// Normalize an extractor expression into its default index name.
///
/// This is the stable naming rule shared with external tooling: the
/// expression text with all whitespace collapsed out, so formatting
/// differences never produce two names for one declaration.
pub fn derived_name(expr_text: &str) -> String {
    expr_text.split_whitespace().collect()
}

/// Derive the default index name from an extractor expression.
///
/// ```
/// use multidex::index_name;
/// struct User { age: i64 }
/// let name = index_name!(|u: &User| u.age);
/// assert_eq!(name, index_name!(|u: &User|  u.age));
/// ```
#[macro_export]
macro_rules! index_name {
    ($extractor:expr) => {
        $crate::descriptor::derived_name(stringify!($extractor))
    };
}

/// Collects index declarations and freezes them into an [`IndexedSet`].
///
/// At most one `primary_key` declaration is accepted; it also registers a
/// queryable unique index under its name. Duplicate index names are
/// rejected at `build()`, not at first query.
pub struct IndexedSetBuilder<T> {
    descriptors: Vec<IndexDescriptor<T>>,
    primary: Option<usize>,
}

impl<T> Default for IndexedSetBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IndexedSetBuilder<T> {
    /// Creates a builder with no declarations
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            primary: None,
        }
    }

    /// Declare the primary key. Registers a unique index under `name`.
    pub fn primary_key<F>(mut self, name: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&T) -> IndexKey + Send + Sync + 'static,
    {
        // Recorded position; a second call is rejected at build()
        if self.primary.is_none() {
            self.primary = Some(self.descriptors.len());
        } else {
            self.primary = Some(usize::MAX);
        }
        self.descriptors.push(IndexDescriptor::new(
            name,
            IndexKind::Unique,
            Collation::Binary,
            Extractor::Scalar(Box::new(extractor)),
        ));
        self
    }

    /// Declare a unique secondary index
    pub fn unique<F>(mut self, name: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&T) -> IndexKey + Send + Sync + 'static,
    {
        self.descriptors.push(IndexDescriptor::new(
            name,
            IndexKind::Unique,
            Collation::Binary,
            Extractor::Scalar(Box::new(extractor)),
        ));
        self
    }

    /// Declare a non-unique hash index
    pub fn hash<F>(mut self, name: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&T) -> IndexKey + Send + Sync + 'static,
    {
        self.descriptors.push(IndexDescriptor::new(
            name,
            IndexKind::Hash,
            Collation::Binary,
            Extractor::Scalar(Box::new(extractor)),
        ));
        self
    }

    /// Declare a sorted range index
    pub fn range<F>(mut self, name: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&T) -> IndexKey + Send + Sync + 'static,
    {
        self.descriptors.push(IndexDescriptor::new(
            name,
            IndexKind::Range,
            Collation::Binary,
            Extractor::Scalar(Box::new(extractor)),
        ));
        self
    }

    /// Declare a prefix trie index with binary collation
    pub fn prefix<F>(self, name: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&T) -> IndexKey + Send + Sync + 'static,
    {
        self.prefix_with(name, Collation::Binary, extractor)
    }

    /// Declare a prefix trie index with an explicit collation
    pub fn prefix_with<F>(
        mut self,
        name: impl Into<String>,
        collation: Collation,
        extractor: F,
    ) -> Self
    where
        F: Fn(&T) -> IndexKey + Send + Sync + 'static,
    {
        self.descriptors.push(IndexDescriptor::new(
            name,
            IndexKind::Prefix,
            collation,
            Extractor::Scalar(Box::new(extractor)),
        ));
        self
    }

    /// Declare a membership (inverted) index over a collection-valued
    /// property. The extractor yields the member values explicitly; no
    /// element-type inference is attempted.
    pub fn membership<F>(mut self, name: impl Into<String>, extractor: F) -> Self
    where
        F: Fn(&T) -> Vec<IndexKey> + Send + Sync + 'static,
    {
        self.descriptors.push(IndexDescriptor::new(
            name,
            IndexKind::Membership,
            Collation::Binary,
            Extractor::Multi(Box::new(extractor)),
        ));
        self
    }

    /// Freeze the registry and return the collection.
    ///
    /// Fails with `DuplicateIndex` if two declarations share a name and
    /// `DuplicatePrimary` if `primary_key` was declared twice.
    pub fn build(self) -> BuildResult<IndexedSet<T>> {
        if self.primary == Some(usize::MAX) {
            return Err(BuildError::DuplicatePrimary);
        }
        for (i, d) in self.descriptors.iter().enumerate() {
            if self.descriptors[..i].iter().any(|o| o.name() == d.name()) {
                return Err(BuildError::DuplicateIndex(d.name().to_string()));
            }
        }
        Ok(IndexedSet::from_parts(self.descriptors, self.primary))
    }

    /// Freeze the registry and return the thread-safe collection
    pub fn build_concurrent(self) -> BuildResult<crate::concurrent::ConcurrentIndexedSet<T>>
    where
        T: Clone,
    {
        Ok(crate::concurrent::ConcurrentIndexedSet::from_set(
            self.build()?,
        ))
    }
}
