//! Index key values
//!
//! Every index structure is keyed by `IndexKey`, a serialized property value.
//! Ordering is deterministic across variants: Bool < Int < Float < Str.

use std::fmt;

/// Index key representing an extracted property value.
///
/// Supports Bool, Int (i64), Float (f64 bits for ordering), Str.
/// Ordering is deterministic: Bool < Int < Float < Str.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// String value
    Str(String),
}

impl IndexKey {
    /// Create a key from a boolean
    pub fn from_bool(v: bool) -> Self {
        IndexKey::Bool(v)
    }

    /// Create a key from an integer
    pub fn from_int(v: i64) -> Self {
        IndexKey::Int(v)
    }

    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        let bits = v.to_bits();
        // Negative: flip all bits. Positive: flip sign bit.
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Float(ordered)
    }

    /// Create a key from a string
    pub fn from_str(v: impl Into<String>) -> Self {
        IndexKey::Str(v.into())
    }

    /// Returns the string payload, if this key is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            IndexKey::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Fold this key under a collation.
    ///
    /// Only text keys are affected; other variants pass through.
    pub fn fold(self, collation: Collation) -> Self {
        match (collation, self) {
            (Collation::CaseInsensitive, IndexKey::Str(s)) => IndexKey::Str(s.to_lowercase()),
            (_, key) => key,
        }
    }
}

impl From<bool> for IndexKey {
    fn from(v: bool) -> Self {
        IndexKey::from_bool(v)
    }
}

impl From<i64> for IndexKey {
    fn from(v: i64) -> Self {
        IndexKey::from_int(v)
    }
}

impl From<i32> for IndexKey {
    fn from(v: i32) -> Self {
        IndexKey::from_int(v as i64)
    }
}

impl From<u32> for IndexKey {
    fn from(v: u32) -> Self {
        IndexKey::from_int(v as i64)
    }
}

impl From<f64> for IndexKey {
    fn from(v: f64) -> Self {
        IndexKey::from_float(v)
    }
}

impl From<&str> for IndexKey {
    fn from(v: &str) -> Self {
        IndexKey::from_str(v)
    }
}

impl From<String> for IndexKey {
    fn from(v: String) -> Self {
        IndexKey::Str(v)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Bool(v) => write!(f, "{}", v),
            IndexKey::Int(v) => write!(f, "{}", v),
            IndexKey::Float(bits) => {
                // Undo the total-order transform for display
                let raw = if (bits >> 63) == 0 {
                    !bits
                } else {
                    bits ^ (1 << 63)
                };
                write!(f, "{}", f64::from_bits(raw))
            }
            IndexKey::Str(v) => write!(f, "{}", v),
        }
    }
}

/// Text comparison rule for an index.
///
/// A descriptor's collation is applied once at insertion (to the stored key)
/// and once per query (to the probe key), so both sides always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Collation {
    /// Bytewise comparison, no folding
    #[default]
    Binary,
    /// Unicode lowercase folding before comparison
    CaseInsensitive,
}

impl Collation {
    /// Fold a text fragment under this collation
    pub fn fold_text(&self, text: &str) -> String {
        match self {
            Collation::Binary => text.to_string(),
            Collation::CaseInsensitive => text.to_lowercase(),
        }
    }
}
