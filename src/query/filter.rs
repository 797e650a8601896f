//! Query filters
//!
//! Predicates over entries. A query keeps an entry only when every filter
//! accepts it.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::Entry;

/// Comparison applied by the compare filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl CompareOp {
    /// Whether `ordering` (entry compared against the operand) satisfies the op
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Equal => ordering == Ordering::Equal,
            CompareOp::NotEqual => ordering != Ordering::Equal,
            CompareOp::GreaterThan => ordering == Ordering::Greater,
            CompareOp::GreaterThanOrEqual => ordering != Ordering::Less,
            CompareOp::LessThan => ordering == Ordering::Less,
            CompareOp::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Equal => "==",
            CompareOp::NotEqual => "!=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEqual => ">=",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEqual => "<=",
        }
    }
}

/// A predicate over entries
#[derive(Clone)]
pub enum Filter {
    /// Compare the key's bytes against a fixed key
    KeyCompare(CompareOp, String),

    /// Keep keys starting with the given bytes
    KeyPrefix(String),

    /// Compare the value's bytes against fixed bytes
    ///
    /// Entries from keys-only queries compare as an empty value.
    ValueCompare(CompareOp, Vec<u8>),

    /// Arbitrary predicate
    Custom(Arc<dyn Fn(&Entry) -> bool + Send + Sync>),
}

impl Filter {
    /// Wrap a closure as a filter
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        Filter::Custom(Arc::new(f))
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Filter::KeyCompare(op, key) => op.holds(entry.key.as_bytes().cmp(key.as_bytes())),
            Filter::KeyPrefix(prefix) => entry.key.as_bytes().starts_with(prefix.as_bytes()),
            Filter::ValueCompare(op, value) => op.holds(entry.value_bytes().cmp(value.as_slice())),
            Filter::Custom(f) => f(entry),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::KeyCompare(op, key) => write!(f, "KEY {} {:?}", op.symbol(), key),
            Filter::KeyPrefix(prefix) => write!(f, "PREFIX({:?})", prefix),
            Filter::ValueCompare(op, value) => write!(f, "VALUE {} {:?}", op.symbol(), value),
            Filter::Custom(_) => f.write_str("CUSTOM"),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self)
    }
}
