//! Query Module
//!
//! Declarative queries over the key-space and the machinery that runs them.
//!
//! ## Pipeline
//! ```text
//!   cursor (seek prefix) ──► filters (AND) ──► [sort by order chain] ──► offset ──► limit
//! ```
//!
//! ## Delivery Paths
//! - **Streaming**: no orders, or the first order is satisfied by cursor
//!   direction (`ByKey` / `ByKeyDescending`). Offset and limit are counted
//!   while scanning and the scan stops once the page is full.
//! - **Materializing**: any other order chain. Every filtered entry is
//!   buffered and stably sorted, then offset and limit cut the page.

mod filter;
mod order;
mod results;
mod scan;

use std::fmt;

use bytes::Bytes;

use crate::error::{ArborError, Result};
use crate::key::Key;

pub use filter::{CompareOp, Filter};
pub use order::Order;
pub use results::Results;

pub(crate) use scan::Scanner;

/// A key/value pair produced by a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub key: Key,

    /// `None` for keys-only queries
    pub value: Option<Bytes>,

    /// Value length in bytes (0 for keys-only queries)
    pub size: usize,
}

impl Entry {
    /// Value bytes, or an empty slice when the value was not loaded
    pub fn value_bytes(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

/// One item of a query's output: an entry plus an optional per-entry error
#[derive(Debug)]
pub struct QueryResult {
    pub entry: Entry,
    pub error: Option<ArborError>,
}

impl QueryResult {
    pub(crate) fn ok(entry: Entry) -> Self {
        Self { entry, error: None }
    }

    pub(crate) fn failed(entry: Entry, error: ArborError) -> Self {
        Self {
            entry,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Split into the entry or its error
    pub fn into_result(self) -> Result<Entry> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.entry),
        }
    }
}

/// An immutable description of what to read from the key-space
#[derive(Clone, Default)]
pub struct Query {
    /// Byte prefix every returned key must start with (empty = all keys)
    pub prefix: String,

    /// Skip loading values
    pub keys_only: bool,

    /// Keep an entry only if every filter accepts it
    pub filters: Vec<Filter>,

    /// Sort chain; the first non-equal comparison decides
    pub orders: Vec<Order>,

    /// Number of matching entries to skip
    pub offset: usize,

    /// Maximum number of entries to return (0 = unbounded)
    pub limit: usize,
}

impl Query {
    /// Create a new query builder
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// Query everything below a byte prefix
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Whether an entry passes every filter
    pub fn matches(&self, entry: &Entry) -> bool {
        self.filters.iter().all(|f| f.matches(entry))
    }

    /// Compare two entries with the order chain
    pub fn compare(&self, a: &Entry, b: &Entry) -> std::cmp::Ordering {
        order::compare_chain(&self.orders, a, b)
    }

    /// Whether the cursor can deliver entries already in the requested order
    pub(crate) fn streams(&self) -> bool {
        matches!(
            self.orders.first(),
            None | Some(Order::ByKey) | Some(Order::ByKeyDescending)
        )
    }

    /// Whether the cursor must walk backwards
    pub(crate) fn reversed(&self) -> bool {
        matches!(self.orders.first(), Some(Order::ByKeyDescending))
    }

    /// Run filter → sort → offset → limit over entries held in memory
    ///
    /// The prefix is not applied here; callers pass entries already drawn
    /// from the prefix range.
    pub fn apply(&self, entries: Vec<Entry>) -> Vec<Entry> {
        let mut kept: Vec<Entry> = entries.into_iter().filter(|e| self.matches(e)).collect();
        if !self.orders.is_empty() {
            kept.sort_by(|a, b| self.compare(a, b));
        }
        self.page(kept.into_iter()).collect()
    }

    /// Cut the `[offset, offset + limit)` window out of an ordered sequence
    pub(crate) fn page<I: Iterator>(&self, iter: I) -> impl Iterator<Item = I::Item> {
        let limit = if self.limit == 0 { usize::MAX } else { self.limit };
        iter.skip(self.offset).take(limit)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query({})", self)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keys_only {
            f.write_str("SELECT keys")?;
        } else {
            f.write_str("SELECT keys,vals")?;
        }
        if !self.prefix.is_empty() {
            write!(f, " FROM {:?}", self.prefix)?;
        }
        if !self.filters.is_empty() {
            f.write_str(" FILTER [")?;
            for (i, filter) in self.filters.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", filter)?;
            }
            f.write_str("]")?;
        }
        if !self.orders.is_empty() {
            f.write_str(" ORDER [")?;
            for (i, order) in self.orders.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", order)?;
            }
            f.write_str("]")?;
        }
        if self.offset > 0 {
            write!(f, " OFFSET {}", self.offset)?;
        }
        if self.limit > 0 {
            write!(f, " LIMIT {}", self.limit)?;
        }
        Ok(())
    }
}

/// Builder for Query
#[derive(Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Restrict results to keys starting with `prefix`
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.query.prefix = prefix.into();
        self
    }

    /// Return keys (and no values)
    pub fn keys_only(mut self, keys_only: bool) -> Self {
        self.query.keys_only = keys_only;
        self
    }

    /// Add a filter (all filters must pass)
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.filters.push(filter);
        self
    }

    /// Append a sort criterion
    pub fn order(mut self, order: Order) -> Self {
        self.query.orders.push(order);
        self
    }

    /// Skip this many filtered entries before the first result
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = offset;
        self
    }

    /// Cap the number of results (0 = unbounded)
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = limit;
        self
    }

    /// Finish building the query
    pub fn build(self) -> Query {
        self.query
    }
}
