//! Query orders

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::Entry;

/// A sort criterion
#[derive(Clone)]
pub enum Order {
    /// Ascending key bytes (the cursor's natural order)
    ByKey,

    /// Descending key bytes
    ByKeyDescending,

    /// Ascending value bytes
    ByValue,

    /// Descending value bytes
    ByValueDescending,

    /// Arbitrary comparator
    Custom(Arc<dyn Fn(&Entry, &Entry) -> Ordering + Send + Sync>),
}

impl Order {
    /// Wrap a closure as an order
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Entry, &Entry) -> Ordering + Send + Sync + 'static,
    {
        Order::Custom(Arc::new(f))
    }

    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            Order::ByKey => a.key.as_bytes().cmp(b.key.as_bytes()),
            Order::ByKeyDescending => b.key.as_bytes().cmp(a.key.as_bytes()),
            Order::ByValue => a.value_bytes().cmp(b.value_bytes()),
            Order::ByValueDescending => b.value_bytes().cmp(a.value_bytes()),
            Order::Custom(f) => f(a, b),
        }
    }
}

/// First non-equal comparison across the chain wins
pub(crate) fn compare_chain(orders: &[Order], a: &Entry, b: &Entry) -> Ordering {
    orders
        .iter()
        .map(|o| o.compare(a, b))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::ByKey => f.write_str("KEY"),
            Order::ByKeyDescending => f.write_str("desc(KEY)"),
            Order::ByValue => f.write_str("VALUE"),
            Order::ByValueDescending => f.write_str("desc(VALUE)"),
            Order::Custom(_) => f.write_str("CUSTOM"),
        }
    }
}

impl fmt::Debug for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order({})", self)
    }
}
