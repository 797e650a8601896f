//! # ArborKV
//!
//! An embedded key-value datastore with:
//! - CRUD plus existence and size lookups on path-like keys
//! - Prefix queries with filters, ordering, offset and limit
//! - Atomic batches over a single write transaction
//! - Single-writer/multi-reader concurrency with snapshot-isolated reads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Datastore                             │
//! │        put / delete / get / has / get_size / sync            │
//! └───────┬──────────────────────┬──────────────────────┬───────┘
//!         │                      │                      │
//!         ▼                      ▼                      ▼
//!  ┌─────────────┐       ┌──────────────┐       ┌─────────────┐
//!  │ short txns  │       │ Query worker │       │    Batch    │
//!  │ (one per op)│       │ (read snap)  │       │ (write txn) │
//!  └──────┬──────┘       └──────┬───────┘       └──────┬──────┘
//!         │                     │ bounded channel      │
//!         │                     ▼                      │
//!         │              ┌──────────────┐              │
//!         │              │   Results    │              │
//!         │              └──────────────┘              │
//!         ▼                                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │        redb page store (one file, copy-on-write B-tree)      │
//! │                   bucket = one table                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod key;
pub mod query;
pub mod batch;
pub mod datastore;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ArborError, Result};
pub use config::{Config, SyncStrategy};
pub use key::Key;
pub use query::{CompareOp, Entry, Filter, Order, Query, QueryBuilder, QueryResult, Results};
pub use batch::Batch;
pub use datastore::Datastore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ArborKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
