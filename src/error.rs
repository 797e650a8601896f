//! Error types for ArborKV
//!
//! Provides a unified error type for all operations.
//!
//! Errors coming out of the page store are rendered to strings on conversion
//! so that `ArborError` stays `Send` and can travel with query results across
//! the scan worker's channel.

use thiserror::Error;

/// Result type alias using ArborError
pub type Result<T> = std::result::Result<T, ArborError>;

/// Unified error type for ArborKV operations
#[derive(Debug, Error)]
pub enum ArborError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Page Store Errors
    // -------------------------------------------------------------------------
    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Table error: {0}")]
    Table(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Batch already committed or discarded")]
    BatchClosed,

    #[error("Datastore is closed")]
    Closed,

    #[error("Cannot close datastore: {0} batch(es) still open")]
    BatchOpen(usize),

    #[error("Query worker failed: {0}")]
    QueryWorker(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ArborError {
    /// True for the expected "key absent" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArborError::KeyNotFound)
    }
}

impl From<redb::DatabaseError> for ArborError {
    fn from(e: redb::DatabaseError) -> Self {
        ArborError::Database(e.to_string())
    }
}

impl From<redb::TransactionError> for ArborError {
    fn from(e: redb::TransactionError) -> Self {
        ArborError::Transaction(e.to_string())
    }
}

impl From<redb::TableError> for ArborError {
    fn from(e: redb::TableError) -> Self {
        ArborError::Table(e.to_string())
    }
}

impl From<redb::StorageError> for ArborError {
    fn from(e: redb::StorageError) -> Self {
        ArborError::Storage(e.to_string())
    }
}

impl From<redb::CommitError> for ArborError {
    fn from(e: redb::CommitError) -> Self {
        ArborError::Commit(e.to_string())
    }
}
