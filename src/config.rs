//! Configuration for ArborKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{ArborError, Result};

/// Name of the key-space used when none is configured
pub const DEFAULT_BUCKET: &str = "datastore";

/// Main configuration for an ArborKV datastore
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the single store file (created if missing)
    pub path: PathBuf,

    /// Name of the key-space (table) inside the store file
    pub bucket: String,

    /// Page cache size handed to the page store (in bytes)
    pub cache_size: usize,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// When committed writes reach durable storage
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Query Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the channel between a scan and its consumer
    pub query_buffer: usize,
}

/// Durability strategy for committed transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync as part of every commit (safest, slowest)
    EveryCommit,

    /// Commits are deferred; data becomes durable on `sync` or `close`
    Manual,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./arborkv.redb"),
            bucket: DEFAULT_BUCKET.to_string(),
            cache_size: 64 * 1024 * 1024, // 64 MB
            sync_strategy: SyncStrategy::EveryCommit,
            query_buffer: 128,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the datastore cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(ArborError::Config("bucket name must not be empty".to_string()));
        }
        if self.path.as_os_str().is_empty() {
            return Err(ArborError::Config("store path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the store file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the key-space name
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.bucket = bucket.into();
        self
    }

    /// Set the page cache size (in bytes)
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.config.cache_size = bytes;
        self
    }

    /// Set the durability strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the capacity of the query result channel
    pub fn query_buffer(mut self, capacity: usize) -> Self {
        self.config.query_buffer = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
