//! Datastore Module
//!
//! The store handle and its single-key operations.
//!
//! ## Responsibilities
//! - Open the store file and create the bucket (idempotent)
//! - Wrap every single-key operation in its own short transaction
//! - Hand out read snapshots to queries and write transactions to batches
//! - Flush deferred commits on `sync` and `close`

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use redb::{Builder, Database, Durability, ReadOnlyTable, TableDefinition};

use crate::batch::Batch;
use crate::config::{Config, SyncStrategy};
use crate::error::{ArborError, Result};
use crate::key::Key;
use crate::query::{Query, Results};

/// Table layout of a bucket: raw key bytes to raw value bytes
pub(crate) type BucketDef<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

/// A bucket opened inside a read snapshot
pub(crate) type Bucket = ReadOnlyTable<&'static [u8], &'static [u8]>;

pub(crate) fn bucket(name: &str) -> BucketDef<'_> {
    TableDefinition::new(name)
}

/// The key-value datastore
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/batch/sync): each takes the page store's write
///   transaction, which admits one writer at a time. Others block until the
///   active writer commits or rolls back.
/// - **Reads** (get/has/get_size/query): each takes a read snapshot. Readers
///   never wait for the writer and never see its uncommitted changes.
///
/// The handle itself is immutable apart from `close`, and can be shared
/// across threads behind an `Arc`.
pub struct Datastore {
    /// Datastore configuration (bucket name, durability, buffers)
    config: Config,

    /// Open page store; `None` once closed
    db: RwLock<Option<Arc<Database>>>,

    /// Batches started and not yet committed, discarded or dropped
    open_batches: AtomicUsize,
}

impl Datastore {
    /// Open or create a datastore with the given config
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Create the parent directory of the store file
    /// 3. Open/create the store file
    /// 4. Create the bucket if it does not exist yet
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let db = Builder::new()
            .set_cache_size(config.cache_size)
            .create(&config.path)?;

        let txn = db.begin_write()?;
        txn.open_table(bucket(&config.bucket))?;
        txn.commit()?;

        tracing::debug!(
            "Opened datastore {} (bucket={}, sync={:?})",
            config.path.display(),
            config.bucket,
            config.sync_strategy
        );

        Ok(Self {
            config,
            db: RwLock::new(Some(Arc::new(db))),
            open_batches: AtomicUsize::new(0),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified store file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().path(path).build())
    }

    // =========================================================================
    // Single-Key Operations
    // =========================================================================

    /// Store a value, replacing any previous one
    pub fn put(&self, key: &Key, value: &[u8]) -> Result<()> {
        let db = self.database()?;
        let mut txn = db.begin_write()?;
        txn.set_durability(self.durability());
        {
            let mut table = txn.open_table(bucket(&self.config.bucket))?;
            table.insert(key.as_bytes(), value)?;
        }
        txn.commit()?;

        tracing::trace!("put {} ({} bytes)", key, value.len());
        Ok(())
    }

    /// Remove a key; removing an absent key is not an error
    pub fn delete(&self, key: &Key) -> Result<()> {
        let db = self.database()?;
        let mut txn = db.begin_write()?;
        txn.set_durability(self.durability());
        {
            let mut table = txn.open_table(bucket(&self.config.bucket))?;
            table.remove(key.as_bytes())?;
        }
        txn.commit()?;

        tracing::trace!("delete {}", key);
        Ok(())
    }

    /// Fetch a value
    ///
    /// Returns `ArborError::KeyNotFound` when the key is absent; an empty
    /// value is returned as an empty vector.
    pub fn get(&self, key: &Key) -> Result<Vec<u8>> {
        let db = self.database()?;
        let txn = db.begin_read()?;
        let table = txn.open_table(bucket(&self.config.bucket))?;

        // Copy out before the snapshot goes away
        let value = table
            .get(key.as_bytes())?
            .map(|guard| guard.value().to_vec());

        value.ok_or(ArborError::KeyNotFound)
    }

    /// Whether a key is present
    pub fn has(&self, key: &Key) -> Result<bool> {
        let db = self.database()?;
        let txn = db.begin_read()?;
        let table = txn.open_table(bucket(&self.config.bucket))?;
        let found = table.get(key.as_bytes())?.is_some();
        Ok(found)
    }

    /// Length of a value in bytes, or 0 when the key is absent
    ///
    /// Reads the length from the snapshot without copying the value.
    pub fn get_size(&self, key: &Key) -> Result<usize> {
        let db = self.database()?;
        let txn = db.begin_read()?;
        let table = txn.open_table(bucket(&self.config.bucket))?;
        let size = table
            .get(key.as_bytes())?
            .map_or(0, |guard| guard.value().len());
        Ok(size)
    }

    // =========================================================================
    // Queries and Batches
    // =========================================================================

    /// Run a query against a snapshot taken before this call returns
    ///
    /// Fails only if the snapshot cannot be opened; per-entry failures are
    /// carried by the individual results.
    pub fn query(&self, query: Query) -> Result<Results> {
        let db = self.database()?;
        tracing::debug!("Query started: {}", query);
        Results::start(db, self.config.bucket.clone(), query, self.config.query_buffer)
    }

    /// Begin an atomic batch
    ///
    /// Takes the write transaction immediately, blocking while another
    /// writer is active. Do not write through this datastore from the same
    /// thread until the batch is committed or dropped.
    ///
    /// While the batch is open, `close` fails with `ArborError::BatchOpen`.
    pub fn batch(&self) -> Result<Batch<'_>> {
        // Count the batch under the read lock so `close` cannot slip in between
        let db = {
            let guard = self.db.read();
            let db = guard.as_ref().cloned().ok_or(ArborError::Closed)?;
            self.open_batches.fetch_add(1, Ordering::SeqCst);
            db
        };
        Batch::begin(self, &db, self.durability())
    }

    pub(crate) fn batch_finished(&self) {
        self.open_batches.fetch_sub(1, Ordering::SeqCst);
    }

    // =========================================================================
    // Durability and Lifecycle
    // =========================================================================

    /// Make every committed write durable
    ///
    /// No-op under `SyncStrategy::EveryCommit`. The whole store is flushed
    /// regardless of `prefix`.
    pub fn sync(&self, prefix: &Key) -> Result<()> {
        let db = self.database()?;
        if self.config.sync_strategy == SyncStrategy::EveryCommit {
            return Ok(());
        }
        Self::flush(&db)?;

        tracing::debug!("Synced datastore (requested prefix {})", prefix);
        Ok(())
    }

    /// Close the datastore gracefully
    ///
    /// Flushes deferred commits. Later operations fail with
    /// `ArborError::Closed`; closing again is a no-op. Queries still running
    /// keep their snapshot until they finish.
    ///
    /// Fails with `ArborError::BatchOpen` and leaves the store open while a
    /// batch holds the write transaction.
    pub fn close(&self) -> Result<()> {
        let db = {
            let mut guard = self.db.write();
            let open = self.open_batches.load(Ordering::SeqCst);
            if open > 0 && guard.is_some() {
                return Err(ArborError::BatchOpen(open));
            }
            match guard.take() {
                Some(db) => db,
                None => return Ok(()),
            }
        };

        if self.config.sync_strategy == SyncStrategy::Manual {
            Self::flush(&db)?;
        }

        tracing::debug!("Closed datastore {}", self.config.path.display());
        Ok(())
    }

    /// Commit an empty transaction with immediate durability
    ///
    /// Persists every earlier non-durable commit along with it.
    fn flush(db: &Database) -> Result<()> {
        let mut txn = db.begin_write()?;
        txn.set_durability(Durability::Immediate);
        txn.commit()?;
        Ok(())
    }

    fn database(&self) -> Result<Arc<Database>> {
        self.db.read().as_ref().cloned().ok_or(ArborError::Closed)
    }

    fn durability(&self) -> Durability {
        match self.config.sync_strategy {
            SyncStrategy::EveryCommit => Durability::Immediate,
            SyncStrategy::Manual => Durability::None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the store file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.db.read().is_none()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Datastore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close datastore {}: {}", self.config.path.display(), e);
        }
    }
}
