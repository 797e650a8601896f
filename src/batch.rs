//! Batch Writer
//!
//! Groups puts and deletes into one write transaction that commits
//! atomically. Operations go straight into the transaction's working set;
//! other readers see none of them until `commit`, and all of them after.

use redb::{Database, Durability, WriteTransaction};

use crate::datastore::{bucket, Datastore};
use crate::error::{ArborError, Result};
use crate::key::Key;

/// An open atomic batch
///
/// Holds the store's write lock from creation until `commit`, `discard` or
/// drop. Dropping an uncommitted batch rolls every operation back. Not meant
/// to be shared between threads.
///
/// Borrows the datastore it was started on, which cannot be closed while
/// the batch is open.
pub struct Batch<'a> {
    /// Datastore that counts this batch as open
    store: &'a Datastore,

    /// The write transaction; `None` after commit or discard
    txn: Option<WriteTransaction>,

    /// Number of operations applied so far
    operations: usize,
}

impl<'a> Batch<'a> {
    /// Open the write transaction now so lock failures surface here
    ///
    /// The caller has already counted the batch as open on `store`; a
    /// failure here releases that count.
    pub(crate) fn begin(
        store: &'a Datastore,
        db: &Database,
        durability: Durability,
    ) -> Result<Self> {
        let mut txn = match db.begin_write() {
            Ok(txn) => txn,
            Err(e) => {
                store.batch_finished();
                return Err(e.into());
            }
        };
        txn.set_durability(durability);

        tracing::debug!("Batch started on bucket {}", store.bucket());

        Ok(Self {
            store,
            txn: Some(txn),
            operations: 0,
        })
    }

    /// Stage a put
    pub fn put(&mut self, key: &Key, value: &[u8]) -> Result<()> {
        let txn = self.txn.as_ref().ok_or(ArborError::BatchClosed)?;
        {
            let mut table = txn.open_table(bucket(self.store.bucket()))?;
            table.insert(key.as_bytes(), value)?;
        }
        self.operations += 1;
        Ok(())
    }

    /// Stage a delete (absent keys are fine)
    pub fn delete(&mut self, key: &Key) -> Result<()> {
        let txn = self.txn.as_ref().ok_or(ArborError::BatchClosed)?;
        {
            let mut table = txn.open_table(bucket(self.store.bucket()))?;
            table.remove(key.as_bytes())?;
        }
        self.operations += 1;
        Ok(())
    }

    /// Make every staged operation visible at once
    ///
    /// The transaction is consumed whether or not the commit succeeds; on
    /// failure nothing becomes visible. Any later call returns
    /// `ArborError::BatchClosed`.
    pub fn commit(&mut self) -> Result<()> {
        let txn = self.finish().ok_or(ArborError::BatchClosed)?;
        txn.commit()?;

        tracing::debug!("Batch committed: {} operations", self.operations);
        Ok(())
    }

    /// Roll back every staged operation
    pub fn discard(&mut self) -> Result<()> {
        let txn = self.finish().ok_or(ArborError::BatchClosed)?;
        txn.abort()?;

        tracing::debug!("Batch discarded: {} operations", self.operations);
        Ok(())
    }

    /// Number of operations staged
    pub fn len(&self) -> usize {
        self.operations
    }

    /// Whether nothing has been staged yet
    pub fn is_empty(&self) -> bool {
        self.operations == 0
    }

    /// Whether the batch still accepts operations
    pub fn is_open(&self) -> bool {
        self.txn.is_some()
    }

    /// Take the transaction out and stop counting the batch as open
    fn finish(&mut self) -> Option<WriteTransaction> {
        let txn = self.txn.take();
        if txn.is_some() {
            self.store.batch_finished();
        }
        txn
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.finish() {
            if let Err(e) = txn.abort() {
                tracing::warn!("Failed to roll back batch: {}", e);
            }
        }
    }
}
