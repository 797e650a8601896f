//! Snapshot scan
//!
//! Runs on the query worker thread. Owns the read transaction for the whole
//! scan, so every entry comes from the same point-in-time view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use crossbeam::channel::Sender;
use redb::{AccessGuard, Database, ReadTransaction, ReadableTable};

use crate::datastore::{bucket, Bucket};
use crate::error::{ArborError, Result};
use crate::key::Key;

use super::{Entry, Query, QueryResult};

/// Whether the cursor should keep going
enum Flow {
    Continue,
    Stop,
}

/// Executes one query against one read snapshot
pub(crate) struct Scanner {
    db: Arc<Database>,
    bucket: String,
    query: Query,
    cancelled: Arc<AtomicBool>,
}

impl Scanner {
    pub(crate) fn new(
        db: Arc<Database>,
        bucket: String,
        query: Query,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            db,
            bucket,
            query,
            cancelled,
        }
    }

    /// Worker entry point
    ///
    /// Reports whether the snapshot opened on `ready` before producing
    /// anything on `out`. Returning drops the snapshot.
    pub(crate) fn run(self, ready: Sender<Result<()>>, out: Sender<QueryResult>) {
        let (txn, table) = match self.open() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        if ready.send(Ok(())).is_err() {
            return;
        }

        let outcome = if self.query.streams() {
            self.stream(&table, &out)
        } else {
            self.collect(&table).map(|buffered| {
                // Sorting and delivery need nothing from the snapshot
                drop(table);
                drop(txn);
                self.deliver_sorted(buffered, &out)
            })
        };

        match outcome {
            Ok(sent) => {
                tracing::trace!("Query finished ({}): {} results", self.query, sent);
            }
            Err(e) => {
                tracing::warn!("Query scan failed ({}): {}", self.query, e);
                let _ = out.send(QueryResult::failed(Entry::default(), e));
            }
        }
    }

    fn open(&self) -> Result<(ReadTransaction, Bucket)> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(bucket(&self.bucket))?;
        Ok((txn, table))
    }

    // =========================================================================
    // Delivery Paths
    // =========================================================================

    /// Deliver while scanning, counting offset and limit on filtered entries
    fn stream(&self, table: &Bucket, out: &Sender<QueryResult>) -> Result<usize> {
        let limit = if self.query.limit == 0 {
            usize::MAX
        } else {
            self.query.limit
        };
        let mut skipped = 0;
        let mut sent = 0;

        self.walk(table, |result| {
            if !self.query.matches(&result.entry) {
                return Flow::Continue;
            }
            if skipped < self.query.offset {
                skipped += 1;
                return Flow::Continue;
            }
            if out.send(result).is_err() {
                // Consumer hung up
                return Flow::Stop;
            }
            sent += 1;
            if sent >= limit {
                Flow::Stop
            } else {
                Flow::Continue
            }
        })?;

        Ok(sent)
    }

    /// Buffer every filtered entry in cursor order
    fn collect(&self, table: &Bucket) -> Result<Vec<QueryResult>> {
        let mut buffered = Vec::new();
        self.walk(table, |result| {
            if self.query.matches(&result.entry) {
                buffered.push(result);
            }
            Flow::Continue
        })?;
        Ok(buffered)
    }

    /// Stable sort by the order chain, then cut the page
    fn deliver_sorted(&self, mut buffered: Vec<QueryResult>, out: &Sender<QueryResult>) -> usize {
        buffered.sort_by(|a, b| self.query.compare(&a.entry, &b.entry));

        let mut sent = 0;
        for result in self.query.page(buffered.into_iter()) {
            if self.is_cancelled() || out.send(result).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    /// Walk the prefix range, forwards or backwards, handing each entry to `visit`
    fn walk<F>(&self, table: &Bucket, visit: F) -> Result<()>
    where
        F: FnMut(QueryResult) -> Flow,
    {
        let prefix = self.query.prefix.as_bytes();

        if self.query.reversed() {
            let end = prefix_end(prefix);
            let range = match &end {
                Some(end) => table.range::<&[u8]>(prefix..end.as_slice())?,
                None => table.range::<&[u8]>(prefix..)?,
            };
            self.drive(range.rev(), visit)
        } else if prefix.is_empty() {
            self.drive(table.iter()?, visit)
        } else {
            // Seek to the first key >= prefix
            self.drive(table.range::<&[u8]>(prefix..)?, visit)
        }
    }

    fn drive<'g, I, F>(&self, cursor: I, mut visit: F) -> Result<()>
    where
        I: Iterator<
            Item = std::result::Result<
                (AccessGuard<'g, &'static [u8]>, AccessGuard<'g, &'static [u8]>),
                redb::StorageError,
            >,
        >,
        F: FnMut(QueryResult) -> Flow,
    {
        let prefix = self.query.prefix.as_bytes();

        for item in cursor {
            if self.is_cancelled() {
                break;
            }
            let (key, value) = item?;
            let key = key.value();

            // First key outside the prefix ends the scan
            if !key.starts_with(prefix) {
                break;
            }

            if let Flow::Stop = visit(self.load(key, value.value())) {
                break;
            }
        }
        Ok(())
    }

    /// Copy an entry out of snapshot-owned memory
    fn load(&self, key: &[u8], value: &[u8]) -> QueryResult {
        let (value, size) = if self.query.keys_only {
            (None, 0)
        } else {
            (Some(Bytes::copy_from_slice(value)), value.len())
        };

        match std::str::from_utf8(key) {
            Ok(k) => QueryResult::ok(Entry {
                key: Key::raw(k),
                value,
                size,
            }),
            Err(e) => {
                let key = Key::raw(String::from_utf8_lossy(key).into_owned());
                let error = ArborError::InvalidKey(format!("{}: {}", key, e));
                QueryResult::failed(Entry { key, value, size }, error)
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Smallest byte string greater than every key starting with `prefix`
///
/// `None` when no such bound exists (empty or all-`0xFF` prefix).
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
