//! Query results
//!
//! Consumer side of a running query.
//!
//! ## Concurrency
//! ```text
//!   query worker (owns read snapshot) ──bounded channel──► Results (caller)
//! ```
//! - The worker blocks when the channel is full; nothing is ever dropped.
//! - Dropping `Results` disconnects the channel and raises the cancel flag.
//!   The worker stops at its next cursor step and releases the snapshot;
//!   `Drop` waits for it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver};
use redb::Database;

use crate::error::{ArborError, Result};

use super::{Entry, Query, QueryResult, Scanner};

/// A lazily produced, non-restartable sequence of query results
pub struct Results {
    query: Query,
    receiver: Option<Receiver<QueryResult>>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl Results {
    /// Spawn the query worker and wait until its snapshot is open
    ///
    /// Fails without producing anything if the snapshot cannot be opened.
    pub(crate) fn start(
        db: Arc<Database>,
        bucket: String,
        query: Query,
        buffer: usize,
    ) -> Result<Self> {
        let (ready_tx, ready_rx) = channel::bounded(1);
        let (result_tx, result_rx) = channel::bounded(buffer);
        let cancelled = Arc::new(AtomicBool::new(false));

        let scanner = Scanner::new(db, bucket, query.clone(), Arc::clone(&cancelled));
        let worker = thread::Builder::new()
            .name("arborkv-query".to_string())
            .spawn(move || scanner.run(ready_tx, result_tx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                query,
                receiver: Some(result_rx),
                cancelled,
                worker: Some(worker),
            }),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(ArborError::QueryWorker(
                    "worker exited before opening a snapshot".to_string(),
                ))
            }
        }
    }

    /// The query these results answer
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Drain the remaining results, stopping at the first per-entry error
    pub fn rest(self) -> Result<Vec<Entry>> {
        self.map(QueryResult::into_result).collect()
    }

    /// Stop consuming; the worker releases its snapshot before this returns
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        // Disconnect first so a worker blocked on send wakes up
        self.receiver.take();
        self.join_worker();
    }

    /// Wait for the worker; a panic becomes an error result
    fn join_worker(&mut self) -> Option<QueryResult> {
        let worker = self.worker.take()?;
        match worker.join() {
            Ok(()) => None,
            Err(_) => {
                tracing::warn!("Query worker panicked ({})", self.query);
                Some(QueryResult::failed(
                    Entry::default(),
                    ArborError::QueryWorker("worker panicked".to_string()),
                ))
            }
        }
    }
}

impl Iterator for Results {
    type Item = QueryResult;

    fn next(&mut self) -> Option<QueryResult> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv() {
            Ok(result) => Some(result),
            Err(_) => {
                // Worker finished and dropped its sender
                self.receiver = None;
                self.join_worker()
            }
        }
    }
}

impl Drop for Results {
    fn drop(&mut self) {
        self.shutdown();
    }
}
