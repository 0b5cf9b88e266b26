//! Worker completion tracking
//!
//! A countdown initialised to the worker count. Each worker holds a
//! [`CompletionGuard`] that decrements the count exactly once when it is
//! dropped, and the watcher closes the result stream once the count hits
//! zero.

use crate::pipeline::ResultRow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// Counting completion signal shared by workers and the watcher
#[derive(Debug)]
pub struct CompletionSignal {
    remaining: AtomicUsize,
    notify: Notify,
}

impl CompletionSignal {
    pub fn new(workers: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(workers),
            notify: Notify::new(),
        }
    }

    /// Number of workers that have not finished yet
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Hands out the guard a single worker carries until it exits
    pub fn guard(self: &Arc<Self>) -> CompletionGuard {
        CompletionGuard {
            signal: Arc::clone(self),
        }
    }

    fn worker_done(&self) {
        // AcqRel so everything the worker did is visible to whoever sees zero
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify.notify_waiters();
        }
    }

    /// Waits until every worker has finished
    pub async fn wait(&self) {
        loop {
            // Register interest before checking, so a notify between the
            // check and the await is not lost
            let notified = self.notify.notified();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Decrements the owning [`CompletionSignal`] on drop
#[derive(Debug)]
pub struct CompletionGuard {
    signal: Arc<CompletionSignal>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.signal.worker_done();
    }
}

/// Spawns the watcher that owns the primary result sender
///
/// Workers hold clones of `results`; the channel only closes once this last
/// sender is dropped, which happens after every worker has signalled
/// completion. Without the watcher the sink would wait forever.
pub fn spawn_watcher(
    signal: Arc<CompletionSignal>,
    results: mpsc::Sender<ResultRow>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        signal.wait().await;
        drop(results);
        tracing::debug!("All workers finished, result stream closed");
    })
}
