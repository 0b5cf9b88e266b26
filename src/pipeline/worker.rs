//! Worker pool
//!
//! Every worker pulls tasks from one shared receiver, fetches and extracts,
//! and forwards successful rows to the sink. A failed task is logged and
//! skipped; it never stops the worker.

use crate::output::RunStats;
use crate::pipeline::completion::CompletionGuard;
use crate::pipeline::extractor::QuerySet;
use crate::pipeline::fetcher::{fetch_page, FailureKind, FetchError};
use crate::pipeline::{ResultRow, Task};
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Task receiver shared by all workers
pub type SharedTasks = Arc<Mutex<mpsc::Receiver<Task>>>;

/// Why a single task produced no row
#[derive(Debug, Error)]
pub enum TaskFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl TaskFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            TaskFailure::Fetch(e) => e.kind(),
        }
    }
}

/// One member of the pool
pub struct Worker {
    pub index: usize,
    pub client: Client,
    pub queries: Arc<QuerySet>,
    pub tasks: SharedTasks,
    pub results: mpsc::Sender<ResultRow>,
    pub stats: Arc<RunStats>,
    pub cancel: CancellationToken,
}

impl Worker {
    /// Runs until the task channel is closed and drained, the result
    /// stream is gone, or the run is cancelled
    ///
    /// `completion` is dropped on return, which counts this worker as done.
    pub async fn run(self, completion: CompletionGuard) {
        let mut processed = 0u64;

        loop {
            let task = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                task = next_task(&self.tasks) => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            processed += 1;

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                outcome = self.process(&task) => outcome,
            };

            let row = match outcome {
                Ok(row) => row,
                Err(failure) => {
                    self.stats.record_failure(failure.kind());
                    tracing::warn!(
                        url = %task.url,
                        id = task.id,
                        kind = %failure.kind(),
                        "Could not fetch url and id: {}",
                        failure
                    );
                    continue;
                }
            };

            let sent = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = self.results.send(row) => sent,
            };

            if sent.is_err() {
                tracing::debug!(worker = self.index, "Result stream closed, stopping");
                break;
            }
            self.stats.record_row_emitted();
        }

        tracing::debug!(worker = self.index, processed, "Worker finished");
        // Release the result sender before counting this worker as done
        drop(self);
        drop(completion);
    }

    /// Fetches and extracts one task
    async fn process(&self, task: &Task) -> Result<ResultRow, TaskFailure> {
        tracing::debug!(worker = self.index, url = %task.url, id = task.id, "Fetching");

        let content = fetch_page(&self.client, &task.url).await?;

        let fields = self.queries.extract(&content);

        Ok(ResultRow::new(task.clone(), fields))
    }
}

/// Takes the next task, or `None` once the channel is closed and empty
async fn next_task(tasks: &Mutex<mpsc::Receiver<Task>>) -> Option<Task> {
    tasks.lock().await.recv().await
}
