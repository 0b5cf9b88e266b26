//! Run statistics
//!
//! Counters are updated concurrently by the generator, the workers and the
//! sink, then snapshotted into a [`RunSummary`] at the end of the run.

use crate::pipeline::FailureKind;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one run
#[derive(Debug)]
pub struct RunStats {
    started_at: DateTime<Utc>,
    tasks_generated: AtomicU64,
    rows_emitted: AtomicU64,
    rows_written: AtomicU64,
    failures: AtomicU64,
    rate_limited: AtomicU64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            tasks_generated: AtomicU64::new(0),
            rows_emitted: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),
        }
    }

    pub fn record_task_generated(&self) {
        self.tasks_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_row_emitted(&self) {
        self.rows_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_row_written(&self) {
        self.rows_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: FailureKind) {
        match kind {
            FailureKind::Ordinary => self.failures.fetch_add(1, Ordering::Relaxed),
            FailureKind::RateLimited => self.rate_limited.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Takes a snapshot of the current counters
    pub fn summary(&self) -> RunSummary {
        let finished_at = Utc::now();
        RunSummary {
            started_at: self.started_at,
            finished_at,
            duration_seconds: (finished_at - self.started_at).num_milliseconds() as f64 / 1000.0,
            tasks_generated: self.tasks_generated.load(Ordering::Relaxed),
            rows_emitted: self.rows_emitted.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of a run's counters
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: f64,

    /// Tasks handed to the worker pool
    pub tasks_generated: u64,

    /// Rows forwarded by workers to the sink
    pub rows_emitted: u64,

    /// Data rows persisted by the sink (header excluded)
    pub rows_written: u64,

    /// Tasks dropped for network, status or parse errors
    pub failures: u64,

    /// Tasks dropped because the server answered 429
    pub rate_limited: u64,
}

impl RunSummary {
    /// All dropped tasks, whatever the cause
    pub fn failed_tasks(&self) -> u64 {
        self.failures + self.rate_limited
    }

    /// Logs the summary through tracing
    pub fn log(&self) {
        tracing::info!(
            "Scrape finished in {:.1}s: {} tasks, {} rows written, {} failed ({} rate limited)",
            self.duration_seconds,
            self.tasks_generated,
            self.rows_written,
            self.failed_tasks(),
            self.rate_limited
        );

        if self.rate_limited > 0 {
            tracing::warn!(
                "{} requests were rate limited; consider lowering --concurrency",
                self.rate_limited
            );
        }
    }
}
