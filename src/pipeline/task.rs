//! Task generation
//!
//! Turns a URL template and a half-open id range into a lazy sequence of
//! [`Task`] values, and feeds them into the task channel from a dedicated
//! tokio task.

use crate::output::RunStats;
use crate::ConfigError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Placeholder substituted with the id
const PLACEHOLDER: &str = "%d";

/// One unit of scraping work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Fully rendered URL
    pub url: String,

    /// The id substituted into the template
    pub id: i64,
}

/// A URL template containing a single `%d` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    prefix: String,
    suffix: String,
}

impl UrlTemplate {
    /// Parses a template, requiring exactly one placeholder
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let (prefix, suffix) = template
            .split_once(PLACEHOLDER)
            .ok_or_else(|| invalid("missing %d placeholder"))?;

        if suffix.contains(PLACEHOLDER) {
            return Err(invalid("more than one %d placeholder"));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Substitutes `id` as a decimal integer
    pub fn render(&self, id: i64) -> String {
        format!("{}{}{}", self.prefix, id, self.suffix)
    }
}

/// Lazy, finite iterator over the tasks for `[low, high)`
///
/// Yields nothing when `high <= low`.
#[derive(Debug, Clone)]
pub struct TaskRange {
    template: UrlTemplate,
    next: i64,
    end: i64,
}

impl TaskRange {
    pub fn new(template: UrlTemplate, low: i64, high: i64) -> Self {
        Self {
            template,
            next: low,
            end: high,
        }
    }
}

impl Iterator for TaskRange {
    type Item = Task;

    fn next(&mut self) -> Option<Task> {
        if self.next >= self.end {
            return None;
        }

        let id = self.next;
        self.next += 1;

        Some(Task {
            url: self.template.render(id),
            id,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.end > self.next {
            usize::try_from(self.end.abs_diff(self.next)).unwrap_or(usize::MAX)
        } else {
            0
        };
        (remaining, Some(remaining))
    }
}

/// Spawns the generator feeding `tasks` into the task channel
///
/// Each send waits until a worker has room to take the task, so the
/// generator never runs ahead of consumption. Dropping the sender when the
/// range is exhausted closes the channel, which is the only signal workers
/// get that no more work is coming.
///
/// # Arguments
///
/// * `tasks` - The id range to walk, already bound to its URL template
/// * `tx` - Sending half of the task channel; dropped when the task ends
/// * `stats` - Counts every task handed off
/// * `cancel` - Stops generation early when fired
///
/// # Returns
///
/// A handle resolving to the number of tasks handed off. This is less than
/// the range size only when the run was cancelled or every worker is gone.
pub fn spawn_generator(
    tasks: TaskRange,
    tx: mpsc::Sender<Task>,
    stats: Arc<RunStats>,
    cancel: CancellationToken,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut generated = 0;

        for task in tasks {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Task generator cancelled after {} tasks", generated);
                    break;
                }
                sent = tx.send(task) => {
                    if sent.is_err() {
                        tracing::debug!("All workers gone, stopping task generator");
                        break;
                    }
                    generated += 1;
                    stats.record_task_generated();
                }
            }
        }

        tracing::debug!("Task generator finished: {} tasks", generated);
        generated
    })
}
