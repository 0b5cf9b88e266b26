//! Scraping pipeline
//!
//! This module contains the producer/worker/consumer pipeline:
//! - A task generator walking the id range
//! - A fixed-size pool of workers fetching and extracting pages
//! - A single CSV sink writing rows in arrival order
//! - A completion watcher that closes the result stream once every worker
//!   has drained the task stream

mod completion;
mod extractor;
mod fetcher;
mod row;
mod task;
mod worker;

pub use completion::{spawn_watcher, CompletionGuard, CompletionSignal};
pub use extractor::QuerySet;
pub use fetcher::{build_http_client, fetch_page, FailureKind, FetchError};
pub use row::ResultRow;
pub use task::{spawn_generator, Task, TaskRange, UrlTemplate};
pub use worker::{TaskFailure, Worker};

use crate::config::Config;
use crate::output::{write_all, CsvSink, HeaderRow, RowSink, RunStats, RunSummary};
use crate::ScrapeError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Capacity of the task and result channels
///
/// tokio channels cannot be zero-sized; one slot keeps the generator at
/// most a single task ahead of the workers.
const HANDOFF_CAPACITY: usize = 1;

/// Runs a complete scraping job into the CSV file named by the config
///
/// The configuration is expected to be validated already. The run always
/// walks the whole id range unless the sink fails, in which case the
/// generator and workers are cancelled and the sink error is returned.
///
/// # Arguments
///
/// * `config` - A validated configuration; `output.path` is created or
///   truncated before any page is fetched
///
/// # Returns
///
/// * `Ok(RunSummary)` - Every task was processed and the file was flushed
/// * `Err(ScrapeError)` - The output could not be opened or written, or
///   the HTTP client could not be built
///
/// # Example
///
/// ```no_run
/// use idscrape::config::{validate, Config};
/// use idscrape::pipeline::run_scrape;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.scrape.url_template = "https://example.com/store/%d".to_string();
/// config.scrape.to = 100;
/// config.scrape.concurrency = 8;
/// validate(&config)?;
///
/// let summary = run_scrape(&config).await?;
/// println!("{} rows written", summary.rows_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_scrape(config: &Config) -> Result<RunSummary, ScrapeError> {
    let sink = CsvSink::create(Path::new(&config.output.path))?;
    run_scrape_into(config, sink).await
}

/// Runs a complete scraping job into an arbitrary [`RowSink`]
///
/// `config.output` is ignored; every row goes to `sink`, which is driven
/// on a blocking thread. A failing `write_row` or `finish` cancels the
/// generator and workers.
///
/// # Arguments
///
/// * `config` - A validated configuration
/// * `sink` - Destination for the header and every result row
///
/// # Returns
///
/// * `Ok(RunSummary)` - Every task was processed and the sink finished
/// * `Err(ScrapeError::Sink)` - The sink failed; the run was cut short
pub async fn run_scrape_into<S>(config: &Config, sink: S) -> Result<RunSummary, ScrapeError>
where
    S: RowSink + Send + 'static,
{
    let template = UrlTemplate::parse(&config.scrape.url_template)?;
    let queries = Arc::new(QuerySet::compile(config.fields.selectors())?);
    let header = HeaderRow::new(config.fields.columns());
    let client = build_http_client(&config.http)?;
    let concurrency = config.scrape.concurrency.max(1);

    let stats = Arc::new(RunStats::new());
    let cancel = CancellationToken::new();

    tracing::info!(
        "Scraping ids [{}, {}) from {} with {} workers",
        config.scrape.from,
        config.scrape.to,
        config.scrape.url_template,
        concurrency
    );

    let (task_tx, task_rx) = mpsc::channel(HANDOFF_CAPACITY);
    let (result_tx, result_rx) = mpsc::channel(HANDOFF_CAPACITY);

    let generator = spawn_generator(
        TaskRange::new(template, config.scrape.from, config.scrape.to),
        task_tx,
        stats.clone(),
        cancel.clone(),
    );

    let tasks = Arc::new(Mutex::new(task_rx));
    let completion = Arc::new(CompletionSignal::new(concurrency));
    let mut workers = JoinSet::new();

    for index in 0..concurrency {
        let worker = Worker {
            index,
            client: client.clone(),
            queries: queries.clone(),
            tasks: tasks.clone(),
            results: result_tx.clone(),
            stats: stats.clone(),
            cancel: cancel.clone(),
        };
        workers.spawn(worker.run(completion.guard()));
    }

    let watcher = spawn_watcher(completion, result_tx);

    let sink_stats = stats.clone();
    let writer = tokio::task::spawn_blocking(move || {
        write_all(result_rx, sink, &header, &sink_stats)
    });

    let sink_result = writer.await;
    if !matches!(sink_result, Ok(Ok(()))) {
        // Nobody reads results any more; stop fetching
        cancel.cancel();
    }

    let generated = generator.await?;
    while let Some(joined) = workers.join_next().await {
        joined?;
    }
    watcher.await?;

    sink_result??;

    let summary = stats.summary();
    tracing::debug!("Generated {} tasks", generated);
    Ok(summary)
}
