//! Result sink
//!
//! The sink is the only owner of the destination file. It writes the header
//! first, then every row in arrival order until the result stream closes.

use crate::output::RunStats;
use crate::pipeline::ResultRow;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while writing results
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unable to open file {}: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("error writing record to csv: {0}")]
    Write(#[from] csv::Error),

    #[error("could not write file: {0}")]
    Flush(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Column names written once before any data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    columns: Vec<String>,
}

impl HeaderRow {
    /// Builds `[url, id, fields...]` from the extracted column names
    pub fn new(field_columns: Vec<String>) -> Self {
        let mut columns = Vec::with_capacity(field_columns.len() + 2);
        columns.push("url".to_string());
        columns.push("id".to_string());
        columns.extend(field_columns);
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Destination for flattened rows
pub trait RowSink {
    /// Appends one record
    fn write_row(&mut self, record: &[String]) -> SinkResult<()>;

    /// Flushes buffered output and surfaces any deferred write error
    fn finish(self) -> SinkResult<()>;
}

/// CSV file sink
///
/// Buffered output is flushed by `finish`. On error paths the writer is
/// dropped, which flushes what it can and closes the file.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Creates or truncates the destination file
    pub fn create(path: &Path) -> SinkResult<Self> {
        let writer = csv::Writer::from_path(path).map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { writer })
    }
}

impl RowSink for CsvSink {
    fn write_row(&mut self, record: &[String]) -> SinkResult<()> {
        self.writer.write_record(record)?;
        Ok(())
    }

    fn finish(mut self) -> SinkResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the header, then every row from `results` until it closes
///
/// Blocks the calling thread; run it on a blocking task. Any write error
/// aborts immediately and is returned. Dropping `results` on the way out
/// tells the workers that nobody is reading any more.
///
/// # Arguments
///
/// * `results` - Receiving half of the result stream
/// * `sink` - Destination; consumed and finished on success
/// * `header` - Written before any row, even when no row arrives
/// * `stats` - Counts every row written
///
/// # Returns
///
/// * `Ok(())` - The stream closed and the sink was flushed
/// * `Err(SinkError)` - The first write or flush error
pub fn write_all<S: RowSink>(
    mut results: mpsc::Receiver<ResultRow>,
    mut sink: S,
    header: &HeaderRow,
    stats: &RunStats,
) -> SinkResult<()> {
    sink.write_row(header.columns())?;

    while let Some(row) = results.blocking_recv() {
        let id = row.id;
        sink.write_row(&row.into_record())?;
        stats.record_row_written();
        tracing::debug!(id, "Row written");
    }

    sink.finish()?;
    tracing::debug!("Result stream closed, output finalized");
    Ok(())
}
