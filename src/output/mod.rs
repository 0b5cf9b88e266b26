//! Output module for scraping results
//!
//! This module handles:
//! - Writing the header and result rows to the CSV destination
//! - Recording run statistics and the end-of-run summary

mod sink;
pub mod stats;

pub use sink::{write_all, CsvSink, HeaderRow, RowSink, SinkError, SinkResult};
pub use stats::{RunStats, RunSummary};
