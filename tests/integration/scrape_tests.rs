//! Integration tests for full scraping runs
//!
//! These tests use wiremock to create mock HTTP servers and drive the
//! whole pipeline end-to-end, from task generation to the CSV file.

use idscrape::config::{validate, Config};
use idscrape::output::{RowSink, SinkError, SinkResult};
use idscrape::pipeline::{run_scrape, run_scrape_into};
use idscrape::ScrapeError;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a validated test configuration for `server`
fn create_test_config(
    server: &MockServer,
    from: i64,
    to: i64,
    concurrency: usize,
    output: &Path,
) -> Config {
    let mut config = Config::default();
    config.scrape.url_template = format!("{}/%d", server.uri());
    config.scrape.from = from;
    config.scrape.to = to;
    config.scrape.concurrency = concurrency;
    config.output.path = output.to_string_lossy().into_owned();
    config.http.timeout_secs = 5;
    validate(&config).expect("test config should be valid");
    config
}

/// A page with all four fields present
fn full_page(id: i64) -> String {
    format!(
        r#"<html><body>
            <h1 class="name"> Store {id} </h1>
            <p class="address">{id} Main St</p>
            <p class="phone">555-01{id:02}</p>
            <a class="email">store{id}@example.com</a>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, id: i64, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, id: i64, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", id)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Sink that accepts `capacity` records, then fails every write
struct FullDiskSink {
    written: Arc<AtomicUsize>,
    capacity: usize,
}

impl RowSink for FullDiskSink {
    fn write_row(&mut self, _record: &[String]) -> SinkResult<()> {
        if self.written.load(Ordering::SeqCst) >= self.capacity {
            return Err(SinkError::Flush(std::io::Error::other("no space left")));
        }
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn finish(self) -> SinkResult<()> {
        Ok(())
    }
}

/// Reads the output back as (header, data rows)
fn read_output(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("output file should exist");
    let header = reader
        .headers()
        .expect("header row")
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("valid record").iter().map(String::from).collect())
        .collect();
    (header, rows)
}

#[tokio::test]
async fn test_unreachable_page_is_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, 0, full_page(0)).await;
    mount_status(&server, 1, 500).await;
    mount_page(&server, 2, full_page(2)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let config = create_test_config(&server, 0, 3, 1, &output);

    let summary = run_scrape(&config).await.expect("run should succeed");

    let (header, rows) = read_output(&output);
    assert_eq!(header, ["url", "id", "name", "address", "phone", "email"]);
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0][0], format!("{}/0", server.uri()));
    assert_eq!(rows[0][1], "0");
    assert_eq!(rows[0][2], "Store 0");
    assert_eq!(rows[0][3], "0 Main St");
    assert_eq!(rows[0][4], "555-0100");
    assert_eq!(rows[0][5], "store0@example.com");

    assert_eq!(rows[1][1], "2");
    assert!(rows.iter().all(|r| r.len() == 6 && r.iter().all(|v| !v.is_empty())));

    assert_eq!(summary.tasks_generated, 3);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.failures, 1);
}

#[tokio::test]
async fn test_empty_range_writes_header_only() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let config = create_test_config(&server, 5, 5, 3, &output);

    let summary = run_scrape(&config).await.unwrap();

    let (header, rows) = read_output(&output);
    assert_eq!(header.len(), 6);
    assert!(rows.is_empty());
    assert_eq!(summary.tasks_generated, 0);

    // Inverted range behaves the same way
    let config = create_test_config(&server, 9, 2, 1, &output);
    run_scrape(&config).await.unwrap();
    let (_, rows) = read_output(&output);
    assert!(rows.is_empty());

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_selector_leaves_empty_column() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        0,
        r#"<div class="name">Only Name</div><div class="phone">123</div>"#.to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let config = create_test_config(&server, 0, 1, 1, &output);

    run_scrape(&config).await.unwrap();

    let (_, rows) = read_output(&output);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), 6);
    assert_eq!(rows[0][2], "Only Name");
    assert_eq!(rows[0][3], "");
    assert_eq!(rows[0][4], "123");
    assert_eq!(rows[0][5], "");
}

#[tokio::test]
async fn test_rate_limited_and_failed_tasks_emit_no_rows() {
    let server = MockServer::start().await;
    for id in 0..10 {
        match id % 3 {
            0 => mount_status(&server, id, 429).await,
            1 => mount_status(&server, id, 404).await,
            _ => mount_page(&server, id, full_page(id)).await,
        }
    }

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let config = create_test_config(&server, 0, 10, 4, &output);

    let summary = run_scrape(&config).await.unwrap();

    let (_, rows) = read_output(&output);
    let ids: HashSet<i64> = rows.iter().map(|r| r[1].parse().unwrap()).collect();
    assert_eq!(ids, HashSet::from([2, 5, 8]));

    assert_eq!(summary.rate_limited, 4);
    assert_eq!(summary.failures, 3);
    assert_eq!(
        summary.rows_written,
        summary.tasks_generated - summary.failed_tasks()
    );
}

#[tokio::test]
async fn test_single_worker_preserves_id_order() {
    let server = MockServer::start().await;
    for id in 0..8 {
        mount_page(&server, id, full_page(id)).await;
    }

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let config = create_test_config(&server, 0, 8, 1, &output);

    run_scrape(&config).await.unwrap();

    let (_, rows) = read_output(&output);
    let ids: Vec<String> = rows.iter().map(|r| r[1].clone()).collect();
    let expected: Vec<String> = (0..8).map(|id| id.to_string()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_workers_emit_each_row_once() {
    let server = MockServer::start().await;
    for id in 0..40 {
        let delay = Duration::from_millis(((id * 7) % 5) as u64 * 10);
        Mock::given(method("GET"))
            .and(path(format!("/{}", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(full_page(id))
                    .set_delay(delay),
            )
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let config = create_test_config(&server, 0, 40, 8, &output);

    let summary = run_scrape(&config).await.unwrap();

    let (_, rows) = read_output(&output);
    assert_eq!(rows.len(), 40);

    let mut seen = HashSet::new();
    for row in &rows {
        let id: i64 = row[1].parse().unwrap();
        assert!(seen.insert(id), "id {} written twice", id);
        assert_eq!(row[0], format!("{}/{}", server.uri(), id));
        assert_eq!(row[2], format!("Store {}", id));
    }
    assert_eq!(seen, (0..40).collect::<HashSet<i64>>());
    assert_eq!(summary.rows_written, 40);

    // Every id was requested exactly once
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 40);
}

#[tokio::test]
async fn test_sink_failure_stops_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(full_page(1)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("missing").join("out.csv");
    let config = create_test_config(&server, 0, 10_000, 4, &output);

    let result = tokio::time::timeout(Duration::from_secs(10), run_scrape(&config))
        .await
        .expect("run must terminate after a sink failure");

    assert!(matches!(result, Err(ScrapeError::Sink(_))));
    assert!(!output.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_write_failure_mid_run_cancels_remaining_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(full_page(1)))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, 0, 10_000, 4, &dir.path().join("unused.csv"));

    let written = Arc::new(AtomicUsize::new(0));
    let sink = FullDiskSink {
        written: written.clone(),
        capacity: 6,
    };

    let result = tokio::time::timeout(Duration::from_secs(10), run_scrape_into(&config, sink))
        .await
        .expect("run must terminate after a write failure");

    match result {
        Err(ScrapeError::Sink(SinkError::Flush(e))) => assert_eq!(e.to_string(), "no space left"),
        other => panic!("expected a sink write error, got {:?}", other),
    }

    // Header plus five rows went through before the failure
    assert_eq!(written.load(Ordering::SeqCst), 6);

    // The remaining ids were never requested
    let requests = server.received_requests().await.unwrap();
    assert!(
        requests.len() < 1_000,
        "{} requests after the sink failed",
        requests.len()
    );
    assert!(!dir.path().join("unused.csv").exists());
}

#[tokio::test]
async fn test_latin1_page_is_decoded() {
    let server = MockServer::start().await;
    // "Café Crème" encoded as ISO-8859-1
    let body = b"<h1 class=\"name\">Caf\xe9 Cr\xe8me</h1><p class=\"phone\">1</p>".to_vec();
    Mock::given(method("GET"))
        .and(path("/0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=ISO-8859-1"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let config = create_test_config(&server, 0, 1, 1, &output);

    let summary = run_scrape(&config).await.unwrap();

    let (_, rows) = read_output(&output);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][2], "Café Crème");
    assert_eq!(rows[0][4], "1");
    assert_eq!(summary.failures, 0);
}

#[tokio::test]
async fn test_custom_columns_in_header() {
    let server = MockServer::start().await;
    mount_page(&server, 3, full_page(3)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let mut config = create_test_config(&server, 3, 4, 1, &output);
    config.fields.name.column = "store".to_string();
    config.fields.email.column = "contact".to_string();
    config.fields.email.selector = "a".to_string();

    run_scrape(&config).await.unwrap();

    let (header, rows) = read_output(&output);
    assert_eq!(header, ["url", "id", "store", "address", "phone", "contact"]);
    assert_eq!(rows[0][5], "store3@example.com");
}
