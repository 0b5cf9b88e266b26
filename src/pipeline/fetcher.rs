//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper:
//! - Building the shared HTTP client from [`HttpConfig`]
//! - GET requests for rendered task URLs
//! - Error classification (transport, status, rate limited)
//!
//! There is no retry at this layer; a failed fetch drops the task.

use crate::config::HttpConfig;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Failure classification for a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network error, bad status, or unreadable content
    Ordinary,

    /// The server answered 429 Too Many Requests
    RateLimited,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Ordinary => write!(f, "error"),
            FailureKind::RateLimited => write!(f, "rate-limited"),
        }
    }
}

/// Errors returned by [`fetch_page`]
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not read url {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("rate limiting detected for {url}")]
    RateLimited { url: String },

    #[error("bad response from server for {url}: {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::RateLimited { .. } => FailureKind::RateLimited,
            _ => FailureKind::Ordinary,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed with reqwest's default policy.
///
/// # Example
///
/// ```
/// use idscrape::config::HttpConfig;
/// use idscrape::pipeline::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns the decoded response body
///
/// The body is decoded using the charset named in the Content-Type header,
/// falling back to UTF-8 with lossy replacement, so pages in legacy
/// encodings are still scraped.
///
/// # Error Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | DNS, connect, timeout | `Transport` |
/// | HTTP 429 | `RateLimited` |
/// | Any other non-200 status | `Status` |
/// | Body read interrupted | `Body` |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The rendered task URL
///
/// # Returns
///
/// * `Ok(String)` - The page body
/// * `Err(FetchError)` - The task should be dropped
///
/// The response (and its connection) is released when this function
/// returns, on every path.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited {
            url: url.to_string(),
        });
    }

    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    response.text().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })
}
