// src/checker/http.rs
// =============================================================================
// This module performs a single check of a monitored site.
//
// Key functionality:
// - Makes one HTTP GET request with a fixed timeout
// - Measures the time until the response headers arrive
// - Runs the site's pattern over the body, only for 200 responses
// - Sorts transport failures (timeout, DNS, TLS, ...) into FetchFailure
//
// A non-2xx status is NOT a failure here: it is a normal response whose
// status code gets recorded. Failure means no HTTP response at all.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;

use super::extract::extract_matches;

// The answer we got from a site
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResponse {
    pub status_code: u16,
    /// When the response arrived
    pub timestamp: DateTime<Utc>,
    /// Time from sending the request to receiving the response headers
    pub elapsed: Duration,
    /// Regex matches for 200 responses, None for every other status
    pub extracted_content: Option<String>,
}

/// Why a fetch produced no response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("could not resolve hostname")]
    DnsError,
    #[error("TLS error")]
    SslError,
    #[error("connection failed")]
    Connect,
    #[error("{0}")]
    Other(String),
}

/// Result of one fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(CheckResponse),
    Failure(FetchFailure),
}

// The seam between the scheduler and the network
//
// The scheduler only sees this trait, so tests can swap in a scripted
// fetcher that never touches a socket.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str, pattern: &Regex) -> FetchOutcome;
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    // Creates the fetcher with one timeout for every request
    //
    // Certificate checks are off: monitored sites are often internal hosts
    // with self-signed certificates.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, pattern: &Regex) -> FetchOutcome {
        let start = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failure(categorize_error(e)),
        };

        let elapsed = start.elapsed();
        let timestamp = Utc::now();
        let status = response.status();

        // Only a 200 gets its body read and matched
        let extracted_content = if status == StatusCode::OK {
            match response.text().await {
                Ok(body) => Some(extract_matches(pattern, &body)),
                Err(e) => return FetchOutcome::Failure(categorize_error(e)),
            }
        } else {
            None
        };

        tracing::debug!(url, status_code = status.as_u16(), "got a response from the site");

        FetchOutcome::Success(CheckResponse {
            status_code: status.as_u16(),
            timestamp,
            elapsed,
            extracted_content,
        })
    }
}

// Categorizes different error types from reqwest
fn categorize_error(error: reqwest::Error) -> FetchFailure {
    let error_string = error.to_string();

    if error.is_timeout() {
        FetchFailure::Timeout
    } else if error.is_redirect() {
        FetchFailure::TooManyRedirects
    } else if error.is_connect() {
        // Connection errors often mean DNS issues or host unreachable
        if error_string.contains("dns") {
            FetchFailure::DnsError
        } else {
            FetchFailure::Connect
        }
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        FetchFailure::SslError
    } else {
        FetchFailure::Other(error_string)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::Router;
    use std::net::SocketAddr;

    pub(crate) const PAGE: &str = r#"
        <!DOCTYPE html>
        <html>
        <body>
        <h1>find me plz</h1>
        <p>hehehe find me if you can!</p>
        <p>123</p>
        <p>12</p>
        </body>
        </html>
    "#;

    // Starts a local site on an ephemeral port
    //
    //   GET /           -> 200 with PAGE
    //   GET /missing    -> 404 with a body that also contains "find me"
    //   GET /slow       -> 200 after two seconds
    pub(crate) async fn spawn_site() -> SocketAddr {
        let app = Router::new()
            .route("/", get(|| async { PAGE }))
            .route(
                "/missing",
                get(|| async { (AxumStatus::NOT_FOUND, "find me, but not here") }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "find me"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    // An address nothing listens on
    pub(crate) async fn closed_port() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(7)).unwrap()
    }

    #[tokio::test]
    async fn test_regex_matching() {
        let addr = spawn_site().await;
        let url = format!("http://{}/", addr);

        let cases = [
            ("find me", "find me\nfind me"),
            ("123", "123"),
            ("no match", ""),
            ("", ""),
        ];

        for (pattern, expected) in cases {
            let pattern = Regex::new(pattern).unwrap();
            match fetcher().fetch(&url, &pattern).await {
                FetchOutcome::Success(response) => {
                    assert_eq!(response.status_code, 200);
                    assert_eq!(response.extracted_content.as_deref(), Some(expected));
                }
                FetchOutcome::Failure(f) => panic!("unexpected failure: {}", f),
            }
        }
    }

    #[tokio::test]
    async fn test_non_200_has_no_content() {
        let addr = spawn_site().await;
        let url = format!("http://{}/missing", addr);
        let pattern = Regex::new("find me").unwrap();

        match fetcher().fetch(&url, &pattern).await {
            FetchOutcome::Success(response) => {
                assert_eq!(response.status_code, 404);
                assert_eq!(response.extracted_content, None);
            }
            FetchOutcome::Failure(f) => panic!("unexpected failure: {}", f),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure() {
        let addr = closed_port().await;
        let url = format!("http://{}/", addr);
        let pattern = Regex::new("find me").unwrap();

        let outcome = fetcher().fetch(&url, &pattern).await;
        assert_eq!(outcome, FetchOutcome::Failure(FetchFailure::Connect));
    }

    #[tokio::test]
    async fn test_empty_url_is_failure() {
        let pattern = Regex::new("find me").unwrap();
        let outcome = fetcher().fetch("", &pattern).await;
        assert!(matches!(outcome, FetchOutcome::Failure(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let addr = spawn_site().await;
        let url = format!("http://{}/slow", addr);
        let pattern = Regex::new("find me").unwrap();

        let fetcher = HttpFetcher::new(Duration::from_millis(200)).unwrap();
        let outcome = fetcher.fetch(&url, &pattern).await;
        assert_eq!(outcome, FetchOutcome::Failure(FetchFailure::Timeout));
    }
}
