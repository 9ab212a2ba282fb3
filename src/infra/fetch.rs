//! Single upstream GET with a hard deadline and an optional retry.

use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{DashboardConfig, MAX_RETRIES};

/// How much of a failing response body is kept for diagnostics.
pub const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq)]
pub struct FetchPolicy {
    /// Deadline for one attempt, covering both the request and the body.
    pub timeout: Duration,
    /// Extra attempts after a timeout or connection failure (0 or 1).
    pub retries: u8,
    pub retry_delay: Duration,
}

impl FetchPolicy {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            timeout: config.timeout,
            retries: config.retries.min(MAX_RETRIES),
            retry_delay: config.retry_delay,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("downstream unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("downstream returned HTTP {status}: {excerpt}")]
    Status { status: u16, excerpt: String },
    #[error("downstream returned invalid JSON: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Terminal failure classes, as labelled in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    HttpError,
    ParseError,
    NetworkError,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::HttpError => "http_error",
            FailureKind::ParseError => "parse_error",
            FailureKind::NetworkError => "network_error",
        }
    }
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout(_) => FailureKind::Timeout,
            FetchError::Network(_) => FailureKind::NetworkError,
            FetchError::Status { .. } => FailureKind::HttpError,
            FetchError::Parse(_) => FailureKind::ParseError,
        }
    }

    /// Timeouts and failures to connect are worth another attempt; an
    /// upstream that answered (with an error status or bad JSON) is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) => true,
            FetchError::Network(err) => err.is_connect() || err.is_timeout(),
            FetchError::Status { .. } | FetchError::Parse(_) => false,
        }
    }
}

/// Outcome of one wrapped call plus what diagnostics want to know about it.
#[derive(Debug)]
pub struct FetchReport {
    pub result: Result<Value, FetchError>,
    pub attempts: u32,
    pub elapsed: Duration,
}

pub async fn fetch_json(client: &Client, url: Url, policy: &FetchPolicy) -> FetchReport {
    let started = Instant::now();
    let max_attempts = u32::from(policy.retries.min(MAX_RETRIES)) + 1;
    let mut attempts = 0;

    let result = loop {
        attempts += 1;
        let outcome = fetch_once(client, url.clone(), policy.timeout).await;
        match outcome {
            Err(err) if err.is_retryable() && attempts < max_attempts => {
                debug!(
                    "[fetch] {url} attempt {attempts}/{max_attempts} failed: {err}; retrying in {:?}",
                    policy.retry_delay
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            other => break other,
        }
    };

    FetchReport {
        result,
        attempts,
        elapsed: started.elapsed(),
    }
}

/// Dropping the inner future on timeout aborts the in-flight request and
/// releases its connection.
async fn fetch_once(client: &Client, url: Url, timeout: Duration) -> Result<Value, FetchError> {
    match tokio::time::timeout(timeout, request(client, url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    }
}

async fn request(client: &Client, url: Url) -> Result<Value, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status: status.as_u16(),
            excerpt: excerpt(&body),
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(FetchError::Parse)
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::mock::{MockUpstream, Reply};

    fn policy(timeout_ms: u64, retries: u8) -> FetchPolicy {
        FetchPolicy {
            timeout: Duration::from_millis(timeout_ms),
            retries,
            retry_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn parses_json_on_success() {
        let upstream = MockUpstream::start(vec![("/ok", Reply::json(200, r#"{"a": 1}"#))]);
        let report = fetch_json(&Client::new(), upstream.url("/ok"), &policy(2_000, 0)).await;
        assert_eq!(report.result.unwrap(), serde_json::json!({"a": 1}));
        assert_eq!(report.attempts, 1);
    }

    #[tokio::test]
    async fn non_success_status_keeps_truncated_body() {
        let body = "x".repeat(500);
        let upstream = MockUpstream::start(vec![("/boom", Reply::raw(503, &body))]);
        let report = fetch_json(&Client::new(), upstream.url("/boom"), &policy(2_000, 1)).await;

        match report.result {
            Err(FetchError::Status { status, excerpt }) => {
                assert_eq!(status, 503);
                assert_eq!(excerpt.chars().count(), BODY_EXCERPT_CHARS);
            }
            other => panic!("expected status error, got {other:?}"),
        }
        // Upstream answered, so no retry.
        assert_eq!(report.attempts, 1);
        assert_eq!(upstream.hits("/boom"), 1);
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let upstream = MockUpstream::start(vec![("/html", Reply::raw(200, "<html>oops</html>"))]);
        let report = fetch_json(&Client::new(), upstream.url("/html"), &policy(2_000, 1)).await;
        let err = report.result.unwrap_err();
        assert_eq!(err.kind(), FailureKind::ParseError);
        assert_eq!(report.attempts, 1);
    }

    #[tokio::test]
    async fn slow_upstream_times_out_within_bound() {
        let upstream = MockUpstream::start(vec![("/slow", Reply::Hang)]);
        let started = Instant::now();
        let report = fetch_json(&Client::new(), upstream.url("/slow"), &policy(200, 0)).await;

        assert_eq!(report.result.unwrap_err().kind(), FailureKind::Timeout);
        assert_eq!(report.attempts, 1);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn retries_once_after_timeout() {
        let upstream = MockUpstream::start(vec![(
            "/flaky",
            Reply::HangOnce(r#"{"ok": true}"#.to_string()),
        )]);
        let report = fetch_json(&Client::new(), upstream.url("/flaky"), &policy(200, 1)).await;

        assert_eq!(report.result.unwrap(), serde_json::json!({"ok": true}));
        assert_eq!(report.attempts, 2);
        assert_eq!(upstream.hits("/flaky"), 2);
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{port}/gone")).unwrap();
        let report = fetch_json(&Client::new(), url, &policy(2_000, 1)).await;

        let err = report.result.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NetworkError);
        assert_eq!(report.attempts, 2);
    }

    #[test]
    fn excerpt_counts_characters_not_bytes() {
        let body = "ж".repeat(300);
        assert_eq!(excerpt(&body).chars().count(), BODY_EXCERPT_CHARS);
    }
}
