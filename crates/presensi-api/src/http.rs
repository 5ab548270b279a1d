//! Transport-only HTTP client with bounded retries.
//!
//! # Design Principles
//!
//! - **Fixed retry budget**: 3 attempts with a fixed inter-attempt delay
//!   (1000 ms for mutating calls, 500 ms for reads). No exponential backoff.
//! - **Full reconnect between attempts**: a fresh `reqwest::Client` is built
//!   per attempt so a stale connection from a failed attempt is never reused.
//! - **Any status is success**: receiving an HTTP response, 4xx/5xx included,
//!   ends the retry loop. Only transport-level failures (no response, connect
//!   error, timeout) retry.
//! - **No payload interpretation**: bodies are returned verbatim; semantics
//!   live in the gateway layer.
//!
//! The worst case a single call can block the cooperative loop is
//! `attempts * timeout + (attempts - 1) * delay`; the defaults bound this at
//! 17 seconds for a mutating call.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;
use presensi_core::constants::{
    API_ATTEMPT_TIMEOUT, API_MAX_ATTEMPTS, GET_RETRY_DELAY, POST_RETRY_DELAY,
};

/// HTTP method for [`HttpClient::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Raw HTTP response: status code plus body text.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 200 OK.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Retry budget for a single logical call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Custom policy, used by tests with shortened delays.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Policy for state-changing (POST) calls: 3 attempts, 1000 ms apart.
    #[must_use]
    pub fn mutating() -> Self {
        Self::new(API_MAX_ATTEMPTS, POST_RETRY_DELAY)
    }

    /// Policy for read-only (GET) calls: 3 attempts, 500 ms apart.
    #[must_use]
    pub fn read() -> Self {
        Self::new(API_MAX_ATTEMPTS, GET_RETRY_DELAY)
    }
}

/// HTTP client bound to a base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client for the given base URL with the default per-attempt
    /// timeout (5000 ms). A trailing slash on the base URL is stripped.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, API_ATTEMPT_TIMEOUT)
    }

    /// Create a client with a custom per-attempt timeout.
    #[must_use]
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// The configured base URL (trailing slash stripped).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a base URL has been configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    /// Send a request, retrying transport failures per `retry`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::RetriesExhausted` if no HTTP response was
    /// obtained within the budget. An HTTP error status is returned as
    /// `Ok(HttpResponse)` and never retried.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        retry: RetryPolicy,
    ) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{path}", self.base_url);
        let mut last_error = String::new();

        for attempt in 1..=retry.max_attempts {
            if attempt > 1 {
                debug!(attempt, url = %url, "retrying request");
                tokio::time::sleep(retry.delay).await;
            }

            // Fresh client per attempt: a connection left half-open by a
            // failed attempt must not be reused.
            let client = reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| TransportError::Client(e.to_string()))?;

            let request = match method {
                Method::Get => client.get(&url),
                Method::Post => {
                    let builder = client.post(&url);
                    match body {
                        Some(json) => builder.json(json),
                        None => builder,
                    }
                }
            };

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match response.text().await {
                        Ok(body) => {
                            debug!(?method, path, status, "request completed");
                            return Ok(HttpResponse { status, body });
                        }
                        Err(e) => {
                            warn!(attempt, error = %e, "response body read failed");
                            last_error = e.to_string();
                        }
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "request failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(TransportError::RetriesExhausted {
            attempts: retry.max_attempts,
            last_error,
        })
    }
}
