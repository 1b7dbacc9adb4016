//! Blocking HTTP client shared by the feed loader and the lookup adapter.
//!
//! Handles timeout, retry with exponential backoff, and classification of
//! the final failure. Callers pass a request-building closure which is
//! invoked once per attempt.

use std::fmt;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};

pub(crate) const USER_AGENT: &str = concat!("vinrec/", env!("CARGO_PKG_VERSION"));

/// Upper bound on a server-requested Retry-After delay.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Why a request ultimately failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HttpFailure {
    /// Non-success status on the final attempt.
    Status(u16),
    /// Connect/timeout/TLS error on the final attempt.
    Transport(String),
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Transport(msg) => write!(f, "{msg}"),
        }
    }
}

pub(crate) struct HttpClient {
    http: Client,
    source_name: String,
    max_retries: u32,
    backoff: Duration,
    max_retry_after: Duration,
}

impl HttpClient {
    pub(crate) fn new(source_name: &str, timeout_secs: u64, max_retries: u32) -> Result<Self, String> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
            max_retries,
            backoff: Duration::from_secs(1),
            max_retry_after: MAX_RETRY_AFTER,
        })
    }

    /// Shorten the initial backoff (tests).
    #[cfg(test)]
    pub(crate) fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_max_retry_after(mut self, cap: Duration) -> Self {
        self.max_retry_after = cap;
        self
    }

    /// Send with retry. 429, 5xx and transport errors are retried up to
    /// `max_retries` times; other 4xx fail immediately. Returns the first
    /// successful response.
    pub(crate) fn send_with_retry(
        &self,
        build_request: impl Fn(&Client) -> RequestBuilder,
    ) -> Result<Response, HttpFailure> {
        let mut backoff = self.backoff;
        let mut attempt = 0u32;

        loop {
            let failure = match build_request(&self.http).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if resp.status().is_success() {
                        return Ok(resp);
                    }
                    if status != 429 && status < 500 {
                        return Err(HttpFailure::Status(status));
                    }
                    if attempt < self.max_retries && status == 429 {
                        if let Some(wait) = retry_after(&resp) {
                            backoff = backoff.max(wait.min(self.max_retry_after));
                        }
                    }
                    HttpFailure::Status(status)
                }
                Err(e) => HttpFailure::Transport(e.to_string()),
            };

            if attempt >= self.max_retries {
                return Err(failure);
            }
            attempt += 1;
            log::warn!(
                "{}: retry {}/{} in {:?} ({})",
                self.source_name,
                attempt,
                self.max_retries,
                backoff,
                failure,
            );
            thread::sleep(backoff);
            backoff *= 2;
        }
    }
}

/// Retry-After in delta-seconds form. HTTP-date values are ignored.
fn retry_after(resp: &Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
