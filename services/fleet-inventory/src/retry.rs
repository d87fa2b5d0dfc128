//! Bounded Retry Policy
//!
//! Wraps every outbound cloud API request. Only "service unavailable"
//! outcomes are retried; everything else is handed back on the first try.

use crate::error::CloudError;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retries after the initial attempt
pub const DEFAULT_MAX_RETRY_COUNT: u32 = 5;

const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

/// Retry policy applied to cloud API calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retry_count: u32,
    /// Statuses that trigger a retry
    pub retriable: Vec<StatusCode>,
    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_count: DEFAULT_MAX_RETRY_COUNT,
            retriable: vec![StatusCode::SERVICE_UNAVAILABLE],
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retry_count: u32) -> Self {
        Self {
            max_retry_count,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts this policy will make before giving up
    pub fn max_attempts(&self) -> u32 {
        self.max_retry_count.saturating_add(1)
    }

    pub fn is_retriable(&self, status: StatusCode) -> bool {
        self.retriable.contains(&status)
    }

    /// Send the request built by `build`, retrying on unavailability
    ///
    /// `build` is invoked once per attempt. Non-retriable error statuses are
    /// returned as a `Response` for the caller to interpret.
    pub async fn execute<F>(&self, url: &str, build: F) -> Result<Response, CloudError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let reason = match build().send().await {
                Ok(response) if self.is_retriable(response.status()) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    format!("{} {}", status, body.trim())
                }
                Ok(response) => {
                    debug!(url, attempt, status = %response.status(), "Request completed");
                    return Ok(response);
                }
                // Connection-level failures count as unavailability
                Err(e) if e.is_connect() || e.is_timeout() => e.to_string(),
                Err(source) => {
                    return Err(CloudError::Transport {
                        url: url.to_string(),
                        source,
                    })
                }
            };

            if attempt >= self.max_attempts() {
                return Err(CloudError::Unavailable {
                    url: url.to_string(),
                    attempts: attempt,
                    message: reason,
                });
            }

            warn!(
                url,
                attempt,
                max_attempts = self.max_attempts(),
                reason = %reason,
                "Cloud API unavailable, retrying"
            );

            if !self.backoff.is_zero() {
                sleep(self.backoff).await;
            }
        }
    }
}
