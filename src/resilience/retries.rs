//! Retry logic for Router API calls.
//!
//! # Responsibilities
//! - Decide whether a failed call is retryable
//! - Execute retries with exponential backoff + jitter
//! - Bound the number of attempts
//!
//! # Design Decisions
//! - Transport errors, timeouts and 5xx are retried
//! - 4xx (validation) responses are never retried
//! - Every Router API operation is idempotent, so retrying a write is safe

use std::future::Future;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;
use crate::router_api::{RouterApiError, RouterApiResult};

/// Bounded retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    /// Build a policy from configuration. Disabled retries mean one attempt.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: if config.enabled {
                config.max_attempts.max(1)
            } else {
                1
            },
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, op: &'static str, mut call: F) -> RouterApiResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RouterApiResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && is_retryable(&e) => {
                    let delay = calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms);
                    tracing::warn!(
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Router API call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

pub fn is_retryable(err: &RouterApiError) -> bool {
    err.is_transient()
}
