//! Bounded exponential-backoff retry around HTTP requests.
//!
//! Isolates transient backend flakiness from the console: transport errors
//! and 5xx responses are retried with a growing delay; anything else is
//! returned to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;

use reqwest::Response;
use tracing::{debug, warn};

use crate::error::AdminError;

/// Backoff growth factor per attempt.
const BACKOFF_MULTIPLIER: f64 = 1.5;

/// Retry schedule configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling for the growing delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// The delay slept before each retry, in order. Non-decreasing and
    /// capped at `max_delay`; one entry per retry (attempts minus one).
    pub fn delays(&self) -> Vec<Duration> {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        let mut delays = Vec::with_capacity(retries);
        let mut delay = self.base_delay;
        for _ in 0..retries {
            delays.push(delay.min(self.max_delay));
            delay = delay.mul_f64(BACKOFF_MULTIPLIER).min(self.max_delay);
        }
        delays
    }
}

/// Runs a request closure under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryFetcher {
    policy: RetryPolicy,
}

impl RetryFetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Perform `op` until it yields a non-5xx response or attempts run out.
    ///
    /// Transport failures and 5xx responses sleep and retry; the last such
    /// error is re-raised after exhaustion. Any other response, success or
    /// a 4xx the caller must interpret, returns immediately.
    pub async fn execute<F, Fut>(&self, mut op: F) -> Result<Response, AdminError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Response, reqwest::Error>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.base_delay;
        let mut last_err = None;

        for attempt in 1..=attempts {
            match op().await {
                Ok(response) if response.status().is_server_error() => {
                    let status = response.status().as_u16();
                    let message = response
                        .text()
                        .await
                        .ok()
                        .filter(|body| !body.trim().is_empty())
                        .unwrap_or_else(|| "server error".to_string());
                    warn!(status, attempt, "server error response");
                    last_err = Some(AdminError::Server { status, message });
                }
                Ok(response) => {
                    debug!(status = response.status().as_u16(), attempt, "request settled");
                    return Ok(response);
                }
                Err(err) => {
                    warn!(attempt, error = %err, "transport failure");
                    last_err = Some(AdminError::Transport(err));
                }
            }

            if attempt < attempts {
                debug!(delay_ms = delay.as_millis() as u64, "backing off before retry");
                tokio::time::sleep(delay.min(self.policy.max_delay)).await;
                delay = delay.mul_f64(BACKOFF_MULTIPLIER).min(self.policy.max_delay);
            }
        }

        Err(last_err.unwrap_or(AdminError::Server {
            status: 0,
            message: "no attempts were made".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_by_half_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay: Duration::from_millis(400),
            max_delay: Duration::from_millis(1000),
        };
        let delays = policy.delays();
        assert_eq!(delays.len(), 5);
        assert_eq!(delays[0], Duration::from_millis(400));
        assert_eq!(delays[1], Duration::from_millis(600));
        assert_eq!(delays[2], Duration::from_millis(900));
        assert_eq!(delays[3], Duration::from_millis(1000));
        assert_eq!(delays[4], Duration::from_millis(1000));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn single_attempt_policy_never_sleeps() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        assert!(policy.delays().is_empty());
    }
}
