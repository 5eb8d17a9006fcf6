// SPDX-FileCopyrightText: 2026 Denuncia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with exponential backoff and a per-attempt deadline.
//!
//! Every attempt runs under `tokio::time::timeout`. An elapsed deadline
//! becomes [`ExtractionError::Timeout`] and is then judged by the same
//! predicate as any other failure.

use std::future::Future;
use std::time::Duration;

use denuncia_core::ExtractionError;
use tracing::{debug, warn};

/// Retry settings for one class of provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Never less than 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Deadline for each individual attempt.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, call_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            call_timeout,
        }
    }

    /// Backoff after the given failed attempt (1-based): `base * 2^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Runs `call` until it succeeds, the predicate rejects the error, or
    /// attempts run out. Returns the last error in the latter two cases.
    pub async fn run<T, F, Fut, P>(
        &self,
        operation: &str,
        should_retry: P,
        mut call: F,
    ) -> Result<T, ExtractionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExtractionError>>,
        P: Fn(&ExtractionError) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = match tokio::time::timeout(self.call_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ExtractionError::Timeout {
                    duration: self.call_timeout,
                }),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt < max_attempts && should_retry(&err) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    fn server_error() -> ExtractionError {
        ExtractionError::Network {
            status: Some(503),
            message: "unavailable".into(),
        }
    }

    #[test]
    fn delays_double_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10), Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_with_backoff() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let counter = calls.clone();
        let result: Result<(), _> = policy
            .run("test", ExtractionError::is_retryable, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(server_error())
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), server_error());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second.
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failure() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result = policy
            .run("test", ExtractionError::is_retryable, || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(server_error())
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_returns_immediately() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result: Result<(), _> = policy
            .run("test", ExtractionError::is_retryable, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ExtractionError::SchemaViolation("not json".into()))
                }
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ExtractionError::SchemaViolation(_)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out_and_is_retried() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1), Duration::from_secs(30));
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result: Result<(), _> = policy
            .run("test", ExtractionError::is_server_error, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(120)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ExtractionError::Timeout { duration } if duration == Duration::from_secs(30)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_predicate_skips_throttling() {
        let policy = RetryPolicy::default();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result: Result<(), _> = policy
            .run("geocode", ExtractionError::is_server_error, || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ExtractionError::Network {
                        status: Some(429),
                        message: "quota".into(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
