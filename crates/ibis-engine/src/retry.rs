//! Bounded retry with exponential backoff

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Attempt budget and backoff schedule
///
/// Attempt `k` (0-based) that fails is followed by a sleep of
/// `base_delay_ms * 2^k` before attempt `k + 1`. No sleep follows the last
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failure
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    /// Create a policy
    #[inline]
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
        }
    }

    /// Compensating-delete schedule: 3 attempts, 100ms doubling
    #[inline]
    #[must_use]
    pub const fn cleanup() -> Self {
        Self::new(3, 100)
    }

    /// Backoff after failed attempt `attempt` (0-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(20);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Run `op` until it succeeds or the budget is spent
    ///
    /// `op` receives the 0-based attempt number. On success the number of
    /// attempts used is returned alongside the value.
    ///
    /// # Errors
    /// [`RetryExhausted`] carrying the last error once every attempt failed.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<(T, u32), RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_if(op, |_| true).await
    }

    /// Like [`run`](Self::run), but stops at the first error for which
    /// `retryable` returns false
    ///
    /// # Errors
    /// [`RetryExhausted`] with the attempts actually made and the last error.
    pub async fn run_if<T, E, F, Fut, P>(
        &self,
        mut op: F,
        retryable: P,
    ) -> Result<(T, u32), RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok((value, attempt + 1)),
                Err(last_error) if attempt + 1 >= attempts || !retryable(&last_error) => {
                    return Err(RetryExhausted {
                        attempts: attempt + 1,
                        last_error,
                    });
                }
                Err(_) => {
                    tokio::time::sleep(self.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::cleanup()
    }
}

/// Every attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// Attempts made
    pub attempts: u32,
    /// Error from the final attempt
    pub last_error: E,
}
