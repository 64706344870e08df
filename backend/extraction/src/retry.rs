//! Bounded retry combinator for extraction attempts.
//!
//! Attempts run strictly one after another with no delay in between; the
//! first success ends the loop and the last failure is reported on exhaustion.

use std::fmt::Display;
use std::future::Future;

use tracing::{debug, warn};

/// Attempts allowed per extraction request.
pub const MAX_EXTRACTION_ATTEMPTS: u32 = 3;

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. Values below 1 act as 1.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_EXTRACTION_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-indexed).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }
}

/// Every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `attempt` until it succeeds or the policy is exhausted.
///
/// The closure receives the 1-indexed attempt number.
pub async fn with_retries<T, E, F, Fut>(
    policy: RetryPolicy,
    mut attempt: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut number = 1;
    loop {
        match attempt(number).await {
            Ok(value) => {
                debug!(attempt = number, "Attempt succeeded");
                return Ok(value);
            }
            Err(error) if policy.should_retry(number) => {
                warn!(
                    attempt = number,
                    max = policy.max_attempts,
                    error = %error,
                    "Attempt failed, retrying"
                );
                number += 1;
            }
            Err(error) => {
                warn!(attempt = number, error = %error, "Retry policy exhausted");
                return Err(RetryExhausted {
                    attempts: number,
                    last: error,
                });
            }
        }
    }
}
