//! Provider-agnostic retry wrapper with linear backoff and terminal
//! error classification.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::gateway::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay unit; the sleep after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Runs `attempt` until it succeeds or the policy's ceiling is reached.
///
/// `attempt` receives the 1-based attempt index. Every failure is retried;
/// classification only happens once attempts are exhausted, where
/// `is_rate_limited` decides between `QuotaExceeded` and `Failure` based on
/// the last error alone.
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    mut attempt: F,
    is_rate_limited: C,
) -> Result<T, GenerationError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    C: Fn(&E) -> bool,
{
    let mut last_error: Option<E> = None;

    for n in 1..=policy.max_attempts {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("Generation attempt {}/{} failed: {}", n, policy.max_attempts, e);
                if n < policy.max_attempts {
                    tokio::time::sleep(policy.delay_after(n)).await;
                }
                last_error = Some(e);
            }
        }
    }

    let attempts = policy.max_attempts;
    Err(match last_error {
        Some(e) if is_rate_limited(&e) => GenerationError::QuotaExceeded {
            attempts,
            message: e.to_string(),
        },
        Some(e) => GenerationError::Failure {
            attempts,
            message: e.to_string(),
        },
        None => GenerationError::Failure {
            attempts,
            message: "retry policy allows no attempts".to_string(),
        },
    })
}
