//! Bounded retry with exponential backoff.
//!
//! The policy is a small state machine: [`RetryPolicy::start`] yields a
//! [`RetryState`] for one operation, and every failure is fed to
//! [`RetryState::on_failure`], which either grants another attempt after a
//! delay or gives up. [`with_retry`] drives an async operation through it.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that can tell whether repeating the operation may succeed.
pub trait Retryable {
    /// `true` for transient failures such as timeouts or server errors.
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How often and how patiently a single operation is retried.
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Begin tracking a fresh operation under this policy.
    #[must_use]
    pub fn start(&self) -> RetryState {
        RetryState {
            attempt: 1,
            max_attempts: self.max_attempts.max(1),
            backoff: self.initial_backoff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What to do after a failed attempt.
pub enum RetryDecision {
    /// Wait for the given delay, then make another attempt.
    RetryAfter(Duration),
    /// Stop and surface the error.
    GiveUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Progress of one operation through its retry budget.
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    backoff: Duration,
}

impl RetryState {
    /// The attempt currently in flight (1-based).
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure of the current attempt.
    pub fn on_failure(&mut self, retryable: bool) -> RetryDecision {
        if !retryable || self.attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        let delay = self.backoff;
        self.attempt += 1;
        self.backoff = self.backoff.saturating_mul(2);
        RetryDecision::RetryAfter(delay)
    }
}

#[derive(Debug)]
/// Final error of an operation, with the number of attempts spent on it.
pub struct RetryFailure<E> {
    /// Error returned by the last attempt.
    pub error: E,
    /// Attempts made, including the failing one.
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails permanently, or exhausts `policy`.
///
/// # Errors
///
/// Returns the last error together with the attempt count when the operation
/// fails with a non-retryable error or runs out of attempts.
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut state = policy.start();

    loop {
        let error = match operation().await {
            Ok(value) => {
                if state.attempt() > 1 {
                    tracing::info!(attempts = state.attempt(), "request succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        let attempt = state.attempt();
        match state.on_failure(error.is_retryable()) {
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(
                    error = %error,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis(),
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::GiveUp => {
                return Err(RetryFailure {
                    error,
                    attempts: attempt,
                });
            }
        }
    }
}
