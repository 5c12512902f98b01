//! Retry policy for overwriting the installed binary.
//!
//! The wallet that was running a moment ago may still hold a handle on its
//! binary, so the copy is retried with a countdown schedule: with the defaults
//! the waits between five attempts are 5s, 4s, 3s and 2s. There is no wait after
//! the final attempt.
//!
//! # Retry Strategy
//!
//! - Attempts: 5
//! - First delay: 5s
//! - Each later delay: 1s shorter, never below zero
//! - Total wait when only the last attempt succeeds: 14s

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;

/// Countdown retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceRetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Delay before the second attempt
    pub first_delay: Duration,
    /// Amount each later delay shrinks by
    pub step: Duration,
}

impl Default for ReplaceRetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl ReplaceRetryPolicy {
    /// Build the schedule from configuration.
    #[must_use]
    pub const fn from_config(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts,
            first_delay: Duration::from_millis(config.first_delay_ms),
            step: Duration::from_millis(config.step_ms),
        }
    }

    /// Delays slept between attempts, one fewer than the number of attempts.
    pub fn delays(self) -> impl Iterator<Item = Duration> {
        let Self {
            attempts,
            first_delay,
            step,
        } = self;
        (0..attempts.saturating_sub(1)).map(move |i| first_delay.saturating_sub(step.saturating_mul(i)))
    }
}

/// Run `action` until it succeeds or the policy's attempts are used up.
///
/// Returns the last error when every attempt fails.
pub async fn retry_with_countdown<T, E, F, Fut>(policy: &ReplaceRetryPolicy, mut action: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let total = policy.attempts.max(1);
    let mut attempt = 0u32;

    tokio_retry::Retry::spawn(policy.delays(), || {
        attempt += 1;
        let current = attempt;
        let fut = action();
        async move {
            fut.await.map_err(|e| {
                if current < total {
                    tracing::warn!("Attempt {current}/{total} failed, retrying: {e}");
                } else {
                    tracing::error!("Attempt {current}/{total} failed, giving up: {e}");
                }
                e
            })
        }
    })
    .await
}
