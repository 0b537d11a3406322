//! Retry policy with exponential backoff
//!
//! Delays are deterministic (no jitter): before retry `n` (1-based) the
//! fetcher waits `initial_backoff * multiplier^(n-1)`.

use crate::config::{seconds, FetchSettings};
use std::time::Duration;

/// How many attempts a page fetch gets and how long to wait between them
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Growth factor of the delay
    pub multiplier: f64,
    /// HTTP statuses worth retrying
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&FetchSettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &FetchSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: seconds(settings.initial_backoff),
            multiplier: settings.backoff_multiplier.max(1.0),
            retryable_statuses: settings.retryable_statuses.clone(),
        }
    }

    /// Delay before retry number `retry` (1 for the first retry)
    ///
    /// Saturates instead of overflowing for large retry counts.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        seconds(self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent))
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}
