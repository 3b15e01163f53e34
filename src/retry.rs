//! Retry policy for authenticated requests
//!
//! Pure decision logic: given the attempt number and the HTTP status of a
//! failed call, say whether to re-authenticate, back off, or give up.

use reqwest::StatusCode;
use std::time::Duration;

/// What the executor should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Refresh or re-login, then retry immediately
    Reauthenticate,
    /// Wait, then retry
    Backoff(Duration),
    /// Propagate the error to the caller
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed beyond the first
    pub max_retries: u32,
    /// Delay before the first backoff retry; doubles with each attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// `2^attempt * base_delay`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }

    pub fn decide(&self, attempt: u32, status: StatusCode) -> RetryDecision {
        if status == StatusCode::UNAUTHORIZED && attempt == 0 {
            return RetryDecision::Reauthenticate;
        }

        let transient = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
        if transient && attempt < self.max_retries {
            return RetryDecision::Backoff(self.backoff_delay(attempt));
        }

        RetryDecision::GiveUp
    }
}
