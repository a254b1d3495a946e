//! Connect-phase retry policy.
//!
//! # Responsibilities
//! - Decide whether a failed connection attempt may be repeated
//! - Provide the backoff delay before the next attempt
//!
//! # Design Decisions
//! - Only connection establishment is retryable: nothing has been sent yet
//! - A request whose bytes may have left the process is never repeated,
//!   because an encapsulated payload cannot be assumed idempotent
//! - Timeouts during connect are retryable only while the deadline allows

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Bounded retry policy for connection establishment.
#[derive(Debug, Clone)]
pub struct ConnectRetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl ConnectRetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.connect_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are exhausted.
    ///
    /// `attempt` is the 1-based number of the attempt that just failed.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms))
    }
}

impl Default for ConnectRetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_attempts_bounded() {
        let policy = ConnectRetryPolicy::new(&RetryConfig {
            connect_attempts: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
        });
        assert!(policy.next_delay(1).is_some());
        assert!(policy.next_delay(2).is_some());
        assert!(policy.next_delay(3).is_none());
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let policy = ConnectRetryPolicy::new(&RetryConfig {
            connect_attempts: 0,
            ..RetryConfig::default()
        });
        assert!(policy.next_delay(1).is_none());
    }
}
