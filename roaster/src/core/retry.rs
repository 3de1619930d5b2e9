//! Retry policy for transient pipeline steps.

use std::time::Duration;

/// Fixed-delay retry policy: no jitter, no growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Three attempts, five seconds apart.
    pub const TRANSIENT: RetryPolicy = RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_secs(5),
    };

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-indexed), or `None`
    /// when the attempt budget is spent.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::TRANSIENT
    }
}
