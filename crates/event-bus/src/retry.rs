//! Bounded retry policy for event consumption.

use std::time::Duration;

/// Fixed-backoff retry applied to retryable handler failures.
///
/// Configuration, not hard-coded business logic: the api binary reads
/// both knobs from the environment.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per handler per message, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given attempts and backoff.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy for tests: same attempt count, negligible backoff.
    pub fn fast() -> Self {
        Self::new(3, Duration::from_millis(1))
    }
}

impl Default for RetryPolicy {
    /// 3 attempts with a fixed 1-second backoff.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
