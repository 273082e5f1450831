//! Backoff schedule for gateway attempts.

use std::time::Duration;

/// Exponential backoff: attempt `k` (0-based) that fails waits
/// `initial * growth^k` before attempt `k + 1`. No wait follows the last
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub growth: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_secs(5),
            growth: 1.5,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sleep after failed attempt `attempt`, or `None` if it was the last.
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts.max(1) {
            return None;
        }
        let factor = self.growth.max(1.0).powi(attempt as i32);
        Some(self.initial_backoff.mul_f64(factor))
    }

    /// Sum of every backoff in a fully failing sequence.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts)
            .filter_map(|k| self.backoff_after(k))
            .sum()
    }
}
