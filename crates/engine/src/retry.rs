//! Bounded retry with exponential backoff for transactions the database
//! rejected because of a concurrent writer.

use std::time::Duration;

use rand::Rng;

/// Retry policy for serialization conflicts.
///
/// `max_attempts` counts the first attempt too: the default of 3 means one
/// try plus two retries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(20),
            max_delay: Duration::from_millis(500),
        }
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `true` if another attempt is allowed after `attempts` failed ones.
    #[must_use]
    pub const fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Upper bound of the wait after the `retry`-th failure (0-indexed):
    /// `min(initial * 2^retry, max)`.
    #[must_use]
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Base delay with jitter in `[50%, 100%]`, so that callers that collided
    /// do not retry in lockstep.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.5..=1.0);
        self.base_delay(retry).mul_f64(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_three_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new().with_max_attempts(0).max_attempts(), 1);
    }

    #[test]
    fn delay_doubles_and_is_capped() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(50));
        assert_eq!(policy.base_delay(0), Duration::from_millis(10));
        assert_eq!(policy.base_delay(1), Duration::from_millis(20));
        assert_eq!(policy.base_delay(2), Duration::from_millis(40));
        assert_eq!(policy.base_delay(3), Duration::from_millis(50));
        assert_eq!(policy.base_delay(40), Duration::from_millis(50));
    }

    #[test]
    fn jitter_stays_within_half_and_full_delay() {
        let policy = RetryPolicy::new().with_initial_delay(Duration::from_millis(100));
        for _ in 0..50 {
            let d = policy.delay_for_retry(0);
            assert!(d >= Duration::from_millis(49) && d <= Duration::from_millis(100));
        }
    }
}
