// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Retry budget and exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::constants::{DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES};

/// Jitter applied on top of the exponential delay between attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Jitter {
    /// Add a uniformly random extra delay in `[0, delay]`
    #[default]
    Full,
    /// Sleep exactly the exponential delay
    None,
}

/// Retry behavior of the fetch-retry engine.
///
/// The delay after failed attempt `n` (1-based) is:
///
/// ```text
/// delay = min(base_delay * 2^(n-1), max_delay)
/// sleep = delay + uniform(0, delay)      // Jitter::Full
/// ```
///
/// # Example
///
/// ```rust
/// use paymentscan::{Jitter, RetryPolicy};
/// use std::time::Duration;
///
/// // Up to 3 attempts with full jitter
/// let policy = RetryPolicy::new();
///
/// // Or with custom configuration
/// let policy = RetryPolicy::builder()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(200))
///     .max_delay(Duration::from_secs(60))
///     .jitter(Jitter::None)
///     .build();
/// assert_eq!(policy.delay_for(3), Duration::from_millis(800));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the initial request included.
    max_retries: u32,
    /// Base delay for exponential backoff.
    base_delay: Duration,
    /// Maximum exponential delay between attempts (before jitter).
    max_delay: Duration,
    jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: Jitter::Full,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with default settings.
    ///
    /// Default settings:
    /// - 3 attempts
    /// - 500ms base delay
    /// - 10s maximum delay
    /// - full jitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for customizing the policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Creates a policy with aggressive settings.
    ///
    /// This preset uses:
    /// - 5 attempts
    /// - 50ms base delay
    /// - 2s maximum delay
    ///
    /// Suitable for interactive callers that prefer quick retries.
    pub fn aggressive() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            jitter: Jitter::Full,
        }
    }

    /// Creates a policy with conservative settings.
    ///
    /// This preset uses:
    /// - 3 attempts
    /// - 1s base delay
    /// - 30s maximum delay
    ///
    /// Suitable for shared public Horizon instances that need time to recover.
    pub fn conservative() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: Jitter::Full,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Sleep before the attempt following failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = exponential_delay(attempt, self.base_delay, self.max_delay);
        match self.jitter {
            Jitter::None => delay,
            Jitter::Full => delay + full_jitter(delay),
        }
    }
}

/// Builder for configuring a [`RetryPolicy`].
#[derive(Clone, Debug, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total number of attempts (at least 1).
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries.max(1);
        self
    }

    /// Sets the base delay for exponential backoff.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    /// Sets the maximum delay between attempts.
    ///
    /// Delays are capped at this value before jitter is added.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.policy.jitter = jitter;
        self
    }

    /// Builds the configured [`RetryPolicy`].
    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

/// Exponential delay for a 1-based attempt number.
///
/// `min(base * 2^(attempt-1), max)`; attempt 0 is treated as 1. Used both by
/// the engine between attempts and by the backoff gate.
pub(crate) fn exponential_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1);
    2u32.checked_pow(exponent)
        .and_then(|multiplier| base.checked_mul(multiplier))
        .map_or(max, |delay| delay.min(max))
}

/// Uniform random duration in `[0, delay]`.
fn full_jitter(delay: Duration) -> Duration {
    if delay.is_zero() {
        return Duration::ZERO;
    }
    rand::thread_rng().gen_range(Duration::ZERO..=delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.max_retries(), DEFAULT_MAX_RETRIES);
        assert_eq!(policy.base_delay(), DEFAULT_BASE_DELAY);
        assert_eq!(policy.max_delay(), DEFAULT_MAX_DELAY);
        assert_eq!(policy.jitter(), Jitter::Full);
    }

    #[test]
    fn test_retry_policy_builder() {
        let policy = RetryPolicy::builder()
            .max_retries(5)
            .base_delay(Duration::from_millis(200))
            .max_delay(Duration::from_secs(60))
            .jitter(Jitter::None)
            .build();

        assert_eq!(policy.max_retries(), 5);
        assert_eq!(policy.base_delay(), Duration::from_millis(200));
        assert_eq!(policy.max_delay(), Duration::from_secs(60));
        assert_eq!(policy.jitter(), Jitter::None);
    }

    #[test]
    fn test_builder_rejects_zero_attempts() {
        let policy = RetryPolicy::builder().max_retries(0).build();
        assert_eq!(policy.max_retries(), 1);
    }

    #[test]
    fn test_presets() {
        let aggressive = RetryPolicy::aggressive();
        assert_eq!(aggressive.max_retries(), 5);
        assert_eq!(aggressive.base_delay(), Duration::from_millis(50));

        let conservative = RetryPolicy::conservative();
        assert_eq!(conservative.max_retries(), 3);
        assert_eq!(conservative.max_delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_exponential_delay() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(10);

        assert_eq!(exponential_delay(1, base, max), Duration::from_millis(100));
        assert_eq!(exponential_delay(2, base, max), Duration::from_millis(200));
        assert_eq!(exponential_delay(3, base, max), Duration::from_millis(400));
        assert_eq!(exponential_delay(4, base, max), Duration::from_millis(800));
        // Attempt 0 behaves like the first attempt
        assert_eq!(exponential_delay(0, base, max), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_delay_capped() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(500);

        assert_eq!(exponential_delay(4, base, max), Duration::from_millis(500));
        assert_eq!(exponential_delay(11, base, max), Duration::from_millis(500));
    }

    #[test]
    fn test_exponential_delay_overflow_protection() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(60);
        assert_eq!(exponential_delay(200, base, max), Duration::from_secs(60));
    }

    #[test]
    fn test_exponential_delay_keeps_sub_millisecond_precision() {
        let max = Duration::from_secs(1);

        assert_eq!(
            exponential_delay(1, Duration::from_micros(900), max),
            Duration::from_micros(900)
        );
        assert_eq!(
            exponential_delay(2, Duration::from_micros(1500), max),
            Duration::from_micros(3000)
        );
        assert_eq!(
            exponential_delay(3, Duration::from_micros(100), Duration::from_micros(250)),
            Duration::from_micros(250)
        );
    }

    #[test]
    fn test_full_jitter_sub_millisecond_bounds() {
        let policy = RetryPolicy::builder()
            .base_delay(Duration::from_micros(900))
            .jitter(Jitter::Full)
            .build();

        for _ in 0..200 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_micros(900), "{delay:?}");
            assert!(delay <= Duration::from_micros(1800), "{delay:?}");
        }
    }

    #[test]
    fn test_full_jitter_bounds() {
        let policy = RetryPolicy::builder()
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_secs(10))
            .jitter(Jitter::Full)
            .build();

        for _ in 0..200 {
            let delay = policy.delay_for(2);
            assert!(delay >= Duration::from_millis(200), "{delay:?}");
            assert!(delay <= Duration::from_millis(400), "{delay:?}");
        }
    }

    #[test]
    fn test_zero_base_delay_has_no_jitter() {
        let policy = RetryPolicy::builder()
            .base_delay(Duration::ZERO)
            .jitter(Jitter::Full)
            .build();
        assert_eq!(policy.delay_for(3), Duration::ZERO);
    }
}
