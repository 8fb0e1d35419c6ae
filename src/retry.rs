//! Retry policies consulted by the pipeline's retry loop.
//!
//! The `Jitter` policy is the default, matching the Open Question decision
//! recorded in DESIGN.md: treat 5xx, 429/`ThrottlingException`, and every
//! retryable transport failure as retryable, deferring to
//! [`SdkError::is_retryable`](crate::error::SdkError::is_retryable) for the
//! classification itself.

use std::time::Duration;

use rand::Rng;

use crate::error::SdkError;

/// What the pipeline should do after an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Stop,
    RetryAfter(Duration),
}

/// Consulted with `(attempt, error)` after every failed attempt.
pub trait RetryPolicy: Send + Sync {
    fn decide(&self, attempt: u32, error: &SdkError) -> RetryDecision;
}

/// Never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn decide(&self, _attempt: u32, _error: &SdkError) -> RetryDecision {
        RetryDecision::Stop
    }
}

/// `delay = base * 2^attempt`, clamped to `max`.
#[derive(Debug, Clone, Copy)]
pub struct Exponential {
    pub base: Duration,
    pub max: Duration,
    pub max_retries: u32,
}

impl Exponential {
    pub fn new(base: Duration, max: Duration, max_retries: u32) -> Self {
        Self {
            base,
            max,
            max_retries,
        }
    }

    fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.checked_mul(factor).unwrap_or(self.max).min(self.max)
    }
}

impl RetryPolicy for Exponential {
    fn decide(&self, attempt: u32, error: &SdkError) -> RetryDecision {
        if attempt >= self.max_retries || !error.is_retryable() {
            return RetryDecision::Stop;
        }
        RetryDecision::RetryAfter(self.ceiling(attempt))
    }
}

/// `delay = uniform(0, base*2^attempt)`, clamped to `max`. The default
/// retry policy for every pipeline execution unless a service overrides it.
#[derive(Debug, Clone, Copy)]
pub struct Jitter {
    pub base: Duration,
    pub max: Duration,
    pub max_retries: u32,
}

impl Jitter {
    pub fn new(base: Duration, max: Duration, max_retries: u32) -> Self {
        Self {
            base,
            max,
            max_retries,
        }
    }

    fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.checked_mul(factor).unwrap_or(self.max).min(self.max)
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(20), 3)
    }
}

impl RetryPolicy for Jitter {
    fn decide(&self, attempt: u32, error: &SdkError) -> RetryDecision {
        if attempt >= self.max_retries || !error.is_retryable() {
            return RetryDecision::Stop;
        }
        let ceiling_millis = self.ceiling(attempt).as_millis().max(1) as u64;
        let jittered = rand::thread_rng().gen_range(0..=ceiling_millis);
        RetryDecision::RetryAfter(Duration::from_millis(jittered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttling() -> SdkError {
        SdkError::Response {
            code: "ThrottlingException".to_string(),
            context: crate::error::ErrorContext::default(),
        }
    }

    fn server_error() -> SdkError {
        SdkError::Server {
            code: "InternalError".to_string(),
            context: crate::error::ErrorContext::default(),
        }
    }

    #[test]
    fn no_retry_always_stops() {
        assert_eq!(NoRetry.decide(0, &server_error()), RetryDecision::Stop);
    }

    #[test]
    fn exponential_clamps_to_max() {
        let policy = Exponential::new(Duration::from_secs(1), Duration::from_secs(4), 10);
        match policy.decide(5, &server_error()) {
            RetryDecision::RetryAfter(d) => assert_eq!(d, Duration::from_secs(4)),
            RetryDecision::Stop => panic!("expected a retry"),
        }
    }

    #[test]
    fn exponential_stops_after_max_retries() {
        let policy = Exponential::new(Duration::from_secs(1), Duration::from_secs(4), 2);
        assert_eq!(policy.decide(2, &server_error()), RetryDecision::Stop);
    }

    #[test]
    fn jitter_bound_stays_within_min_and_max() {
        // Seed scenario 5: min=2s, max=120s, attempt=1..10 -> every wait in [0, min(120s, 2s*2^attempt)].
        let policy = Jitter::new(Duration::from_secs(2), Duration::from_secs(120), 10);
        for attempt in 0..9 {
            let ceiling = policy.ceiling(attempt);
            match policy.decide(attempt, &server_error()) {
                RetryDecision::RetryAfter(d) => {
                    assert!(d <= ceiling);
                    assert!(d <= Duration::from_secs(120));
                }
                RetryDecision::Stop => panic!("expected a retry at attempt {attempt}"),
            }
        }
    }

    #[test]
    fn jitter_retries_on_throttling() {
        let policy = Jitter::default();
        assert!(matches!(
            policy.decide(0, &throttling()),
            RetryDecision::RetryAfter(_)
        ));
    }

    #[test]
    fn jitter_does_not_retry_non_retryable_errors() {
        let policy = Jitter::default();
        assert_eq!(policy.decide(0, &SdkError::Cancelled), RetryDecision::Stop);
    }
}
