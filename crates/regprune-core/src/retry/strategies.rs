//! Retry delay strategies and predicates

use crate::types::{RetryPolicy, RetryStrategy};
use rand::Rng;
use std::time::Duration;

/// Calculate the delay before the next retry attempt
///
/// `attempt` is 1-indexed. With `jitter`, up to 25% is added on top of
/// the capped delay.
///
/// ```rust
/// use regprune_core::retry::calculate_delay;
/// use regprune_core::types::{RetryPolicy, RetryStrategy};
///
/// let policy = RetryPolicy {
///     max_attempts: 3,
///     strategy: RetryStrategy::ExponentialBackoff,
///     backoff_multiplier: 2.0,
///     initial_delay_ms: 1000,
///     max_delay_ms: 30000,
/// };
///
/// assert_eq!(calculate_delay(&policy, 1, false).as_millis(), 1000);
/// assert_eq!(calculate_delay(&policy, 2, false).as_millis(), 2000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let base_delay_ms = match policy.strategy {
        RetryStrategy::None => 0,

        RetryStrategy::FixedDelay => policy.initial_delay_ms,

        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powf(attempt_index as f64);
            (policy.initial_delay_ms as f64 * multiplier) as u64
        }

        RetryStrategy::LinearBackoff => policy.initial_delay_ms * (attempt_index as u64 + 1),
    };

    let capped_delay_ms = base_delay_ms.min(policy.max_delay_ms);

    let final_delay_ms = if jitter && capped_delay_ms > 0 {
        let jitter_range = capped_delay_ms / 4;
        capped_delay_ms + rand::rng().random_range(0..=jitter_range)
    } else {
        capped_delay_ms
    };

    Duration::from_millis(final_delay_ms)
}

/// Decides whether a failed attempt should be retried
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Every error is retryable
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// Errors that may carry an HTTP status code
pub trait HttpStatusError {
    /// The HTTP status code, or `None` for transport-level failures
    fn status_code(&self) -> Option<u16>;
}

/// Retries transport failures and a fixed set of transient HTTP statuses
#[derive(Debug, Clone)]
pub struct HttpStatusPredicate {
    retryable_codes: Vec<u16>,
}

impl HttpStatusPredicate {
    /// Retry on 408, 425, 429, 500, 502, 503 and 504
    pub fn default_http() -> Self {
        Self {
            retryable_codes: vec![408, 425, 429, 500, 502, 503, 504],
        }
    }

    pub fn is_retryable_code(&self, code: u16) -> bool {
        self.retryable_codes.contains(&code)
    }
}

impl Default for HttpStatusPredicate {
    fn default() -> Self {
        Self::default_http()
    }
}

impl<E: HttpStatusError> RetryPredicate<E> for HttpStatusPredicate {
    fn should_retry(&self, error: &E) -> bool {
        error
            .status_code()
            .map(|code| self.is_retryable_code(code))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(strategy: RetryStrategy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            strategy,
            backoff_multiplier: 2.0,
            initial_delay_ms: 100,
            max_delay_ms: 1000,
        }
    }

    #[test]
    fn test_none_strategy() {
        let p = policy(RetryStrategy::None);
        for attempt in 1..=5 {
            assert_eq!(calculate_delay(&p, attempt, true), Duration::ZERO);
        }
    }

    #[test]
    fn test_fixed_strategy() {
        let p = policy(RetryStrategy::FixedDelay);
        assert_eq!(calculate_delay(&p, 1, false), Duration::from_millis(100));
        assert_eq!(calculate_delay(&p, 4, false), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_strategy_caps() {
        let p = policy(RetryStrategy::ExponentialBackoff);
        assert_eq!(calculate_delay(&p, 1, false), Duration::from_millis(100));
        assert_eq!(calculate_delay(&p, 2, false), Duration::from_millis(200));
        assert_eq!(calculate_delay(&p, 3, false), Duration::from_millis(400));
        assert_eq!(calculate_delay(&p, 5, false), Duration::from_millis(1000));
    }

    #[test]
    fn test_linear_strategy() {
        let p = policy(RetryStrategy::LinearBackoff);
        assert_eq!(calculate_delay(&p, 1, false), Duration::from_millis(100));
        assert_eq!(calculate_delay(&p, 3, false), Duration::from_millis(300));
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let p = policy(RetryStrategy::FixedDelay);
        for _ in 0..50 {
            let delay = calculate_delay(&p, 1, true).as_millis();
            assert!((100..=125).contains(&delay), "delay out of range: {}", delay);
        }
    }

    struct Status(Option<u16>);

    impl HttpStatusError for Status {
        fn status_code(&self) -> Option<u16> {
            self.0
        }
    }

    #[test]
    fn test_http_status_predicate() {
        let pred = HttpStatusPredicate::default_http();
        assert!(pred.should_retry(&Status(Some(503))));
        assert!(pred.should_retry(&Status(Some(429))));
        assert!(!pred.should_retry(&Status(Some(404))));
        assert!(!pred.should_retry(&Status(Some(401))));
        assert!(pred.should_retry(&Status(None)));
    }

    #[test]
    fn test_always_retry() {
        assert!(AlwaysRetry.should_retry("x"));
        assert!(AlwaysRetry.should_retry(&Status(Some(400))));
    }
}
