//! Retry delay strategies and predicates

use crate::types::{RetryPolicy, RetryStrategy};
use std::time::Duration;

/// Calculate the delay before the attempt following `attempt` (1-indexed).
///
/// The result is capped at `max_delay_ms`.
///
/// ```rust
/// use plughub_core::retry::calculate_delay;
/// use plughub_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::fixed(3, 5000);
/// assert_eq!(calculate_delay(&policy, 1).as_millis(), 5000);
/// assert_eq!(calculate_delay(&policy, 2).as_millis(), 5000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let attempt_index = attempt.saturating_sub(1);

    let base_delay_ms = match policy.strategy {
        RetryStrategy::None => 0,
        RetryStrategy::FixedDelay => policy.initial_delay_ms,
        RetryStrategy::ExponentialBackoff => {
            let multiplier = policy.backoff_multiplier.powf(attempt_index as f64);
            (policy.initial_delay_ms as f64 * multiplier) as u64
        }
        RetryStrategy::LinearBackoff => policy
            .initial_delay_ms
            .saturating_mul(attempt_index as u64 + 1),
    };

    Duration::from_millis(base_delay_ms.min(policy.max_delay_ms))
}

/// Decides whether an error deserves another attempt
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Every error is retried
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// Retries only transient failures of [`crate::Error`].
///
/// A 404, a malformed URL or a bad payload stops immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientErrorPredicate;

impl RetryPredicate<crate::error::Error> for TransientErrorPredicate {
    fn should_retry(&self, error: &crate::error::Error) -> bool {
        error.is_retryable()
    }
}
