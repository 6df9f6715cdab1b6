//! Retry execution engine
//!
//! Runs a blocking operation until it succeeds, the predicate rejects its
//! error, the policy's attempt budget is spent, or the cancel flag is raised.

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::RetryPolicy;

use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::strategies::{calculate_delay, AlwaysRetry, RetryPredicate};

/// Longest uninterrupted sleep while waiting between attempts
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Builder for configuring a [`RetryExecutor`]
///
/// ```rust
/// use plughub_core::retry::{RetryExecutorBuilder, TracingObserver, TransientErrorPredicate};
/// use plughub_core::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::fixed(3, 5000))
///     .with_predicate(TransientErrorPredicate)
///     .with_observer(TracingObserver::new("download"))
///     .build();
/// ```
pub struct RetryExecutorBuilder<P = AlwaysRetry, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for RetryExecutorBuilder<AlwaysRetry, NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<AlwaysRetry, NoOpObserver> {
    /// Default policy, every error retried, no observer
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            predicate: AlwaysRetry,
            observer: NoOpObserver,
            cancel: None,
        }
    }
}

impl<P, O> RetryExecutorBuilder<P, O> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<P2, O> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate,
            observer: self.observer,
            cancel: self.cancel,
        }
    }

    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<P, O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            cancel: self.cancel,
        }
    }

    /// Stop retrying once `flag` is set; checked between attempts and while sleeping
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn build(self) -> RetryExecutor<P, O> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
            cancel: self.cancel,
        }
    }
}

/// A retry executor with configurable policy, predicate and observer
pub struct RetryExecutor<P, O> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    cancel: Option<Arc<AtomicBool>>,
}

impl<P, O> RetryExecutor<P, O>
where
    O: RetryObserver,
{
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Sleep for `delay`, waking early when cancelled. Returns false if cancelled.
    fn wait(&self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(CANCEL_POLL));
        }
    }

    /// Execute `op` with retry logic
    pub fn execute<F, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Error,
        P: RetryPredicate<E>,
    {
        let start = Instant::now();
        let mut last_error: Option<E> = None;

        for attempt in 1..=self.policy.max_attempts {
            if self.is_cancelled() {
                self.observer.on_cancelled(attempt - 1);
                return Err(RetryError::Cancelled {
                    attempts: attempt - 1,
                    last_error,
                });
            }

            let err = match op() {
                Ok(value) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !self.predicate.should_retry(&err) {
                self.observer.on_failure(attempt, &err, false);
                return Err(RetryError::NonRetryable {
                    attempt,
                    source: err,
                });
            }

            if attempt >= self.policy.max_attempts {
                self.observer.on_failure(attempt, &err, true);
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: err,
                    total_duration: start.elapsed(),
                });
            }

            let delay = calculate_delay(&self.policy, attempt);
            self.observer
                .on_retry(attempt, self.policy.max_attempts, &err, delay);
            last_error = Some(err);

            if !self.wait(delay) {
                self.observer.on_cancelled(attempt);
                return Err(RetryError::Cancelled {
                    attempts: attempt,
                    last_error,
                });
            }
        }

        // Only reachable with max_attempts == 0
        Err(RetryError::Cancelled {
            attempts: 0,
            last_error,
        })
    }
}
