//! Hooks into a retried operation
//!
//! Every hook has an empty default, so an observer only implements the
//! events it cares about.

use std::error::Error;
use std::time::Duration;

/// Receives the outcome of each attempt made by a [`super::RetryExecutor`]
pub trait RetryObserver: Send + Sync {
    /// `attempt` of `max_attempts` failed; the next one starts after `delay`
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &dyn Error, delay: Duration) {
        let _ = (attempt, max_attempts, error, delay);
    }

    /// The operation succeeded on `attempt`
    fn on_success(&self, attempt: u32, elapsed: Duration) {
        let _ = (attempt, elapsed);
    }

    /// The operation failed for good after `attempts`.
    ///
    /// `retryable` is false when the predicate rejected the error and true
    /// when the attempt budget ran out.
    fn on_failure(&self, attempts: u32, error: &dyn Error, retryable: bool) {
        let _ = (attempts, error, retryable);
    }

    /// The cancel flag stopped the operation after `attempts`
    fn on_cancelled(&self, attempts: u32) {
        let _ = attempts;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {}

/// Writes retry events to the `tracing` log under an operation label
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    /// `operation` is logged with every event, e.g. `download demo.zip`
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

impl RetryObserver for TracingObserver {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &dyn Error, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "{error}; retrying"
        );
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        // First-try successes are the common case and stay quiet
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                "recovered"
            );
        }
    }

    fn on_failure(&self, attempts: u32, error: &dyn Error, retryable: bool) {
        if retryable {
            tracing::error!(operation = %self.operation, attempts, "{error}; giving up");
        } else {
            tracing::warn!(operation = %self.operation, "{error}; not retryable");
        }
    }

    fn on_cancelled(&self, attempts: u32) {
        tracing::info!(operation = %self.operation, attempts, "cancelled");
    }
}
