//! Bounded retry execution for blocking operations
//!
//! Downloads and directory removal both retry a fixed number of times with a
//! delay between attempts. This module expresses that once, parameterized by
//! a [`RetryPolicy`](crate::types::RetryPolicy), a predicate deciding which
//! errors are worth another attempt, and an observer for logging.
//!
//! Delays are slept on the calling thread. An optional cancel flag is
//! polled while sleeping so that a stopping background loop is not held up
//! by a pending retry.
//!
//! # Example
//!
//! ```rust
//! use plughub_core::retry::{RetryError, RetryExecutorBuilder};
//! use plughub_core::types::RetryPolicy;
//!
//! let result: Result<u32, RetryError<std::io::Error>> = RetryExecutorBuilder::new()
//!     .with_policy(RetryPolicy::fixed(3, 0))
//!     .build()
//!     .execute(|| Ok(42));
//! assert_eq!(result.unwrap(), 42);
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::{RetryExecutor, RetryExecutorBuilder};
pub use observer::{NoOpObserver, RetryObserver, TracingObserver};
pub use strategies::{calculate_delay, AlwaysRetry, RetryPredicate, TransientErrorPredicate};

#[cfg(test)]
mod tests;
