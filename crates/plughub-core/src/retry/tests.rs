//! End-to-end tests for the retry executor

use std::error::Error;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::retry::error::RetryError;
use crate::retry::executor::RetryExecutorBuilder;
use crate::retry::observer::{RetryObserver, TracingObserver};
use crate::retry::strategies::TransientErrorPredicate;
use crate::types::{RetryPolicy, RetryStrategy};

fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::fixed(max_attempts, 1)
}

/// Records observer events as short strings
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }
}

impl RetryObserver for Recorder {
    fn on_retry(&self, attempt: u32, max_attempts: u32, _error: &dyn Error, _delay: Duration) {
        self.push(format!("retry {attempt}/{max_attempts}"));
    }

    fn on_success(&self, attempt: u32, _elapsed: Duration) {
        self.push(format!("success {attempt}"));
    }

    fn on_failure(&self, attempts: u32, _error: &dyn Error, retryable: bool) {
        self.push(format!("failure {attempts} retryable={retryable}"));
    }

    fn on_cancelled(&self, attempts: u32) {
        self.push(format!("cancelled {attempts}"));
    }
}

#[test]
fn test_immediate_success() {
    let recorder = Recorder::default();

    let result: Result<&str, RetryError<io::Error>> = RetryExecutorBuilder::new()
        .with_policy(quick_policy(3))
        .with_observer(recorder.clone())
        .build()
        .execute(|| Ok("done"));

    assert_eq!(result.unwrap(), "done");
    assert_eq!(recorder.events(), vec!["success 1"]);
}

#[test]
fn test_success_after_transient_failures() {
    let recorder = Recorder::default();
    let calls = AtomicU32::new(0);

    let result = RetryExecutorBuilder::new()
        .with_policy(quick_policy(3))
        .with_observer(recorder.clone())
        .build()
        .execute(|| {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            } else {
                Ok(7)
            }
        });

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(recorder.events(), vec!["retry 1/3", "retry 2/3", "success 3"]);
}

#[test]
fn test_exhausts_after_max_attempts() {
    let recorder = Recorder::default();
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = RetryExecutorBuilder::new()
        .with_policy(quick_policy(3))
        .with_observer(recorder.clone())
        .build()
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::other("always"))
        });

    let err = result.unwrap_err();
    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        recorder.events(),
        vec!["retry 1/3", "retry 2/3", "failure 3 retryable=true"]
    );
}

#[test]
fn test_fixed_delay_is_applied_between_attempts() {
    let start = Instant::now();

    let result: Result<(), _> = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::fixed(3, 20))
        .build()
        .execute(|| Err(io::Error::other("fail")));

    assert!(result.is_err());
    // Two waits of 20ms between three attempts
    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[test]
fn test_not_found_is_not_retried() {
    let recorder = Recorder::default();
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = RetryExecutorBuilder::new()
        .with_policy(quick_policy(3))
        .with_predicate(TransientErrorPredicate)
        .with_observer(recorder.clone())
        .build()
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(crate::Error::from_status(404, "https://example.com/missing.zip"))
        });

    let err = result.unwrap_err();
    assert!(err.is_non_retryable());
    assert!(err.into_inner().is_not_found());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.events(), vec!["failure 1 retryable=false"]);
}

#[test]
fn test_server_errors_are_retried() {
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = RetryExecutorBuilder::new()
        .with_policy(quick_policy(3))
        .with_predicate(TransientErrorPredicate)
        .with_observer(TracingObserver::new("test"))
        .build()
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(crate::Error::from_status(502, "https://example.com/a.zip"))
        });

    assert!(result.unwrap_err().is_exhausted());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_cancel_flag_interrupts_wait() {
    let recorder = Recorder::default();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();

    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        flag.store(true, Ordering::SeqCst);
    });

    let start = Instant::now();
    let result: Result<(), _> = RetryExecutorBuilder::new()
        .with_policy(RetryPolicy::fixed(3, 10_000))
        .with_observer(recorder.clone())
        .with_cancel_flag(cancel)
        .build()
        .execute(|| Err(io::Error::other("fail")));
    canceller.join().unwrap();

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.attempts(), 1);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(recorder.events(), vec!["retry 1/3", "cancelled 1"]);
}

#[test]
fn test_cancel_before_first_attempt() {
    let calls = AtomicU32::new(0);
    let result: Result<(), RetryError<io::Error>> = RetryExecutorBuilder::new()
        .with_policy(quick_policy(3))
        .with_cancel_flag(Arc::new(AtomicBool::new(true)))
        .build()
        .execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_zero_max_attempts() {
    let policy = RetryPolicy {
        max_attempts: 0,
        strategy: RetryStrategy::None,
        ..RetryPolicy::default()
    };

    let result: Result<(), RetryError<io::Error>> = RetryExecutorBuilder::new()
        .with_policy(policy)
        .build()
        .execute(|| Ok(()));
    assert!(result.unwrap_err().is_cancelled());
}
