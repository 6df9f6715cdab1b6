//! Stoppable periodic background thread

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Longest single sleep between stop-flag checks
const STOP_POLL: Duration = Duration::from_secs(1);

/// A named OS thread that runs a task immediately and then once per interval.
///
/// The thread sleeps in slices of at most one second and checks its stop
/// flag between them, so [`stop`](Self::stop) is honoured within a second
/// of the current task finishing. Dropping the handle stops and joins the
/// thread.
pub struct BackgroundLoop {
    name: String,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl BackgroundLoop {
    /// Spawn the loop. `task` receives the stop flag so long-running work
    /// can bail out early.
    pub fn spawn<F>(name: impl Into<String>, interval: Duration, mut task: F) -> std::io::Result<Self>
    where
        F: FnMut(&AtomicBool) + Send + 'static,
    {
        let name = name.into();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let loop_name = name.clone();

        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            tracing::info!(name = %loop_name, interval_secs = interval.as_secs(), "background loop started");
            while !flag.load(Ordering::SeqCst) {
                task(&flag);
                sleep_unless_stopped(&flag, interval);
            }
            tracing::info!(name = %loop_name, "background loop stopped");
        })?;

        Ok(Self {
            name,
            stop,
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared stop flag, also usable as a retry cancel flag
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Whether the thread is still running
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the loop and wait for it to finish.
    ///
    /// From the loop's own thread this only raises the flag.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);

        if thread::current().id() == self.thread_id {
            return;
        }

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(name = %self.name, "background loop panicked");
            }
        }
    }
}

impl Drop for BackgroundLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sleep_unless_stopped(flag: &AtomicBool, interval: Duration) {
    let deadline = Instant::now() + interval;
    while !flag.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep((deadline - now).min(STOP_POLL));
    }
}
