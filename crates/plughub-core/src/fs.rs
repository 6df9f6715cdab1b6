//! Filesystem helpers shared by the update and repository paths

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::retry::{RetryExecutorBuilder, TracingObserver};
use crate::types::RetryPolicy;

/// Reject `path` when its textual form is longer than `limit` characters
pub fn check_path_len(path: &Path, limit: usize) -> Result<()> {
    let text = path.to_string_lossy();
    if text.len() > limit {
        return Err(Error::path_too_long(text, limit));
    }
    Ok(())
}

/// Write `bytes` to `path` so that readers see either the old file or the
/// complete new one.
///
/// Parent directories are created as needed. The data goes to a temp file
/// in the destination directory, which is then renamed over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Remove a directory tree, retrying transient failures under `policy`.
///
/// A missing directory counts as removed. Returns false, after logging, when
/// every attempt failed.
pub fn remove_dir_with_retry(path: &Path, policy: &RetryPolicy) -> bool {
    let result = RetryExecutorBuilder::new()
        .with_policy(policy.clone())
        .with_observer(TracingObserver::new("remove-dir"))
        .build()
        .execute(|| match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        });

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to remove directory");
            false
        }
    }
}
