//! Persisted self-update state
//!
//! Two files: a version marker holding the tag of the last fully applied
//! release, and a JSON descriptor of the latest known release.

use plughub_core::fs::write_atomic;
use plughub_core::types::StorageConfig;
use plughub_core::{Release, Result, VersionState};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reads and writes [`VersionState`] on disk
#[derive(Debug, Clone)]
pub struct VersionStateStore {
    version_file: PathBuf,
    release_info_file: PathBuf,
}

impl VersionStateStore {
    pub fn new(version_file: impl Into<PathBuf>, release_info_file: impl Into<PathBuf>) -> Self {
        Self {
            version_file: version_file.into(),
            release_info_file: release_info_file.into(),
        }
    }

    pub fn from_storage(storage: &StorageConfig) -> Self {
        Self::new(storage.version_file(), storage.release_info_file())
    }

    pub fn version_file(&self) -> &Path {
        &self.version_file
    }

    pub fn release_info_file(&self) -> &Path {
        &self.release_info_file
    }

    /// Load whatever state is on disk.
    ///
    /// Missing files yield empty state. An unreadable or corrupt descriptor
    /// is logged and treated as absent so startup never fails on it.
    pub fn load(&self) -> VersionState {
        let current_version = match fs::read_to_string(&self.version_file) {
            Ok(text) => text.trim().to_string(),
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                warn!(path = %self.version_file.display(), error = %e, "cannot read version file");
                String::new()
            }
        };

        let latest_known_release = match self.load_release() {
            Ok(release) => release,
            Err(e) => {
                warn!(path = %self.release_info_file.display(), error = %e, "ignoring release info");
                None
            }
        };

        VersionState {
            current_version,
            latest_known_release,
        }
    }

    fn load_release(&self) -> Result<Option<Release>> {
        match fs::read_to_string(&self.release_info_file) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the current version tag
    pub fn save_version(&self, tag: &str) -> Result<()> {
        write_atomic(&self.version_file, format!("{}\n", tag).as_bytes())
    }

    /// Persist the latest known release descriptor
    pub fn save_release(&self, release: &Release) -> Result<()> {
        let json = serde_json::to_string_pretty(release)?;
        write_atomic(&self.release_info_file, json.as_bytes())
    }
}
