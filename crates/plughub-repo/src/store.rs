//! Per-tag catalog files
//!
//! Each processed tag is persisted as `{repo_dir}/{sanitized tag}.json`
//! holding the full [`TagInfo`] with its plugin packages.

use plughub_core::fs::write_atomic;
use plughub_core::sanitize::sanitize_filename;
use plughub_core::{Result, TagInfo};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads and writes per-tag catalog files under one repository directory
#[derive(Debug, Clone)]
pub struct CatalogStore {
    repo_dir: PathBuf,
}

impl CatalogStore {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Catalog file for `tag`
    pub fn path_for(&self, tag: &str) -> PathBuf {
        self.repo_dir.join(format!("{}.json", sanitize_filename(tag)))
    }

    /// Persist `tag` with identifier fields sanitized
    pub fn save(&self, tag: &TagInfo) -> Result<()> {
        let sanitized = tag.sanitized();
        let path = self.path_for(&sanitized.tag_name);
        let json = serde_json::to_string_pretty(&sanitized)?;
        write_atomic(&path, json.as_bytes())?;
        debug!(tag = %sanitized.tag_name, path = %path.display(), "tag info saved");
        Ok(())
    }

    /// Load the catalog file for `tag`, `None` when there is none
    pub fn load(&self, tag: &str) -> Result<Option<TagInfo>> {
        let path = self.path_for(tag);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`load`](Self::load), but only returns tags that were processed.
    ///
    /// Unreadable files are logged and treated as absent.
    pub fn load_processed(&self, tag: &str) -> Option<TagInfo> {
        match self.load(tag) {
            Ok(Some(info)) if info.is_processed() => Some(info),
            Ok(_) => None,
            Err(e) => {
                warn!(tag = %tag, error = %e, "ignoring unreadable tag info");
                None
            }
        }
    }
}
