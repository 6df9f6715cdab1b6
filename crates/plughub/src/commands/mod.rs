//! Command implementations

pub mod check_update;
pub mod scan;
pub mod serve;

use anyhow::{Context, Result};
use plughub_core::RuntimeConfig;
use plughub_repo::RepoManager;
use plughub_update::{ArtifactDownloader, GitHubReleaseCatalog, ReleasePoller, VersionStateStore};
use std::sync::Arc;

/// Release catalog and downloader shared by every component of one run
pub struct Services {
    pub config: RuntimeConfig,
    catalog: Arc<GitHubReleaseCatalog>,
    downloader: Arc<ArtifactDownloader>,
}

impl Services {
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let catalog =
            GitHubReleaseCatalog::from_config(&config).context("Failed to build the API client")?;
        let downloader = ArtifactDownloader::from_config(&config)
            .context("Failed to build the download client")?;

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            downloader: Arc::new(downloader),
        })
    }

    /// Poller for `repo_url` with state under the configured storage
    pub fn poller(&self, repo_url: &str) -> ReleasePoller {
        ReleasePoller::new(
            repo_url,
            self.catalog.clone(),
            self.downloader.clone(),
            VersionStateStore::from_storage(&self.config.storage),
        )
    }

    /// Repository manager with no repository set yet
    pub fn repo_manager(&self) -> RepoManager {
        RepoManager::from_config(&self.config, self.catalog.clone(), self.downloader.clone())
    }
}

/// First non-empty value of a CLI flag and a configured default
pub fn pick_url(flag: Option<String>, configured: Option<&String>) -> Option<String> {
    flag.or_else(|| configured.cloned())
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}
