//! Plugin repository catalog and periodic scan
//!
//! The manager owns the tag catalog of one upstream repository. A refresh
//! replaces the catalog with the upstream tag list, reusing any tag that
//! was already processed and persisted. Processing runs the tag pipeline
//! and commits the tag only when at least one plugin package was built.
//!
//! The catalog lock is taken only to snapshot or commit; refreshes and
//! pipeline runs happen outside it.

use plughub_core::github::parse_repo_url;
use plughub_core::sanitize::sanitize_filename;
use plughub_core::types::RuntimeConfig;
use plughub_core::{BackgroundLoop, Error, Result, TagInfo};
use plughub_update::{AssetFetcher, ReleaseSource};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::pipeline::TagPipeline;
use crate::store::CatalogStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Result of processing one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// The tag already had plugin packages; nothing was done
    AlreadyProcessed,
    /// Another caller is processing the tag right now; nothing was done
    InProgress,
    /// At least one package was built and the tag was committed
    Processed {
        packages: usize,
        failed_assets: Vec<String>,
    },
    /// Nothing could be packaged; the tag stays eligible for the next scan
    NothingPackaged { failed_assets: Vec<String> },
}

impl TagOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, TagOutcome::NothingPackaged { .. })
    }
}

/// Totals of one pass over every known tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub total: usize,
    pub processed: usize,
    pub failed: Vec<String>,
}

#[derive(Default)]
struct RepoState {
    repo_url: String,
    tags: BTreeMap<String, TagInfo>,
    /// Tags with a pipeline run underway
    in_progress: BTreeSet<String>,
}

/// Clears a tag's in-progress mark however its run ends
struct RunGuard<'a> {
    state: &'a Mutex<RepoState>,
    tag: String,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).in_progress.remove(&self.tag);
    }
}

/// Catalog of one plugin repository
pub struct RepoManager {
    source: Arc<dyn ReleaseSource>,
    pipeline: TagPipeline,
    store: CatalogStore,
    state: Mutex<RepoState>,
    background: Mutex<Option<BackgroundLoop>>,
}

impl RepoManager {
    pub fn new(source: Arc<dyn ReleaseSource>, pipeline: TagPipeline, store: CatalogStore) -> Self {
        Self {
            source,
            pipeline,
            store,
            state: Mutex::new(RepoState::default()),
            background: Mutex::new(None),
        }
    }

    /// Manager storing catalogs and packages under the configured repository
    /// directory. The repository URL is left unset.
    pub fn from_config(
        config: &RuntimeConfig,
        source: Arc<dyn ReleaseSource>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        Self::new(
            source,
            TagPipeline::from_config(config, fetcher),
            CatalogStore::new(config.storage.repo_dir()),
        )
    }

    pub fn repo_url(&self) -> String {
        lock(&self.state).repo_url.clone()
    }

    /// Point the manager at `url` and refresh the catalog from it.
    ///
    /// The URL is stored first; the refresh runs without holding the lock.
    /// Returns the number of tags found.
    pub fn set_repo_url(&self, url: &str) -> Result<usize> {
        let url = url.trim();
        if parse_repo_url(url).is_none() {
            return Err(Error::invalid_repo_url(url));
        }

        {
            let mut state = lock(&self.state);
            if state.repo_url != url {
                state.repo_url = url.to_string();
                state.tags.clear();
            }
        }
        info!(url = %url, "plugin repository set");

        self.update_repo_info()
    }

    /// Replace the catalog with the upstream tag list.
    ///
    /// Tags already processed on disk are loaded instead of the bare
    /// upstream entry. Returns the number of tags.
    pub fn update_repo_info(&self) -> Result<usize> {
        let url = self.repo_url();
        if url.is_empty() {
            return Err(Error::RepoUrlNotSet);
        }

        let fetched = self.source.all_releases(&url)?;
        let tags: BTreeMap<String, TagInfo> = fetched
            .into_iter()
            .map(|tag| match self.store.load_processed(&tag.tag_name) {
                Some(existing) => {
                    debug!(tag = %tag.tag_name, "reusing processed tag info");
                    (tag.tag_name, existing)
                }
                None => (tag.tag_name.clone(), tag),
            })
            .collect();
        let count = tags.len();

        let mut state = lock(&self.state);
        if state.repo_url != url {
            debug!(url = %url, "repository changed during refresh, discarding result");
            return Ok(state.tags.len());
        }
        state.tags = tags;
        drop(state);

        info!(url = %url, tags = count, "repository info updated");
        Ok(count)
    }

    pub fn get_all_tags(&self) -> BTreeMap<String, TagInfo> {
        lock(&self.state).tags.clone()
    }

    pub fn tag_names(&self) -> Vec<String> {
        lock(&self.state).tags.keys().cloned().collect()
    }

    pub fn get_tag_info(&self, tag: &str) -> Option<TagInfo> {
        lock(&self.state).tags.get(&sanitize_filename(tag)).cloned()
    }

    /// Run the pipeline for one tag unless it is already processed.
    ///
    /// At most one run per tag is underway at a time; a concurrent call
    /// returns [`TagOutcome::InProgress`] without touching the tag.
    pub fn process_tag(&self, tag: &str) -> Result<TagOutcome> {
        let tag_name = sanitize_filename(tag);

        let (snapshot, url) = {
            let mut state = lock(&self.state);
            let info = state
                .tags
                .get(&tag_name)
                .ok_or_else(|| Error::unknown_tag(&tag_name))?;
            if info.is_processed() {
                debug!(tag = %tag_name, "tag already processed");
                return Ok(TagOutcome::AlreadyProcessed);
            }
            let snapshot = (info.clone(), state.repo_url.clone());
            if !state.in_progress.insert(tag_name.clone()) {
                debug!(tag = %tag_name, "tag is already being processed");
                return Ok(TagOutcome::InProgress);
            }
            snapshot
        };
        let _run = RunGuard {
            state: &self.state,
            tag: tag_name.clone(),
        };

        let owner = parse_repo_url(&url)
            .map(|coords| coords.owner)
            .ok_or(Error::RepoUrlNotSet)?;

        let report = self.pipeline.run(&snapshot, &owner)?;
        if report.packages.is_empty() {
            warn!(
                tag = %tag_name,
                failed_assets = report.failed_assets.len(),
                skipped = report.skipped_binaries.len(),
                "no plugins packaged, tag left unprocessed"
            );
            return Ok(TagOutcome::NothingPackaged {
                failed_assets: report.failed_assets,
            });
        }

        let packages = report.packages.len();
        let mut processed = snapshot;
        processed.plugin_packages = report.packages;

        lock(&self.state)
            .tags
            .insert(tag_name.clone(), processed.clone());

        if let Err(e) = self.store.save(&processed) {
            error!(tag = %tag_name, error = %e, "failed to persist tag info");
        }
        info!(tag = %tag_name, packages, "tag processed");

        Ok(TagOutcome::Processed {
            packages,
            failed_assets: report.failed_assets,
        })
    }

    /// Process every known tag, one at a time
    pub fn process_all_tags(&self) -> ScanSummary {
        self.process_tags_until(None)
    }

    fn process_tags_until(&self, stop: Option<&AtomicBool>) -> ScanSummary {
        let names = self.tag_names();
        let mut summary = ScanSummary {
            total: names.len(),
            ..Default::default()
        };

        for name in names {
            if stop.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                debug!("scan interrupted by stop request");
                break;
            }
            match self.process_tag(&name) {
                Ok(outcome) if outcome.is_success() => summary.processed += 1,
                Ok(_) => summary.failed.push(name),
                Err(e) => {
                    error!(tag = %name, error = %e, "tag processing failed");
                    summary.failed.push(name);
                }
            }
        }

        info!(
            processed = summary.processed,
            total = summary.total,
            "finished processing tags"
        );
        summary
    }

    /// Refresh the catalog, then process every tag
    pub fn scan(&self) -> Result<ScanSummary> {
        self.update_repo_info()?;
        Ok(self.process_all_tags())
    }

    /// Start scanning every `interval` on a background thread.
    ///
    /// Does nothing if already running.
    pub fn start(self: &Arc<Self>, interval: Duration) -> Result<()> {
        let mut background = lock(&self.background);
        if background.as_ref().is_some_and(BackgroundLoop::is_running) {
            return Ok(());
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = BackgroundLoop::spawn("repo-scan", interval, move |stop| {
            let Some(manager) = weak.upgrade() else {
                return;
            };
            if let Err(e) = manager.update_repo_info() {
                error!(error = %e, "repository refresh failed");
                return;
            }
            manager.process_tags_until(Some(stop));
        })?;

        *background = Some(handle);
        info!(interval_secs = interval.as_secs(), "repository scan started");
        Ok(())
    }

    /// Stop the periodic scan and wait for it to exit
    pub fn stop(&self) {
        let handle = lock(&self.background).take();
        if let Some(mut handle) = handle {
            handle.stop();
            info!("repository scan stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.background)
            .as_ref()
            .is_some_and(BackgroundLoop::is_running)
    }
}

impl Drop for RepoManager {
    fn drop(&mut self) {
        self.stop();
    }
}
