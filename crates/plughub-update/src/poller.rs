//! Background release poller for the self-update path
//!
//! Each cycle asks the release source for the newest release and compares
//! its tag with the current version. A different tag is downloaded in full
//! and committed only when every asset arrived. Otherwise the cached
//! latest-release descriptor is refreshed if anything about it changed.
//!
//! ```text
//! Idle -> Polling -> Unchanged ----------------------> Idle
//!                 -> Downloading -> Applying -> Applied -> Idle
//! ```

use plughub_core::{BackgroundLoop, Release, Result, VersionState};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::source::{AssetFetcher, ReleaseSource};
use crate::state::VersionStateStore;

/// Where the poller is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
    Downloading,
    Applying,
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The latest release carries no update bundles
    NoRelease,
    /// Same version, same descriptor
    Unchanged,
    /// Same version, but the cached descriptor was updated
    CacheRefreshed,
    /// A new release was downloaded in full and committed
    Applied { tag: String },
    /// A new release was found but some assets failed; nothing committed
    Incomplete { tag: String, failed: Vec<String> },
}

/// Whether `latest` should replace `current`.
///
/// One leading `v`/`V` is ignored on both sides; any other difference
/// counts as newer, and an empty current version always does.
pub fn is_newer(current: &str, latest: &str) -> bool {
    fn strip(tag: &str) -> &str {
        tag.strip_prefix(['v', 'V']).unwrap_or(tag)
    }
    current.is_empty() || strip(current) != strip(latest)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct PollerState {
    version: VersionState,
    history: BTreeMap<String, Release>,
}

/// Resets the phase to Idle however a cycle ends
struct PhaseGuard<'a>(&'a Mutex<PollPhase>);

impl PhaseGuard<'_> {
    fn set(&self, phase: PollPhase) {
        *lock(self.0) = phase;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *lock(self.0) = PollPhase::Idle;
    }
}

/// Tracks the latest release of one repository and applies new ones
pub struct ReleasePoller {
    repo_url: String,
    source: Arc<dyn ReleaseSource>,
    fetcher: Arc<dyn AssetFetcher>,
    store: VersionStateStore,
    state: Mutex<PollerState>,
    phase: Mutex<PollPhase>,
    /// Serializes cycles from the loop and from on-demand checks
    cycle: Mutex<()>,
    background: Mutex<Option<BackgroundLoop>>,
}

impl ReleasePoller {
    /// Create a poller, loading persisted state from `store`.
    ///
    /// A persisted release whose tag matches the current version seeds the
    /// release history.
    pub fn new(
        repo_url: impl Into<String>,
        source: Arc<dyn ReleaseSource>,
        fetcher: Arc<dyn AssetFetcher>,
        store: VersionStateStore,
    ) -> Self {
        let version = store.load();
        let mut history = BTreeMap::new();
        if let Some(release) = &version.latest_known_release {
            if !version.current_version.is_empty() && release.tag_name == version.current_version {
                history.insert(release.tag_name.clone(), release.clone());
            }
        }

        info!(
            current_version = %version.current_version,
            "loaded version state"
        );

        Self {
            repo_url: repo_url.into(),
            source,
            fetcher,
            store,
            state: Mutex::new(PollerState { version, history }),
            phase: Mutex::new(PollPhase::Idle),
            cycle: Mutex::new(()),
            background: Mutex::new(None),
        }
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    pub fn current_version(&self) -> String {
        lock(&self.state).version.current_version.clone()
    }

    pub fn latest_release(&self) -> Option<Release> {
        lock(&self.state).version.latest_known_release.clone()
    }

    pub fn version_state(&self) -> VersionState {
        lock(&self.state).version.clone()
    }

    /// Every release applied since startup, plus the one applied before it
    pub fn release_history(&self) -> BTreeMap<String, Release> {
        lock(&self.state).history.clone()
    }

    pub fn phase(&self) -> PollPhase {
        *lock(&self.phase)
    }

    /// Fetch the latest release without downloading or changing state
    pub fn check_latest(&self) -> Result<Option<Release>> {
        self.source.latest_release(&self.repo_url)
    }

    /// Run one full cycle: fetch, compare, download, commit
    pub fn poll_once(&self) -> Result<PollOutcome> {
        let _cycle = lock(&self.cycle);
        let phase = PhaseGuard(&self.phase);
        phase.set(PollPhase::Polling);

        let Some(release) = self.source.latest_release(&self.repo_url)? else {
            debug!(repo = %self.repo_url, "no update bundles in latest release");
            return Ok(PollOutcome::NoRelease);
        };

        let current = self.current_version();
        if !is_newer(&current, &release.tag_name) {
            return Ok(self.refresh_cache(release));
        }

        info!(current = %current, latest = %release.tag_name, "new release found");
        phase.set(PollPhase::Downloading);

        let failed: Vec<String> = release
            .assets
            .iter()
            .filter_map(|asset| match self.fetcher.fetch(asset) {
                Ok(()) => None,
                Err(e) => {
                    error!(asset = %asset.name, error = %e, "asset download failed");
                    Some(asset.name.clone())
                }
            })
            .collect();

        if !failed.is_empty() {
            warn!(
                tag = %release.tag_name,
                failed = failed.len(),
                total = release.assets.len(),
                "release incomplete, keeping current version"
            );
            let tag = release.tag_name.clone();
            self.refresh_cache(release);
            return Ok(PollOutcome::Incomplete { tag, failed });
        }

        phase.set(PollPhase::Applying);
        let tag = release.tag_name.clone();

        // Disk first; the version marker is the commit point
        self.store.save_release(&release)?;
        self.store.save_version(&tag)?;
        {
            let mut state = lock(&self.state);
            state.version.current_version = tag.clone();
            state.version.latest_known_release = Some(release.clone());
            state.history.insert(tag.clone(), release);
        }
        info!(tag = %tag, "release applied");

        Ok(PollOutcome::Applied { tag })
    }

    /// Replace the cached descriptor if it differs; never touches the version
    fn refresh_cache(&self, release: Release) -> PollOutcome {
        {
            let mut state = lock(&self.state);
            if state.version.latest_known_release.as_ref() == Some(&release) {
                return PollOutcome::Unchanged;
            }
            state.version.latest_known_release = Some(release.clone());
        }

        if let Err(e) = self.store.save_release(&release) {
            error!(error = %e, "failed to persist release info");
        }
        debug!(tag = %release.tag_name, "latest release info refreshed");
        PollOutcome::CacheRefreshed
    }

    /// Start polling every `interval` on a background thread.
    ///
    /// Does nothing if already running.
    pub fn start(self: &Arc<Self>, interval: Duration) -> Result<()> {
        let mut background = lock(&self.background);
        if background.as_ref().is_some_and(BackgroundLoop::is_running) {
            return Ok(());
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = BackgroundLoop::spawn("release-poller", interval, move |_stop| {
            let Some(poller) = weak.upgrade() else {
                return;
            };
            match poller.poll_once() {
                Ok(outcome) => debug!(?outcome, "poll cycle finished"),
                Err(e) => error!(error = %e, "poll cycle failed"),
            }
        })?;

        *background = Some(handle);
        Ok(())
    }

    /// Stop the background loop and wait for it to exit
    pub fn stop(&self) {
        let handle = lock(&self.background).take();
        if let Some(mut handle) = handle {
            handle.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.background)
            .as_ref()
            .is_some_and(BackgroundLoop::is_running)
    }
}

impl Drop for ReleasePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
