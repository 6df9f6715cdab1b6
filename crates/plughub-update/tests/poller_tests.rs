//! Tests for the release poller
//!
//! Tests cover:
//! - Applying a new release and persisting it
//! - Keeping the current version when any asset fails
//! - Keeping memory unapplied when the commit cannot be written
//! - Cache refresh versus no-op for an already applied version
//! - Source errors and releases without bundles
//! - State reload across restarts
//! - Background loop start/stop

mod common;

use common::*;
use plughub_core::Release;
use plughub_update::{PollOutcome, PollPhase, ReleasePoller, VersionStateStore};
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const BASE_URL: &str = "https://github.com/acme/mcp-server/releases/download";

fn store(temp: &TempDir) -> VersionStateStore {
    VersionStateStore::new(
        temp.path().join("latest_version.txt"),
        temp.path().join("release_info.json"),
    )
}

fn release(tag: &str, temp: &TempDir) -> Release {
    release_with_assets(
        tag,
        BASE_URL,
        &temp.path().join("updates"),
        &[WINDOWS_BUNDLE, LINUX_BUNDLE],
    )
}

fn poller(
    temp: &TempDir,
    source: &Arc<FakeSource>,
    fetcher: &Arc<FakeFetcher>,
) -> ReleasePoller {
    ReleasePoller::new(
        self_repo_url(),
        source.clone(),
        fetcher.clone(),
        store(temp),
    )
}

#[test]
fn test_new_release_is_applied_and_persisted() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);

    assert_eq!(poller.current_version(), "");
    let outcome = poller.poll_once().unwrap();

    assert_eq!(
        outcome,
        PollOutcome::Applied {
            tag: TAG_V1_1_0.to_string()
        }
    );
    assert_eq!(poller.current_version(), TAG_V1_1_0);
    assert_eq!(poller.phase(), PollPhase::Idle);
    assert_eq!(fetcher.fetched(), vec![WINDOWS_BUNDLE, LINUX_BUNDLE]);
    let bundle = &poller.latest_release().unwrap().assets[0];
    assert!(bundle.local_path.exists());

    let on_disk = fs::read_to_string(temp.path().join("latest_version.txt")).unwrap();
    assert_eq!(on_disk.trim(), TAG_V1_1_0);
    let state = store(&temp).load();
    assert_eq!(state.latest_known_release, Some(release(TAG_V1_1_0, &temp)));
    assert!(poller.release_history().contains_key(TAG_V1_1_0));
}

#[test]
fn test_partial_failure_keeps_current_version() {
    let temp = TempDir::new().unwrap();
    store(&temp).save_version(TAG_V1_0_0).unwrap();

    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::failing(&[LINUX_BUNDLE]));
    let poller = poller(&temp, &source, &fetcher);

    let outcome = poller.poll_once().unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Incomplete {
            tag: TAG_V1_1_0.to_string(),
            failed: vec![LINUX_BUNDLE.to_string()],
        }
    );

    // Version unchanged in memory and on disk, descriptor refreshed
    assert_eq!(poller.current_version(), TAG_V1_0_0);
    assert_eq!(store(&temp).load().current_version, TAG_V1_0_0);
    assert_eq!(
        poller.latest_release().map(|r| r.tag_name),
        Some(TAG_V1_1_0.to_string())
    );
    assert!(!poller.release_history().contains_key(TAG_V1_1_0));

    // The next cycle retries the whole release
    fetcher.set_failing(&[]);
    let outcome = poller.poll_once().unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Applied {
            tag: TAG_V1_1_0.to_string()
        }
    );
    assert_eq!(poller.current_version(), TAG_V1_1_0);
}

#[test]
fn test_failed_commit_leaves_version_unapplied() {
    let temp = TempDir::new().unwrap();
    // A directory where the version file belongs makes the write fail
    let version_file = temp.path().join("latest_version.txt");
    fs::create_dir_all(version_file.join("blocker")).unwrap();

    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);

    assert!(poller.poll_once().is_err());
    assert_eq!(poller.current_version(), "");
    assert!(poller.release_history().is_empty());
    assert_eq!(poller.phase(), PollPhase::Idle);

    fs::remove_dir_all(&version_file).unwrap();
    let outcome = poller.poll_once().unwrap();
    assert_eq!(
        outcome,
        PollOutcome::Applied {
            tag: TAG_V1_1_0.to_string()
        }
    );
    assert_eq!(store(&temp).load().current_version, TAG_V1_1_0);
}

#[test]
fn test_same_version_is_unchanged() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);

    poller.poll_once().unwrap();
    let outcome = poller.poll_once().unwrap();

    assert_eq!(outcome, PollOutcome::Unchanged);
    // No second round of downloads
    assert_eq!(fetcher.fetched().len(), 2);
}

#[test]
fn test_same_version_with_new_descriptor_refreshes_cache() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);
    poller.poll_once().unwrap();

    let mut renamed = release(TAG_V1_1_0, &temp);
    renamed.name = "Release v1.1.0 (re-uploaded)".to_string();
    source.set_latest(Some(renamed.clone()));

    assert_eq!(poller.poll_once().unwrap(), PollOutcome::CacheRefreshed);
    assert_eq!(poller.current_version(), TAG_V1_1_0);
    assert_eq!(poller.latest_release(), Some(renamed.clone()));
    assert_eq!(store(&temp).load().latest_known_release, Some(renamed));
    assert_eq!(fetcher.fetched().len(), 2);
}

#[test]
fn test_v_prefix_is_ignored_when_comparing() {
    let temp = TempDir::new().unwrap();
    store(&temp).save_version("1.1.0").unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);

    assert_eq!(poller.poll_once().unwrap(), PollOutcome::CacheRefreshed);
    assert_eq!(poller.current_version(), "1.1.0");
    assert!(fetcher.fetched().is_empty());
}

#[test]
fn test_no_release_leaves_state_alone() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::default());
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);

    assert_eq!(poller.poll_once().unwrap(), PollOutcome::NoRelease);
    assert!(poller.latest_release().is_none());
    assert!(!temp.path().join("release_info.json").exists());
}

#[test]
fn test_source_error_is_returned() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    source.set_failing(true);
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);

    assert!(poller.poll_once().is_err());
    assert_eq!(poller.phase(), PollPhase::Idle);
    assert_eq!(poller.current_version(), "");
}

#[test]
fn test_check_latest_does_not_download() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_2_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);

    let latest = poller.check_latest().unwrap().unwrap();
    assert_eq!(latest.tag_name, TAG_V1_2_0);
    assert!(fetcher.fetched().is_empty());
    assert_eq!(poller.current_version(), "");
}

#[test]
fn test_history_accumulates_applied_releases() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_0_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = poller(&temp, &source, &fetcher);

    poller.poll_once().unwrap();
    source.set_latest(Some(release(TAG_V1_1_0, &temp)));
    poller.poll_once().unwrap();

    let history = poller.release_history();
    assert_eq!(
        history.keys().cloned().collect::<Vec<_>>(),
        vec![TAG_V1_0_0.to_string(), TAG_V1_1_0.to_string()]
    );
}

#[test]
fn test_state_survives_restart() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    poller(&temp, &source, &fetcher).poll_once().unwrap();

    let restarted = poller(&temp, &source, &fetcher);
    assert_eq!(restarted.current_version(), TAG_V1_1_0);
    assert_eq!(
        restarted.latest_release().map(|r| r.tag_name),
        Some(TAG_V1_1_0.to_string())
    );
    // The applied release seeds the history after a restart
    assert!(restarted.release_history().contains_key(TAG_V1_1_0));
    assert_eq!(restarted.poll_once().unwrap(), PollOutcome::Unchanged);
}

#[test]
fn test_background_loop_start_and_stop() {
    let temp = TempDir::new().unwrap();
    let source = Arc::new(FakeSource::with_latest(release(TAG_V1_1_0, &temp)));
    let fetcher = Arc::new(FakeFetcher::default());
    let poller = Arc::new(poller(&temp, &source, &fetcher));

    poller.start(Duration::from_secs(60)).unwrap();
    assert!(poller.is_running());
    // Starting twice keeps the one loop
    poller.start(Duration::from_secs(60)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while poller.current_version() != TAG_V1_1_0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(poller.current_version(), TAG_V1_1_0);

    poller.stop();
    assert!(!poller.is_running());
    assert_eq!(source.calls(), 1);
}
