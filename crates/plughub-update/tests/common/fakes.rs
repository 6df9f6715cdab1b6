//! In-memory release source and asset fetcher

use plughub_core::{Asset, Error, Release, Result, TagInfo};
use plughub_update::{AssetFetcher, ReleaseSource};
use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Returns whatever release it was last given
#[derive(Default)]
pub struct FakeSource {
    latest: Mutex<Option<Release>>,
    tags: Mutex<Vec<TagInfo>>,
    fail: Mutex<bool>,
    calls: AtomicU32,
}

impl FakeSource {
    pub fn with_latest(release: Release) -> Self {
        let source = Self::default();
        source.set_latest(Some(release));
        source
    }

    pub fn set_latest(&self, release: Option<Release>) {
        *self.latest.lock().unwrap() = release;
    }

    pub fn set_tags(&self, tags: Vec<TagInfo>) {
        *self.tags.lock().unwrap() = tags;
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReleaseSource for FakeSource {
    fn latest_release(&self, _repo_url: &str) -> Result<Option<Release>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().unwrap() {
            return Err(Error::from_status(503, "fake"));
        }
        Ok(self.latest.lock().unwrap().clone())
    }

    fn all_releases(&self, _repo_url: &str) -> Result<Vec<TagInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail.lock().unwrap() {
            return Err(Error::from_status(503, "fake"));
        }
        Ok(self.tags.lock().unwrap().clone())
    }
}

/// Writes fixed bytes to each asset's path, failing for chosen names
#[derive(Default)]
pub struct FakeFetcher {
    failing: Mutex<HashSet<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn failing(names: &[&str]) -> Self {
        let fetcher = Self::default();
        fetcher.set_failing(names);
        fetcher
    }

    pub fn set_failing(&self, names: &[&str]) {
        *self.failing.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl AssetFetcher for FakeFetcher {
    fn fetch(&self, asset: &Asset) -> Result<()> {
        self.fetched.lock().unwrap().push(asset.name.clone());
        if self.failing.lock().unwrap().contains(&asset.name) {
            return Err(Error::from_status(500, &asset.download_url));
        }
        if let Some(parent) = asset.local_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&asset.local_path, b"fake")?;
        Ok(())
    }
}
