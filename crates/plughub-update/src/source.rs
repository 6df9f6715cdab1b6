//! Seams between release tracking and the network

use plughub_core::{Asset, Release, Result, TagInfo};

/// Where releases come from
pub trait ReleaseSource: Send + Sync {
    /// Newest release of `repo_url`, reduced to the self-update bundles.
    ///
    /// `Ok(None)` when the release carries none of them.
    fn latest_release(&self, repo_url: &str) -> Result<Option<Release>>;

    /// Every release of `repo_url` as an unprocessed tag with its plugin bundles
    fn all_releases(&self, repo_url: &str) -> Result<Vec<TagInfo>>;
}

/// Brings an asset to its `local_path`
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, asset: &Asset) -> Result<()>;
}
