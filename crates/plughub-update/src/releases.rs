//! GitHub release queries
//!
//! Two modes share one client: the latest release of the self-update
//! repository, reduced to an allow-list of bundle names, and every release
//! of the plugin repository, reduced to plugin bundles.

use plughub_core::fs::check_path_len;
use plughub_core::github::{parse_repo_url, RepoCoordinates};
use plughub_core::sanitize::{sanitize_filename, MAX_PATH_LEN};
use plughub_core::types::RuntimeConfig;
use plughub_core::{Asset, Error, Platform, Release, Result, TagInfo};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::client::{build_client, GITHUB_JSON};
use crate::source::ReleaseSource;

/// Releases requested per page
const PER_PAGE: usize = 100;

/// Upper bound on pages fetched for one repository
const MAX_PAGES: usize = 10;

/// Archive extensions accepted for plugin bundles
const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".tar.gz", ".tgz"];

/// Release as returned by the GitHub API
#[derive(Debug, Clone, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Clone, Deserialize)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
}

/// Whether an asset name looks like a plugin bundle.
///
/// The name must contain "plugin", end with an archive extension and must
/// not contain "server", which marks self-update bundles.
///
/// ```rust
/// use plughub_update::is_plugin_asset;
///
/// assert!(is_plugin_asset("myplugin-windows.zip"));
/// assert!(!is_plugin_asset("server-windows.zip"));
/// assert!(!is_plugin_asset("readme.md"));
/// ```
pub fn is_plugin_asset(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("plugin")
        && ARCHIVE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        && !lower.contains("server")
}

/// Release catalog backed by the GitHub REST API
pub struct GitHubReleaseCatalog {
    client: Client,
    api_url: String,
    update_dir: PathBuf,
    repo_dir: PathBuf,
    bundle_names: Vec<String>,
}

impl GitHubReleaseCatalog {
    /// Build a catalog from runtime configuration
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let client = build_client(
            &config.network,
            config.github.token.as_deref(),
            Some(GITHUB_JSON),
            config.network.api_timeout(),
        )?;

        Ok(Self {
            client,
            api_url: config.github.api_url.trim_end_matches('/').to_string(),
            update_dir: config.storage.update_dir(),
            repo_dir: config.storage.repo_dir(),
            bundle_names: config.update.bundle_names.clone(),
        })
    }

    fn coordinates(repo_url: &str) -> Result<RepoCoordinates> {
        parse_repo_url(repo_url).ok_or_else(|| Error::invalid_repo_url(repo_url))
    }

    fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        debug!(url = %url, "querying release API");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::from_status(status.as_u16(), url));
        }
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn fetch_latest(&self, coords: &RepoCoordinates) -> Result<GitHubRelease> {
        let url = format!("{}/repos/{}/releases/latest", self.api_url, coords.api_path());
        let value = self.get_json(&url)?;
        Ok(serde_json::from_value(value)?)
    }

    fn fetch_all(&self, coords: &RepoCoordinates) -> Result<Vec<GitHubRelease>> {
        let mut releases = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!(
                "{}/repos/{}/releases?per_page={}&page={}",
                self.api_url,
                coords.api_path(),
                PER_PAGE,
                page
            );
            let entries: Vec<serde_json::Value> = serde_json::from_value(self.get_json(&url)?)?;
            let count = entries.len();

            for entry in entries {
                match serde_json::from_value::<GitHubRelease>(entry) {
                    Ok(release) => releases.push(release),
                    Err(e) => warn!(error = %e, "skipping unparseable release entry"),
                }
            }

            if count < PER_PAGE {
                break;
            }
        }

        Ok(releases)
    }

    /// Local path of a bundle, or None (logged) when it would be too long
    fn bounded_path(base: &Path, parts: &[&str]) -> Option<PathBuf> {
        let path = parts.iter().fold(base.to_path_buf(), |p, part| p.join(part));
        match check_path_len(&path, MAX_PATH_LEN) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(error = %e, "skipping asset");
                None
            }
        }
    }

    /// Reduce a latest-release response to the allow-listed bundles.
    ///
    /// Bundles land in `update_dir/{platform}/{tag}/` so releases sharing an
    /// asset name never alias on disk.
    fn to_update_release(&self, release: GitHubRelease) -> Option<Release> {
        let tag_name = sanitize_filename(&release.tag_name);
        let assets: Vec<Asset> = release
            .assets
            .into_iter()
            .filter_map(|asset| {
                let name = sanitize_filename(&asset.name);
                if !self.bundle_names.iter().any(|allowed| *allowed == name) {
                    return None;
                }
                let platform = Platform::from_file_name(&name);
                let local_path = Self::bounded_path(
                    &self.update_dir,
                    &[platform.as_str(), &tag_name, &name],
                )?;
                Some(Asset {
                    name,
                    download_url: asset.browser_download_url,
                    platform,
                    local_path,
                })
            })
            .collect();

        if assets.is_empty() {
            debug!(tag = %tag_name, "latest release has no update bundles");
            return None;
        }

        Some(Release {
            tag_name,
            name: release.name.unwrap_or_default(),
            published_at: release.published_at.unwrap_or_default(),
            assets,
        })
    }

    /// Reduce one release of the plugin repository to its plugin bundles
    fn to_tag_info(&self, release: GitHubRelease) -> TagInfo {
        let tag_name = sanitize_filename(&release.tag_name);

        let assets = release
            .assets
            .into_iter()
            .filter_map(|asset| {
                let name = sanitize_filename(&asset.name);
                if !is_plugin_asset(&name) {
                    return None;
                }
                let local_path = Self::bounded_path(&self.repo_dir, &[&tag_name, &name])?;
                Some(Asset {
                    platform: Platform::from_file_name(&name),
                    name,
                    download_url: asset.browser_download_url,
                    local_path,
                })
            })
            .collect();

        TagInfo {
            tag_name,
            name: release.name.unwrap_or_default(),
            published_at: release.published_at.unwrap_or_default(),
            assets,
            plugin_packages: Default::default(),
        }
    }
}

impl ReleaseSource for GitHubReleaseCatalog {
    fn latest_release(&self, repo_url: &str) -> Result<Option<Release>> {
        let coords = Self::coordinates(repo_url)?;
        let release = self.fetch_latest(&coords)?;
        Ok(self.to_update_release(release))
    }

    fn all_releases(&self, repo_url: &str) -> Result<Vec<TagInfo>> {
        let coords = Self::coordinates(repo_url)?;
        let tags: Vec<TagInfo> = self
            .fetch_all(&coords)?
            .into_iter()
            .map(|release| self.to_tag_info(release))
            .collect();

        info!(repo = %coords.api_path(), tags = tags.len(), "fetched release list");
        Ok(tags)
    }
}
