//! Builders for GitHub API payloads and core release values

use plughub_core::{Asset, Platform, Release};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use super::constants::*;

/// Builds one release object as the GitHub API returns it
#[derive(Debug, Clone)]
pub struct ApiReleaseBuilder {
    tag_name: String,
    name: Option<String>,
    published_at: Option<String>,
    assets: Vec<Value>,
}

impl ApiReleaseBuilder {
    pub fn new(tag: &str) -> Self {
        Self {
            tag_name: tag.to_string(),
            name: Some(format!("Release {}", tag)),
            published_at: Some(PUBLISHED_AT.to_string()),
            assets: Vec::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn published_at(mut self, date: &str) -> Self {
        self.published_at = Some(date.to_string());
        self
    }

    /// Asset served from `base_url/{name}`
    pub fn asset(mut self, base_url: &str, name: &str) -> Self {
        self.assets.push(json!({
            "name": name,
            "browser_download_url": format!("{}/{}", base_url, name),
            "size": 1024,
            "content_type": "application/zip",
        }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "tag_name": self.tag_name,
            "name": self.name,
            "published_at": self.published_at,
            "draft": false,
            "prerelease": false,
            "assets": self.assets,
        })
    }
}

/// A core release with one asset per name, stored under `dir/{platform}/`
pub fn release_with_assets(tag: &str, base_url: &str, dir: &Path, names: &[&str]) -> Release {
    Release {
        tag_name: tag.to_string(),
        name: format!("Release {}", tag),
        published_at: PUBLISHED_AT.to_string(),
        assets: names
            .iter()
            .map(|name| asset(base_url, dir, name))
            .collect(),
    }
}

pub fn asset(base_url: &str, dir: &Path, name: &str) -> Asset {
    let platform = Platform::from_file_name(name);
    Asset {
        name: name.to_string(),
        download_url: format!("{}/{}", base_url, name),
        platform,
        local_path: dir.join(platform.as_str()).join(name),
    }
}

pub fn asset_at(url: &str, local_path: PathBuf) -> Asset {
    Asset {
        name: local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        download_url: url.to_string(),
        platform: Platform::Unknown,
        local_path,
    }
}
