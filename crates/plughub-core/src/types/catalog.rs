//! Tag catalog types for the repository-scan path

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::release::{Asset, Platform};
use crate::sanitize::sanitize_filename;

/// One tool exposed by a plugin, as listed in its manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One repackaged, installable plugin archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginPackageInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub release_date: String,
    pub tag_name: String,
    pub local_path: PathBuf,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolInfo>,
}

/// Repository-scan unit: one release tag and its derived plugin packages
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagInfo {
    pub tag_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub plugin_packages: BTreeMap<String, PluginPackageInfo>,
}

impl TagInfo {
    /// A tag with at least one plugin package is never processed again
    pub fn is_processed(&self) -> bool {
        !self.plugin_packages.is_empty()
    }

    /// Copy with identifier-like fields passed through the sanitizer.
    ///
    /// URLs, timestamps, descriptions and paths are left untouched.
    pub fn sanitized(&self) -> TagInfo {
        TagInfo {
            tag_name: sanitize_filename(&self.tag_name),
            name: self.name.clone(),
            published_at: self.published_at.clone(),
            assets: self
                .assets
                .iter()
                .map(|asset| Asset {
                    name: sanitize_filename(&asset.name),
                    ..asset.clone()
                })
                .collect(),
            plugin_packages: self
                .plugin_packages
                .iter()
                .map(|(id, pkg)| {
                    let pkg = PluginPackageInfo {
                        id: sanitize_filename(&pkg.id),
                        name: sanitize_filename(&pkg.name),
                        version: sanitize_filename(&pkg.version),
                        author: sanitize_filename(&pkg.author),
                        tag_name: sanitize_filename(&pkg.tag_name),
                        ..pkg.clone()
                    };
                    (sanitize_filename(id), pkg)
                })
                .collect(),
        }
    }
}
