//! Release and asset types for the self-update path

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Target platform of an asset or plugin binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Platform {
    /// Infer the platform from a file name.
    ///
    /// Case-insensitive: "windows", "win" or ".dll" select Windows, then
    /// "linux" or ".so" select Linux; anything else is Unknown.
    ///
    /// ```rust
    /// use plughub_core::Platform;
    ///
    /// assert_eq!(Platform::from_file_name("App-windows-x64.zip"), Platform::Windows);
    /// assert_eq!(Platform::from_file_name("libplugin.so"), Platform::Linux);
    /// assert_eq!(Platform::from_file_name("readme.txt"), Platform::Unknown);
    /// ```
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("windows") || lower.contains("win") || lower.contains(".dll") {
            Platform::Windows
        } else if lower.contains("linux") || lower.contains(".so") {
            Platform::Linux
        } else {
            Platform::Unknown
        }
    }

    /// Directory name used for this platform on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    /// Parses `windows` or `linux`; `unknown` is never accepted from callers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            _ => Err(Error::unknown_platform(s)),
        }
    }
}

/// One downloadable file within a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub download_url: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub local_path: PathBuf,
}

/// One upstream release, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Persisted self-update state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionState {
    /// Tag of the last fully applied release, empty when none
    pub current_version: String,
    /// Most recently fetched release, possibly ahead of `current_version`
    pub latest_known_release: Option<Release>,
}
