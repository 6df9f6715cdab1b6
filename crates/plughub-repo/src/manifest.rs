//! Plugin tool manifests
//!
//! Every plugin binary ships with a sibling `{stem}_tools.json`:
//!
//! ```json
//! {
//!   "tools": [
//!     { "name": "echo", "description": "Echo input", "parameters": {}, "is_streaming": false }
//!   ],
//!   "version": "1.0.0",
//!   "author": "acme"
//! }
//! ```
//!
//! All fields are optional. A file that is not valid JSON is rejected.

use plughub_core::{Error, Result, ToolInfo};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Suffix appended to a binary's stem to name its manifest
pub const MANIFEST_SUFFIX: &str = "_tools.json";

/// One tool entry of a manifest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
    #[serde(default)]
    pub is_streaming: bool,
}

/// Parsed `{stem}_tools.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolManifest {
    #[serde(default)]
    pub tools: Vec<ToolEntry>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

impl ToolManifest {
    /// Manifest file name for a binary stem
    pub fn file_name(stem: &str) -> String {
        format!("{}{}", stem, MANIFEST_SUFFIX)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::manifest(path.display().to_string(), e.to_string()))
    }

    /// Tool names and descriptions, dropping unnamed entries
    pub fn tool_infos(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .filter(|tool| !tool.name.is_empty())
            .map(|tool| ToolInfo {
                name: tool.name.clone(),
                description: tool.description.clone(),
            })
            .collect()
    }
}
