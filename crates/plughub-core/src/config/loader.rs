//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Config file (`--config <path>`, else ~/.plughub/config.yaml)
//! 3. Environment variables (PLUGHUB_* prefix, plus GITHUB_TOKEN)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{RetryPoliciesConfig, RuntimeConfig};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const DEFAULTS_FILE: &str = "runtime-defaults.yaml";
const CONFIG_FILE: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct ConfigLoader {
    /// Base directory searched for `config.yaml`
    config_dir: Utf8PathBuf,

    /// Explicit config file, takes the place of `config_dir/config.yaml`
    config_file: Option<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a loader rooted at ~/.plughub
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self {
            config_dir,
            config_file: None,
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self {
            config_dir,
            config_file: None,
        }
    }

    /// Use an explicit config file instead of the directory default.
    ///
    /// Unlike the directory default, an explicit file must exist.
    pub fn with_file(mut self, path: Utf8PathBuf) -> Self {
        self.config_file = Some(path);
        self
    }

    /// Get the standard config directory (~/.plughub)
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = crate::utils::get_home_dir()
            .map_err(|e| Error::invalid_config(e.to_string()))?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Non UTF-8 home directory: {}", p.display())))?;

        Ok(home.join(".plughub"))
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        // Start with embedded defaults
        let mut config = Self::load_embedded_config::<RuntimeConfig>(DEFAULTS_FILE)?;

        match &self.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config_not_found(path.as_str()));
                }
                let file_config = self.load_yaml_file::<RuntimeConfig>(path)?;
                config = Self::merge_runtime_config(config, file_config);
            }
            None => {
                let path = self.config_dir.join(CONFIG_FILE);
                if path.exists() {
                    let file_config = self.load_yaml_file::<RuntimeConfig>(&path)?;
                    config = Self::merge_runtime_config(config, file_config);
                }
            }
        }

        config = self.apply_env_overrides(config)?;

        Ok(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        let config: T = serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })?;

        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let config: T = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Merge two runtime configs (base is overridden by overlay)
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            network: overlay.network,
            retry_policies: Self::merge_retry_policies(base.retry_policies, overlay.retry_policies),
            github: overlay.github,
            storage: overlay.storage,
            schedule: overlay.schedule,
            update: overlay.update,
            server: overlay.server,
        }
    }

    /// Merge retry policies
    fn merge_retry_policies(
        mut base: RetryPoliciesConfig,
        overlay: RetryPoliciesConfig,
    ) -> RetryPoliciesConfig {
        for (key, policy) in overlay.operations {
            base.operations.insert(key, policy);
        }
        base.default = overlay.default;
        base
    }

    fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
        value
            .parse()
            .map_err(|_| Error::invalid_config(format!("{} must be a valid number", name)))
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("PLUGHUB_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = env::var("PLUGHUB_PORT") {
            config.server.port = Self::parse_env("PLUGHUB_PORT", &val)?;
        }

        if let Ok(val) = env::var("PLUGHUB_POLL_INTERVAL_SECS") {
            config.schedule.release_poll_interval_secs =
                Self::parse_env("PLUGHUB_POLL_INTERVAL_SECS", &val)?;
        }

        if let Ok(val) = env::var("PLUGHUB_SCAN_INTERVAL_SECS") {
            config.schedule.repo_scan_interval_secs =
                Self::parse_env("PLUGHUB_SCAN_INTERVAL_SECS", &val)?;
        }

        // GitHub configuration
        if let Ok(val) = env::var("PLUGHUB_SELF_REPO_URL") {
            config.github.self_repo_url = Some(val);
        }

        if let Ok(val) = env::var("PLUGHUB_PLUGIN_REPO_URL") {
            config.github.plugin_repo_url = Some(val);
        }

        if let Ok(val) = env::var("PLUGHUB_GITHUB_API_URL") {
            config.github.api_url = val;
        }

        if let Ok(val) = env::var("GITHUB_TOKEN") {
            if !val.trim().is_empty() {
                config.github.token = Some(val.trim().to_string());
            }
        }

        if let Ok(val) = env::var("PLUGHUB_SHOW_PROGRESS") {
            config.network.show_progress = val.parse().unwrap_or(false);
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
