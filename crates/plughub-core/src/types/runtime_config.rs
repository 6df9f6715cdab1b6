//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior like
//! network timeouts, retry policies, storage locations and loop intervals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Retry policy configurations
    #[serde(default)]
    pub retry_policies: RetryPoliciesConfig,

    /// GitHub API and repository settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// On-disk locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Background loop intervals
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Self-update settings
    #[serde(default)]
    pub update: UpdateConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Write timeout in seconds
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,

    /// Timeout for release API queries in seconds
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Draw a progress bar for downloads
    #[serde(default)]
    pub show_progress: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            write_timeout_secs: default_write_timeout(),
            api_timeout_secs: default_api_timeout(),
            user_agent: default_user_agent(),
            show_progress: false,
        }
    }
}

impl NetworkConfig {
    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Whole-request ceiling for downloads (read + write)
    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs.saturating_add(self.write_timeout_secs))
    }

    /// Whole-request ceiling for API queries
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

fn default_connect_timeout() -> u64 {
    10
}
fn default_read_timeout() -> u64 {
    30
}
fn default_write_timeout() -> u64 {
    10
}
fn default_api_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!(
        "plughub/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Retry policy configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default retry policy
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();

        operations.insert(
            "download".to_string(),
            RetryPolicy::fixed(3, 5000),
        );
        operations.insert(
            "remove-dir".to_string(),
            RetryPolicy::fixed(3, 500),
        );

        Self {
            default: RetryPolicy::default(),
            operations,
        }
    }
}

impl RetryPoliciesConfig {
    /// Policy for a named operation, falling back to the default
    pub fn for_operation(&self, name: &str) -> RetryPolicy {
        self.operations
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry strategy
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Fixed delay between a bounded number of attempts
    pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            strategy: RetryStrategy::FixedDelay,
            backoff_multiplier: 1.0,
            initial_delay_ms: delay_ms,
            max_delay_ms: delay_ms,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}

/// Retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// No delay between attempts
    None,

    /// Fixed delay between retries
    FixedDelay,

    /// Exponential backoff (default)
    #[default]
    ExponentialBackoff,

    /// Linear backoff
    LinearBackoff,
}

/// GitHub API and repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Base URL for GitHub API
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Bearer token sent with API requests
    #[serde(default)]
    pub token: Option<String>,

    /// Repository whose latest release is tracked for self-update
    #[serde(default)]
    pub self_repo_url: Option<String>,

    /// Repository whose tags are scanned for plugin bundles
    #[serde(default)]
    pub plugin_repo_url: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            token: None,
            self_repo_url: None,
            plugin_repo_url: None,
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

/// On-disk locations; relative entries resolve against `data_dir`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_update_dir")]
    pub update_dir: PathBuf,

    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,

    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,

    #[serde(default = "default_release_info_file")]
    pub release_info_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            update_dir: default_update_dir(),
            repo_dir: default_repo_dir(),
            version_file: default_version_file(),
            release_info_file: default_release_info_file(),
        }
    }
}

impl StorageConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Directory holding self-update bundles, one subdirectory per platform
    pub fn update_dir(&self) -> PathBuf {
        self.resolve(&self.update_dir)
    }

    /// Root of the repackaged plugin repository
    pub fn repo_dir(&self) -> PathBuf {
        self.resolve(&self.repo_dir)
    }

    /// File holding the current version tag
    pub fn version_file(&self) -> PathBuf {
        self.resolve(&self.version_file)
    }

    /// File holding the latest known release descriptor
    pub fn release_info_file(&self) -> PathBuf {
        self.resolve(&self.release_info_file)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_update_dir() -> PathBuf {
    PathBuf::from("updates")
}
fn default_repo_dir() -> PathBuf {
    PathBuf::from("plugin_repo")
}
fn default_version_file() -> PathBuf {
    PathBuf::from("latest_version.txt")
}
fn default_release_info_file() -> PathBuf {
    PathBuf::from("release_info.json")
}

/// Background loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScheduleConfig {
    #[serde(default = "default_poll_interval")]
    pub release_poll_interval_secs: u64,

    #[serde(default = "default_scan_interval")]
    pub repo_scan_interval_secs: u64,

    #[serde(default = "default_enabled")]
    pub release_poll_enabled: bool,

    #[serde(default = "default_enabled")]
    pub repo_scan_enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            release_poll_interval_secs: default_poll_interval(),
            repo_scan_interval_secs: default_scan_interval(),
            release_poll_enabled: true,
            repo_scan_enabled: true,
        }
    }
}

impl ScheduleConfig {
    pub fn release_poll_interval(&self) -> Duration {
        Duration::from_secs(self.release_poll_interval_secs)
    }

    pub fn repo_scan_interval(&self) -> Duration {
        Duration::from_secs(self.repo_scan_interval_secs)
    }
}

fn default_poll_interval() -> u64 {
    30
}
fn default_scan_interval() -> u64 {
    900
}
fn default_enabled() -> bool {
    true
}

/// Self-update configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateConfig {
    /// Asset names accepted from the latest release
    #[serde(default = "default_bundle_names")]
    pub bundle_names: Vec<String>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            bundle_names: default_bundle_names(),
        }
    }
}

fn default_bundle_names() -> Vec<String> {
    vec![
        "mcp-server-windows.zip".to_string(),
        "mcp-server-linux.zip".to_string(),
    ]
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    6680
}
