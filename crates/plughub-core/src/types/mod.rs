//! Type definitions shared across PlugHub crates

mod catalog;
mod release;
mod runtime_config;

pub use catalog::{PluginPackageInfo, TagInfo, ToolInfo};
pub use release::{Asset, Platform, Release, VersionState};
pub use runtime_config::{
    GitHubConfig, NetworkConfig, RetryPoliciesConfig, RetryPolicy, RetryStrategy, RuntimeConfig,
    ScheduleConfig, ServerConfig, StorageConfig, UpdateConfig,
};
