//! # plughub-core
//!
//! Core library for PlugHub providing:
//! - Release, asset and tag catalog types shared by the update and repository paths
//! - Hierarchical runtime configuration (embedded defaults, YAML file, environment)
//! - Retry execution engine with policy-based configuration
//! - Filesystem-safe path sanitization and helpers
//! - A stoppable background loop primitive

pub mod background;
pub mod config;
pub mod error;
pub mod fs;
pub mod github;
pub mod retry;
pub mod sanitize;
pub mod types;
pub mod utils;

pub use background::BackgroundLoop;
pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use sanitize::sanitize_filename;
pub use types::{
    Asset, Platform, PluginPackageInfo, Release, RuntimeConfig, TagInfo, ToolInfo, VersionState,
};
pub use utils::get_home_dir;
