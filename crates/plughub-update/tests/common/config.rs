//! Runtime configuration for tests

use plughub_core::types::{RetryPolicy, RuntimeConfig};
use std::path::Path;

/// Config rooted at `data_dir`, talking to `api_url`, with millisecond retries
pub fn test_config(api_url: &str, data_dir: &Path) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.github.api_url = api_url.to_string();
    config.storage.data_dir = data_dir.to_path_buf();
    config.network.connect_timeout_secs = 2;
    config.network.read_timeout_secs = 5;
    config.network.write_timeout_secs = 5;
    config.network.api_timeout_secs = 5;
    config
        .retry_policies
        .operations
        .insert("download".to_string(), RetryPolicy::fixed(3, 10));
    config
}
