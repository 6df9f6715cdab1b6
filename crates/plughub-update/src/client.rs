//! Blocking HTTP client construction

use plughub_core::types::NetworkConfig;
use plughub_core::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::time::Duration;

/// Media type requested from the GitHub REST API
pub const GITHUB_JSON: &str = "application/vnd.github.v3+json";

/// Build a client carrying the configured user agent and an optional bearer token.
///
/// `timeout` bounds the whole request; the connect phase is bounded separately
/// by `network.connect_timeout_secs`. Redirects are followed.
pub fn build_client(
    network: &NetworkConfig,
    token: Option<&str>,
    accept: Option<&str>,
    timeout: Duration,
) -> Result<Client> {
    let mut headers = HeaderMap::new();

    if let Some(accept) = accept {
        let value = HeaderValue::from_str(accept)
            .map_err(|_| Error::invalid_config(format!("Invalid Accept header: {}", accept)))?;
        headers.insert(ACCEPT, value);
    }

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::invalid_config("GitHub token contains invalid characters"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    let client = Client::builder()
        .user_agent(&network.user_agent)
        .default_headers(headers)
        .connect_timeout(network.connect_timeout())
        .timeout(timeout)
        .build()?;

    Ok(client)
}
