//! Common test infrastructure for plughub-repo tests
//!
//! - bundle fixtures (zip and tar.gz built in memory)
//! - wiremock endpoints for the release list and bundle downloads
//! - a wired-up manager pointed at a mock server and temp dir

#![allow(dead_code)]

use plughub_core::types::{RetryPolicy, RuntimeConfig};
use plughub_repo::RepoManager;
use plughub_update::{ArtifactDownloader, GitHubReleaseCatalog};
use serde_json::{json, Value};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OWNER: &str = "acme";
pub const REPO: &str = "plugins";
pub const TAG: &str = "v1.2.0";
pub const PUBLISHED_AT: &str = "2024-05-01T10:00:00Z";

pub fn repo_url() -> String {
    format!("https://github.com/{}/{}", OWNER, REPO)
}

/// Zip bundle holding `entries`
pub fn zip_bundle(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Gzipped tarball holding `entries`
pub fn tar_gz_bundle(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn demo_bundle() -> Vec<u8> {
    zip_bundle(&[
        ("demo.so", "\x7fELF demo"),
        (
            "demo_tools.json",
            r#"{"tools":[{"name":"echo","description":"Echo input","parameters":{},"is_streaming":false}]}"#,
        ),
    ])
}

/// One release entry whose assets are served from `{base}/assets/{name}`
pub fn api_release(base: &str, tag: &str, assets: &[&str]) -> Value {
    json!({
        "tag_name": tag,
        "name": format!("Release {}", tag),
        "published_at": PUBLISHED_AT,
        "assets": assets
            .iter()
            .map(|name| json!({
                "name": name,
                "browser_download_url": format!("{}/assets/{}", base, name),
            }))
            .collect::<Vec<_>>(),
    })
}

pub async fn mock_release_list(server: &MockServer, releases: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/releases", OWNER, REPO)))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(releases)))
        .mount(server)
        .await;
}

/// Serve `body` at `/assets/{name}`, expected exactly `times` times
pub async fn mock_bundle(server: &MockServer, name: &str, body: Vec<u8>, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/assets/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mock_missing_bundle(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/assets/{}", name)))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

pub fn test_config(api_url: &str, data_dir: &Path) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.github.api_url = api_url.to_string();
    config.storage.data_dir = data_dir.to_path_buf();
    config.network.connect_timeout_secs = 2;
    config.network.api_timeout_secs = 5;
    config
        .retry_policies
        .operations
        .insert("download".to_string(), RetryPolicy::fixed(2, 10));
    config
        .retry_policies
        .operations
        .insert("remove-dir".to_string(), RetryPolicy::fixed(2, 10));
    config
}

/// Manager backed by the real GitHub catalog and downloader
pub fn manager(api_url: &str, data_dir: &Path) -> Arc<RepoManager> {
    let config = test_config(api_url, data_dir);
    let source = Arc::new(GitHubReleaseCatalog::from_config(&config).unwrap());
    let fetcher = Arc::new(ArtifactDownloader::from_config(&config).unwrap());
    Arc::new(RepoManager::from_config(&config, source, fetcher))
}
