//! Mock server helpers for the release API and asset downloads

use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// `GET /repos/{owner}/{repo}/releases/latest`
pub async fn mock_latest_release(server: &MockServer, owner: &str, repo: &str, release: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/releases/latest", owner, repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// `GET /repos/{owner}/{repo}/releases`
pub async fn mock_release_list(server: &MockServer, owner: &str, repo: &str, releases: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/releases", owner, repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(releases)))
        .mount(server)
        .await;
}

/// `GET /{name}` returning `content`, expected exactly `times` times
pub async fn mock_download(server: &MockServer, name: &str, content: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .expect(times)
        .mount(server)
        .await;
}

/// First `fail_count` requests return 500, later ones succeed
pub async fn mock_flaky_download(server: &MockServer, name: &str, fail_count: u64, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", name)))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Every request returns `status`, expected exactly `times` times
pub async fn mock_status(server: &MockServer, name: &str, status: u16, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", name)))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

pub async fn mock_standard_download(server: &MockServer, name: &str) {
    mock_download(server, name, FAKE_BUNDLE_CONTENT, 1).await;
}
