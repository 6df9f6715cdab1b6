//! HTTP API
//!
//! Thin JSON layer over the release poller and the repository manager.
//! Anything that may touch the network or join a thread runs on the
//! blocking pool. Errors are `{ "error": "..." }` with a 4xx/5xx status.

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use plughub_core::sanitize::is_safe_segment;
use plughub_core::{Error, Platform, Release};
use plughub_repo::{RepoManager, TagOutcome};
use plughub_update::ReleasePoller;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<ReleasePoller>,
    pub repo: Arc<RepoManager>,
    pub repo_dir: PathBuf,
    pub scan_interval: Duration,
}

/// Error body returned by every route
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::UnknownTag { .. } | Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::UnknownPlatform { .. }
            | Error::InvalidRepoUrl { .. }
            | Error::InvalidUrl { .. }
            | Error::RepoUrlNotSet => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Run blocking core work off the async workers
async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> plughub_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(ApiError::from)
}

async fn read_file(path: PathBuf) -> ApiResult<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((name, bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ApiError::not_found(format!("File not found: {}", name)))
        }
        Err(e) => Err(Error::from(e).into()),
    }
}

fn file_response(name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", name),
            ),
        ],
        bytes,
    )
        .into_response()
}

fn release_summary(release: &Release) -> Value {
    json!({
        "tag_name": release.tag_name,
        "name": release.name,
        "published_at": release.published_at,
        "assets": release.assets.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/self", get(self_info))
        .route("/self/latest/info", get(latest_info))
        .route("/self/latest/download/{platform}", get(download_bundle))
        .route("/self/update", post(check_update))
        .route("/tags", get(list_tags))
        .route("/tags/{tag}", get(tag_info))
        .route("/tags/{tag}/process", post(process_tag))
        .route("/download/{tag}/{platform}/{package}", get(download_package))
        .route("/scan/start", post(start_scan))
        .route("/scan/stop", post(stop_scan))
        .route("/repo", get(get_repo).put(set_repo))
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn self_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "self_repo_url": state.poller.repo_url(),
        "current_version": state.poller.current_version(),
    }))
}

async fn latest_info(State(state): State<AppState>) -> ApiResult<Json<Release>> {
    state
        .poller
        .latest_release()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No release information cached yet"))
}

async fn download_bundle(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> ApiResult<Response> {
    let platform: Platform = platform.parse()?;

    // Serve the applied release; fall back to the latest descriptor
    let current = state.poller.current_version();
    let release = state
        .poller
        .release_history()
        .remove(&current)
        .or_else(|| state.poller.latest_release())
        .ok_or_else(|| ApiError::not_found("No release information cached yet"))?;

    let asset = release
        .assets
        .into_iter()
        .find(|asset| asset.platform == platform)
        .ok_or_else(|| {
            ApiError::not_found(format!("No {} bundle in {}", platform, release.tag_name))
        })?;

    let (name, bytes) = read_file(asset.local_path).await?;
    Ok(file_response(&name, bytes))
}

async fn check_update(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let poller = state.poller.clone();
    let latest = blocking(move || poller.check_latest()).await?;

    Ok(Json(json!({
        "status": "ok",
        "current_version": state.poller.current_version(),
        "latest": latest.as_ref().map(release_summary),
    })))
}

async fn list_tags(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.repo.tag_names())
}

async fn tag_info(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<Json<plughub_core::TagInfo>> {
    state
        .repo
        .get_tag_info(&tag)
        .map(Json)
        .ok_or_else(|| Error::unknown_tag(tag).into())
}

async fn process_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<Json<Value>> {
    let repo = state.repo.clone();
    let name = tag.clone();
    let outcome = blocking(move || repo.process_tag(&name)).await?;

    match outcome {
        TagOutcome::AlreadyProcessed => Ok(Json(json!({
            "tag": tag,
            "status": "already_processed",
        }))),
        TagOutcome::Processed {
            packages,
            failed_assets,
        } => Ok(Json(json!({
            "tag": tag,
            "status": "processed",
            "packages": packages,
            "failed_assets": failed_assets,
        }))),
        TagOutcome::NothingPackaged { .. } => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("No plugins packaged for tag {}", tag),
        )),
        TagOutcome::InProgress => Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("Tag {} is already being processed", tag),
        )),
    }
}

async fn download_package(
    State(state): State<AppState>,
    Path((tag, platform, package)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    if ![&tag, &platform, &package]
        .iter()
        .all(|segment| is_safe_segment(segment))
    {
        return Err(ApiError::bad_request("Invalid path segment"));
    }
    let platform: Platform = platform.parse()?;

    let path = state
        .repo_dir
        .join(&tag)
        .join(platform.as_str())
        .join(&package);
    let (name, bytes) = read_file(path).await?;
    Ok(file_response(&name, bytes))
}

async fn start_scan(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    if state.repo.repo_url().is_empty() {
        return Err(Error::RepoUrlNotSet.into());
    }
    state.repo.start(state.scan_interval)?;
    Ok(Json(json!({ "status": "started" })))
}

async fn stop_scan(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let repo = state.repo.clone();
    blocking(move || {
        repo.stop();
        Ok(())
    })
    .await?;
    Ok(Json(json!({ "status": "stopped" })))
}

async fn get_repo(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "url": state.repo.repo_url() }))
}

#[derive(Debug, Deserialize)]
struct SetRepoRequest {
    url: String,
}

async fn set_repo(
    State(state): State<AppState>,
    Json(request): Json<SetRepoRequest>,
) -> ApiResult<Json<Value>> {
    let repo = state.repo.clone();
    let url = request.url.clone();
    let tags = blocking(move || repo.set_repo_url(&url)).await?;
    Ok(Json(json!({ "url": request.url.trim(), "tags": tags })))
}
