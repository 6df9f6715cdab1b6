//! Asset download with bounded retries and progress tracking
//!
//! - An asset whose `local_path` already exists is not fetched again
//! - Malformed URLs and 404 responses fail without retry
//! - Other failures are retried under the `download` policy (3 attempts, 5s apart)
//! - The body is held in memory and written with a temp-file-then-rename,
//!   so an aborted attempt never leaves a file at the destination

use indicatif::{ProgressBar, ProgressStyle};
use plughub_core::fs::write_atomic;
use plughub_core::retry::{RetryExecutorBuilder, TracingObserver, TransientErrorPredicate};
use plughub_core::types::{RetryPolicy, RuntimeConfig};
use plughub_core::{Asset, Error, Result};
use reqwest::blocking::Client;
use std::io::Read;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::client::build_client;
use crate::source::AssetFetcher;

/// Size of each read from the response body
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Download progress information
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Announced size, zero when the server sent no length
    pub total_bytes: u64,

    /// Bytes received so far
    pub downloaded_bytes: u64,

    /// Progress percentage (0-100), zero while the total is unknown
    pub percentage: f64,
}

impl DownloadProgress {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            downloaded_bytes: 0,
            percentage: 0.0,
        }
    }

    /// Record `bytes` more received
    pub fn advance(&mut self, bytes: u64) {
        self.downloaded_bytes += bytes;
        self.percentage = if self.total_bytes > 0 {
            (self.downloaded_bytes as f64 / self.total_bytes as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
    }

    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.downloaded_bytes >= self.total_bytes
    }
}

/// Split a download URL into host and path-with-query.
///
/// ```rust
/// use plughub_update::download::split_url;
///
/// let (host, path) = split_url("https://github.com/acme/p/releases/download/v1/a.zip").unwrap();
/// assert_eq!(host, "github.com");
/// assert_eq!(path, "/acme/p/releases/download/v1/a.zip");
/// ```
pub fn split_url(raw: &str) -> Result<(String, String)> {
    let url = Url::parse(raw).map_err(|_| Error::invalid_url(raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::invalid_url(raw));
    }
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => return Err(Error::invalid_url(raw)),
    };
    let path = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    Ok((host, path))
}

/// Downloads release assets to their local paths
pub struct ArtifactDownloader {
    client: Client,
    retry_policy: RetryPolicy,
    show_progress: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl ArtifactDownloader {
    /// Build a downloader from runtime configuration
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let client = build_client(
            &config.network,
            config.github.token.as_deref(),
            None,
            config.network.transfer_timeout(),
        )?;

        Ok(Self {
            client,
            retry_policy: config.retry_policies.for_operation("download"),
            show_progress: config.network.show_progress,
            cancel: None,
        })
    }

    /// Override the retry policy
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Abandon pending retries once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Fetch `asset` to `asset.local_path` unless it is already there
    pub fn download(&self, asset: &Asset) -> Result<()> {
        if asset.local_path.exists() {
            debug!(asset = %asset.name, path = %asset.local_path.display(), "already downloaded");
            return Ok(());
        }

        let (host, path) = split_url(&asset.download_url)?;
        debug!(asset = %asset.name, host = %host, path = %path, "downloading");

        let mut builder = RetryExecutorBuilder::new()
            .with_policy(self.retry_policy.clone())
            .with_predicate(TransientErrorPredicate)
            .with_observer(TracingObserver::new(format!("download {}", asset.name)));
        if let Some(flag) = &self.cancel {
            builder = builder.with_cancel_flag(flag.clone());
        }

        let body = builder
            .build()
            .execute(|| self.fetch_body(asset))
            .map_err(|e| e.into_inner())?;

        write_atomic(&asset.local_path, &body)?;
        info!(
            asset = %asset.name,
            path = %asset.local_path.display(),
            bytes = body.len(),
            "download complete"
        );
        Ok(())
    }

    /// One attempt: GET the asset and read the whole body
    fn fetch_body(&self, asset: &Asset) -> Result<Vec<u8>> {
        let mut response = self.client.get(&asset.download_url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::from_status(status.as_u16(), &asset.download_url));
        }

        let total = response.content_length().unwrap_or(0);
        let mut progress = DownloadProgress::new(total);
        let bar = self.progress_bar(&asset.name, total);

        let mut body = Vec::with_capacity(total.min(64 * 1024 * 1024) as usize);
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            let read = response.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
            progress.advance(read as u64);
            bar.set_position(progress.downloaded_bytes);
        }

        bar.finish_and_clear();
        debug!(
            asset = %asset.name,
            bytes = progress.downloaded_bytes,
            percentage = progress.percentage,
            "body received"
        );
        Ok(body)
    }

    fn progress_bar(&self, name: &str, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(name.to_string());
        bar
    }
}

impl AssetFetcher for ArtifactDownloader {
    fn fetch(&self, asset: &Asset) -> Result<()> {
        self.download(asset)
    }
}
