//! Release tracking and artifact download for PlugHub
//!
//! Provides:
//! - Release queries against the GitHub API (latest release and all tags)
//! - Asset download with bounded retries and progress tracking
//! - Persisted current-version and latest-release state
//! - A background poller that applies new releases only when every asset downloads

pub mod client;
pub mod download;
pub mod poller;
pub mod releases;
pub mod source;
pub mod state;

pub use download::{ArtifactDownloader, DownloadProgress};
pub use poller::{PollOutcome, PollPhase, ReleasePoller};
pub use releases::{is_plugin_asset, GitHubReleaseCatalog};
pub use source::{AssetFetcher, ReleaseSource};
pub use state::VersionStateStore;

/// Current PlugHub version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
