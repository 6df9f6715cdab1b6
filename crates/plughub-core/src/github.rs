//! GitHub repository URL parsing

use regex::Regex;
use std::sync::LazyLock;

use crate::sanitize::sanitize_filename;

/// Owner and repository name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    /// `owner/repo`, sanitized for use in an API path
    pub fn api_path(&self) -> String {
        format!(
            "{}/{}",
            sanitize_filename(&self.owner),
            sanitize_filename(&self.repo)
        )
    }
}

static REPO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?github\.com/([^/\s]+)/([^/\s]+?)(?:\.git)?/?$")
        .expect("repository URL regex is valid")
});

/// Split a GitHub URL into owner and repository.
///
/// Accepts an optional `.git` suffix and trailing slash. Returns `None` for
/// anything else.
///
/// ```rust
/// use plughub_core::github::parse_repo_url;
///
/// let coords = parse_repo_url("https://github.com/acme/plugins.git").unwrap();
/// assert_eq!(coords.owner, "acme");
/// assert_eq!(coords.repo, "plugins");
/// assert!(parse_repo_url("https://gitlab.com/acme/plugins").is_none());
/// ```
pub fn parse_repo_url(url: &str) -> Option<RepoCoordinates> {
    let caps = REPO_URL_RE.captures(url.trim())?;
    Some(RepoCoordinates {
        owner: caps.get(1)?.as_str().to_string(),
        repo: caps.get(2)?.as_str().to_string(),
    })
}
