//! Error types for plughub-core

use thiserror::Error;

/// Result type alias using plughub-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for PlugHub
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// Repository URL could not be split into owner and repo
    #[error("Invalid repository URL: {url}")]
    InvalidRepoUrl { url: String },

    /// Download URL could not be parsed
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Non-success HTTP status other than 404
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The remote resource does not exist
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// Archive could not be read or written
    #[error("Archive error: {0}")]
    Archive(String),

    /// Composed path exceeds the filesystem ceiling
    #[error("Path exceeds {limit} characters: {path}")]
    PathTooLong { path: String, limit: usize },

    /// Tag is not present in the catalog
    #[error("Unknown tag: {tag}")]
    UnknownTag { tag: String },

    /// Platform string is not windows or linux
    #[error("Unknown platform: {platform}. Valid platforms: windows, linux")]
    UnknownPlatform { platform: String },

    /// No plugin repository URL has been configured
    #[error("Repository URL is not set")]
    RepoUrlNotSet,

    /// Plugin manifest is missing or malformed
    #[error("Invalid plugin manifest {path}: {message}")]
    Manifest { path: String, message: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid repository URL error
    pub fn invalid_repo_url(url: impl Into<String>) -> Self {
        Self::InvalidRepoUrl { url: url.into() }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Map an HTTP status to `NotFound` for 404 and `HttpStatus` otherwise
    pub fn from_status(status: u16, url: impl Into<String>) -> Self {
        if status == 404 {
            Self::NotFound { url: url.into() }
        } else {
            Self::HttpStatus {
                status,
                url: url.into(),
            }
        }
    }

    /// Create an archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive(message.into())
    }

    /// Create a path too long error
    pub fn path_too_long(path: impl Into<String>, limit: usize) -> Self {
        Self::PathTooLong {
            path: path.into(),
            limit,
        }
    }

    /// Create an unknown tag error
    pub fn unknown_tag(tag: impl Into<String>) -> Self {
        Self::UnknownTag { tag: tag.into() }
    }

    /// Create an unknown platform error
    pub fn unknown_platform(platform: impl Into<String>) -> Self {
        Self::UnknownPlatform {
            platform: platform.into(),
        }
    }

    /// Create a manifest error
    pub fn manifest(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether a bounded retry may succeed where this attempt failed.
    ///
    /// Transport failures, non-404 statuses and IO errors are transient;
    /// 404s, malformed URLs, bad payloads and validation failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::HttpStatus { .. } | Self::Io(_)
        )
    }

    /// Whether this error means the remote resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
