//! Common test infrastructure for plughub-update tests
//!
//! - `constants`: tags, bundle names, body content
//! - `builders`: GitHub API payloads and core release values
//! - `mock_server`: wiremock endpoints for the release API and downloads
//! - `fakes`: in-memory `ReleaseSource` / `AssetFetcher`
//! - `config`: runtime configuration pointed at a temp dir and mock server

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod config;
pub mod constants;
pub mod fakes;
pub mod mock_server;

pub use builders::*;
pub use config::*;
pub use constants::*;
pub use fakes::*;
pub use mock_server::*;
