//! Plugin repository scanning and repackaging for PlugHub
//!
//! Provides:
//! - Bundle extraction (zip, tar.gz) and plugin package creation
//! - Tool manifest parsing
//! - The per-tag pipeline: parallel download, extract, scan, repackage
//! - Per-tag catalog persistence
//! - A repository manager with an optional periodic scan

pub mod archive;
pub mod manager;
pub mod manifest;
pub mod pipeline;
pub mod store;

pub use manager::{RepoManager, ScanSummary, TagOutcome};
pub use manifest::{ToolEntry, ToolManifest};
pub use pipeline::{PipelineReport, TagPipeline};
pub use store::CatalogStore;
