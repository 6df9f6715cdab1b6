//! Tag processing: download, extract, scan and repackage.
//!
//! For one tag:
//! 1. every plugin bundle is downloaded in parallel, one worker per asset,
//!    and all workers are joined before anything is extracted
//! 2. each downloaded bundle is extracted into `{tag}/temp_extract`
//! 3. every `.dll`/`.so` with a sibling `{stem}_tools.json` becomes
//!    `{tag}/{platform}/{name}_{tag}_{unix time}.zip`
//! 4. the scratch directory is removed after each bundle, whatever happened
//!
//! Problems with one asset or one binary are logged and skipped. Only a
//! tag directory that cannot exist is an error for the whole tag.

use chrono::Utc;
use plughub_core::fs::{check_path_len, remove_dir_with_retry};
use plughub_core::sanitize::{
    sanitize_filename, MAX_DIR_LEN, MAX_FILE_NAME_LEN, MAX_PATH_LEN, MAX_SCRATCH_DIR_LEN,
};
use plughub_core::types::{RetryPolicy, RuntimeConfig};
use plughub_core::{Asset, Error, Platform, PluginPackageInfo, Result, TagInfo};
use plughub_update::AssetFetcher;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive::{create_package_zip, extract_archive};
use crate::manifest::ToolManifest;

/// Scratch directory name inside a tag directory
pub const SCRATCH_DIR: &str = "temp_extract";

/// Platform of a plugin binary, judged by its extension
pub fn binary_platform(path: &Path) -> Option<Platform> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("dll") {
        Some(Platform::Windows)
    } else if ext.eq_ignore_ascii_case("so") {
        Some(Platform::Linux)
    } else {
        None
    }
}

/// What one pipeline run produced
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// New plugin packages keyed by id
    pub packages: BTreeMap<String, PluginPackageInfo>,

    /// Assets that could not be downloaded or extracted
    pub failed_assets: Vec<String>,

    /// Binaries left out (missing or invalid manifest, oversized names)
    pub skipped_binaries: Vec<String>,
}

/// Turns the plugin bundles of one tag into per-plugin packages
pub struct TagPipeline {
    repo_dir: PathBuf,
    fetcher: Arc<dyn AssetFetcher>,
    cleanup_policy: RetryPolicy,
}

impl TagPipeline {
    pub fn new(
        repo_dir: impl Into<PathBuf>,
        fetcher: Arc<dyn AssetFetcher>,
        cleanup_policy: RetryPolicy,
    ) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            fetcher,
            cleanup_policy,
        }
    }

    /// Pipeline writing under the configured repository directory
    pub fn from_config(config: &RuntimeConfig, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self::new(
            config.storage.repo_dir(),
            fetcher,
            config.retry_policies.for_operation("remove-dir"),
        )
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Output directory of `tag`, rejected when too long to hold packages
    pub fn tag_dir(&self, tag: &str) -> Result<PathBuf> {
        let dir = self.repo_dir.join(sanitize_filename(tag));
        check_path_len(&dir, MAX_DIR_LEN)?;
        Ok(dir)
    }

    /// Process every asset of `tag`; `owner` becomes the default author
    pub fn run(&self, tag: &TagInfo, owner: &str) -> Result<PipelineReport> {
        let tag_name = sanitize_filename(&tag.tag_name);
        let tag_dir = self.tag_dir(&tag_name)?;
        fs::create_dir_all(&tag_dir)?;

        info!(tag = %tag_name, assets = tag.assets.len(), "processing tag");

        let (downloaded, failed) = self.download_all(&tag.assets);
        info!(
            tag = %tag_name,
            downloaded = downloaded.len(),
            total = tag.assets.len(),
            "download phase finished"
        );

        let mut report = PipelineReport {
            failed_assets: failed,
            ..Default::default()
        };

        for asset in downloaded {
            self.process_asset(tag, &tag_name, owner, asset, &tag_dir, &mut report);
        }

        Ok(report)
    }

    /// Fetch all assets on scoped worker threads and wait for every one
    fn download_all<'a>(&self, assets: &'a [Asset]) -> (Vec<&'a Asset>, Vec<String>) {
        let mut failed = Vec::new();
        let mut runnable = Vec::new();
        for asset in assets {
            match check_path_len(&asset.local_path, MAX_PATH_LEN) {
                Ok(()) => runnable.push(asset),
                Err(e) => {
                    warn!(asset = %asset.name, error = %e, "skipping asset");
                    failed.push(asset.name.clone());
                }
            }
        }

        let fetcher = &self.fetcher;
        let results: Vec<(&Asset, Result<()>)> = thread::scope(|scope| {
            let handles: Vec<_> = runnable
                .into_iter()
                .map(|asset| (asset, scope.spawn(move || fetcher.fetch(asset))))
                .collect();

            handles
                .into_iter()
                .map(|(asset, handle)| {
                    let result = handle.join().unwrap_or_else(|_| {
                        Err(Error::Io(io::Error::other("download worker panicked")))
                    });
                    (asset, result)
                })
                .collect()
        });

        let mut downloaded = Vec::new();
        for (asset, result) in results {
            match result {
                Ok(()) => downloaded.push(asset),
                Err(e) => {
                    warn!(asset = %asset.name, error = %e, "asset download failed");
                    failed.push(asset.name.clone());
                }
            }
        }
        (downloaded, failed)
    }

    fn process_asset(
        &self,
        tag: &TagInfo,
        tag_name: &str,
        owner: &str,
        asset: &Asset,
        tag_dir: &Path,
        report: &mut PipelineReport,
    ) {
        let scratch = tag_dir.join(SCRATCH_DIR);
        if let Err(e) = check_path_len(&scratch, MAX_SCRATCH_DIR_LEN) {
            warn!(asset = %asset.name, error = %e, "scratch directory too long");
            report.failed_assets.push(asset.name.clone());
            return;
        }

        // Leftovers of an interrupted run must not leak into this bundle
        remove_dir_with_retry(&scratch, &self.cleanup_policy);

        match extract_archive(&asset.local_path, &scratch) {
            Ok(_) => self.repackage(tag, tag_name, owner, &scratch, report),
            Err(e) => {
                warn!(asset = %asset.name, error = %e, "extraction failed, skipping asset");
                report.failed_assets.push(asset.name.clone());
            }
        }

        remove_dir_with_retry(&scratch, &self.cleanup_policy);
    }

    fn repackage(
        &self,
        tag: &TagInfo,
        tag_name: &str,
        owner: &str,
        scratch: &Path,
        report: &mut PipelineReport,
    ) {
        let binaries: Vec<(PathBuf, Platform)> = WalkDir::new(scratch)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let platform = binary_platform(entry.path())?;
                Some((entry.into_path(), platform))
            })
            .collect();

        debug!(tag = %tag_name, binaries = binaries.len(), "scanned scratch directory");

        for (binary, platform) in binaries {
            let built = self.package_binary(
                &binary,
                platform,
                tag,
                tag_name,
                owner,
                scratch,
                &report.packages,
            );
            match built {
                Ok(package) => {
                    report.packages.insert(package.id.clone(), package);
                }
                Err(e) => {
                    warn!(binary = %binary.display(), error = %e, "skipping plugin binary");
                    report.skipped_binaries.push(file_name_of(&binary));
                }
            }
        }
    }

    /// Build `{name}_{tag}_{unix time}.zip` from a binary and its manifest.
    ///
    /// Neither the id nor the archive may replace one already built for
    /// this tag.
    #[allow(clippy::too_many_arguments)]
    fn package_binary(
        &self,
        binary: &Path,
        platform: Platform,
        tag: &TagInfo,
        tag_name: &str,
        owner: &str,
        scratch: &Path,
        taken: &BTreeMap<String, PluginPackageInfo>,
    ) -> Result<PluginPackageInfo> {
        let file_name = file_name_of(binary);
        let plugin_name = sanitize_filename(
            &binary
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let manifest_name = ToolManifest::file_name(&plugin_name);
        let manifest_path = scratch.join(&manifest_name);
        if !manifest_path.is_file() {
            return Err(Error::manifest(
                manifest_path.display().to_string(),
                "manifest not found",
            ));
        }
        let manifest = ToolManifest::load(&manifest_path)?;

        let output_dir = self.repo_dir.join(tag_name).join(platform.as_str());
        check_path_len(&output_dir, MAX_DIR_LEN)?;

        let stem = format!("{}_{}_{}", plugin_name, tag_name, Utc::now().timestamp());
        let package_path = free_path(&output_dir, &stem, "zip");
        let package_name = file_name_of(&package_path);
        if package_name.len() > MAX_FILE_NAME_LEN {
            return Err(Error::path_too_long(package_name, MAX_FILE_NAME_LEN));
        }
        check_path_len(&package_path, MAX_PATH_LEN)?;
        let id = free_package_id(
            taken,
            &sanitize_filename(&format!("{}_{}", owner, plugin_name)),
            platform,
        );

        let tools = manifest.tool_infos();
        create_package_zip(
            &package_path,
            &[
                (file_name.as_str(), binary),
                (manifest_name.as_str(), manifest_path.as_path()),
            ],
        )?;
        info!(
            tag = %tag_name,
            plugin = %plugin_name,
            platform = %platform,
            path = %package_path.display(),
            "plugin package created"
        );

        Ok(PluginPackageInfo {
            id,
            version: manifest
                .version
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| tag_name.to_string()),
            description: manifest.description.unwrap_or_default(),
            author: manifest
                .author
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| owner.to_string()),
            release_date: tag.published_at.clone(),
            tag_name: tag_name.to_string(),
            local_path: package_path,
            platform,
            tools,
            name: plugin_name,
        })
    }
}

/// `base`, else `base_{platform}`, else `base_{platform}_{n}` for the first
/// free `n`
fn free_package_id(
    taken: &BTreeMap<String, PluginPackageInfo>,
    base: &str,
    platform: Platform,
) -> String {
    if !taken.contains_key(base) {
        return base.to_string();
    }
    let with_platform = sanitize_filename(&format!("{}_{}", base, platform));
    let id = std::iter::once(with_platform.clone())
        .chain((2..10_000).map(|n| sanitize_filename(&format!("{}_{}", with_platform, n))))
        .find(|id| !taken.contains_key(id))
        .unwrap_or(with_platform);
    warn!(id = %base, renamed = %id, "plugin id already used in this tag");
    id
}

/// `dir/{stem}.{ext}`, or `dir/{stem}_{n}.{ext}` when that file exists
fn free_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let first = dir.join(format!("{}.{}", stem, ext));
    if !first.exists() {
        return first;
    }
    (2..10_000)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or(first)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
