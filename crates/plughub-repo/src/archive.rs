//! Plugin bundle extraction and package creation.
//!
//! Bundles are `.zip`, `.tar.gz` or `.tgz`. Every entry name is passed
//! through the sanitizer as a whole, so `bin/demo.so` lands as
//! `bin_demo.so` directly inside the destination. Nothing can be written
//! outside it, and a binary stays next to its manifest however the bundle
//! nests them. Repackaged plugins are always deflated zips.

use flate2::read::GzDecoder;
use plughub_core::fs::check_path_len;
use plughub_core::sanitize::{sanitize_filename, MAX_PATH_LEN};
use plughub_core::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Supported bundle formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from a file name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

fn zip_error(archive: &Path, e: zip::result::ZipError) -> Error {
    Error::archive(format!("{}: {}", archive.display(), e))
}

/// Extract `archive` into `dest`, returning the paths written.
///
/// Directory entries and entries whose path would be too long are skipped.
/// Any other entry that cannot be written fails the whole extraction.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = ArchiveFormat::from_name(&name)
        .ok_or_else(|| Error::archive(format!("unsupported archive format: {}", name)))?;

    fs::create_dir_all(dest)?;
    let written = match format {
        ArchiveFormat::Zip => extract_zip(archive, dest)?,
        ArchiveFormat::TarGz => extract_tar_gz(archive, dest)?,
    };

    debug!(
        archive = %archive.display(),
        files = written.len(),
        "archive extracted"
    );
    Ok(written)
}

/// Flattened destination of one entry, or None (logged) when too long
fn entry_target(dest: &Path, raw_name: &str) -> Option<PathBuf> {
    let target = dest.join(sanitize_filename(raw_name));
    match check_path_len(&target, MAX_PATH_LEN) {
        Ok(()) => Some(target),
        Err(e) => {
            warn!(entry = %raw_name, error = %e, "skipping archive entry");
            None
        }
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| zip_error(archive, e))?;
    let mut written = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| zip_error(archive, e))?;
        if entry.is_dir() {
            continue;
        }

        let Some(target) = entry_target(dest, entry.name()) else {
            continue;
        };
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        written.push(target);
    }

    Ok(written)
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(archive)?;
    extract_tar(GzDecoder::new(BufReader::new(file)), dest)
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut tar = tar::Archive::new(reader);
    let mut written = Vec::new();

    for entry in tar.entries()? {
        let mut entry = entry?;
        // Directories, links and other special entries carry no plugin content
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let raw_name = entry.path()?.to_string_lossy().into_owned();
        let Some(target) = entry_target(dest, &raw_name) else {
            continue;
        };
        entry.unpack(&target)?;
        written.push(target);
    }

    Ok(written)
}

/// Write a zip at `output` holding each `(entry name, source file)` pair.
///
/// The archive is built in a temp file next to `output` and renamed into
/// place, so `output` never holds a partial zip.
pub fn create_package_zip(output: &Path, entries: &[(&str, &Path)]) -> Result<()> {
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let tmp = NamedTempFile::new_in(parent)?;
    let mut zip = ZipWriter::new(tmp);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, source) in entries {
        zip.start_file(*name, options)
            .map_err(|e| zip_error(output, e))?;
        let mut input = File::open(source)?;
        io::copy(&mut input, &mut zip)?;
    }

    let tmp = zip.finish().map_err(|e| zip_error(output, e))?;
    tmp.persist(output).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
