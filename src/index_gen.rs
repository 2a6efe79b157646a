// src/index_gen.rs
//! Repository index generation
//!
//! Builds the `addons.xml` index of a repository directory: the newest
//! archive of every add-on is opened, its manifest enriched, and all
//! manifests gathered under one `<addons>` root, newest archive first.
//! The index is written twice, as plain XML and as a reproducible gzip twin.
//!
//! Building is kept apart from writing: [`build_index`] produces the bytes of
//! both files from a repository root, a statistics source and a clock, and
//! [`write_index`] puts them on disk.

use crate::compression::gzip_deterministic;
use crate::error::{Error, Result};
use crate::manifest::{enrich_archive, Element};
use crate::repository::{
    fetch_download_stats, find_archives, Clock, DownloadStats, PackageArchive, StatsSource,
};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Root element of the index document
pub const INDEX_ROOT: &str = "addons";

/// Index generation configuration
#[derive(Debug, Clone)]
pub struct IndexGenConfig {
    /// Repository root with one directory per add-on
    pub repo_dir: PathBuf,
    /// Path of the plain index; the gzip twin gets `.gz` appended
    pub output: PathBuf,
    /// Indent the XML for human readers
    pub prettify: bool,
}

/// Serialized index, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    pub xml: Vec<u8>,
    pub gzip: Vec<u8>,
    pub package_count: usize,
}

/// Result of index generation
#[derive(Debug)]
pub struct IndexGenResult {
    /// Path to the plain index
    pub index_path: PathBuf,
    /// Path to the gzip index
    pub gzip_path: PathBuf,
    /// Number of add-ons in the index
    pub package_count: usize,
}

/// `<output>.gz`, keeping the full original file name
pub fn gzip_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".gz");
    PathBuf::from(name)
}

/// Select the newest archive per add-on and order them newest file first
pub fn collect_archives(repo_dir: &Path) -> Result<Vec<PackageArchive>> {
    let mut dated: Vec<(SystemTime, PackageArchive)> = Vec::new();

    for archive in find_archives(repo_dir)? {
        let archive = archive?;
        let modified = fs::metadata(&archive.path)
            .and_then(|m| m.modified())
            .map_err(|e| {
                Error::IoError(format!(
                    "Failed to read modification time of {}: {e}",
                    archive.path.display()
                ))
            })?;
        debug!("Selected {} ({})", archive.path.display(), archive.version);
        dated.push((modified, archive));
    }

    dated.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(dated.into_iter().map(|(_, archive)| archive).collect())
}

/// Gather the enriched manifests of `archives`, in order, under `<addons>`
pub fn assemble_index(archives: &[PackageArchive], stats: &DownloadStats) -> Result<Element> {
    let mut root = Element::new(INDEX_ROOT);
    for archive in archives {
        root.push(enrich_archive(archive, stats)?);
    }
    Ok(root)
}

/// Build both index files in memory
///
/// Statistics are fetched before the repository is touched, so an
/// unreachable statistics endpoint fails the run early.
pub fn build_index(
    repo_dir: &Path,
    stats_source: &dyn StatsSource,
    clock: &dyn Clock,
    prettify: bool,
) -> Result<IndexDocument> {
    let stats = fetch_download_stats(stats_source, clock)?;

    let archives = collect_archives(repo_dir)?;
    info!(
        "Indexing {} add-ons from {}",
        archives.len(),
        repo_dir.display()
    );

    let root = assemble_index(&archives, &stats)?;
    let xml = root.to_document(prettify)?;
    let gzip = gzip_deterministic(&xml)
        .map_err(|e| Error::IoError(format!("Failed to compress index: {e}")))?;

    Ok(IndexDocument {
        xml,
        gzip,
        package_count: archives.len(),
    })
}

/// Stage bytes in a temporary file next to `dest`
fn stage(dir: &Path, dest: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let io_err = |e: std::io::Error| {
        Error::IoError(format!("Failed to stage {}: {e}", dest.display()))
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(data).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;

    // Temporary files are created owner-only; the index is published
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o644)).map_err(io_err)?;
    }

    Ok(file)
}

/// Copy the current file at `dest`, if any, to a temporary next to it
fn backup(dir: &Path, dest: &Path) -> Result<Option<NamedTempFile>> {
    if !dest.is_file() {
        return Ok(None);
    }

    let io_err = |e: std::io::Error| {
        Error::IoError(format!("Failed to back up {}: {e}", dest.display()))
    };
    let file = NamedTempFile::new_in(dir).map_err(io_err)?;
    fs::copy(dest, file.path()).map_err(io_err)?;
    Ok(Some(file))
}

/// Put `dest` back the way it was before a failed write
fn restore(previous: Option<NamedTempFile>, dest: &Path) {
    let outcome = match previous {
        Some(file) => file.persist(dest).map(|_| ()).map_err(|e| e.error),
        None => fs::remove_file(dest),
    };
    match outcome {
        Ok(()) => debug!("Restored {}", dest.display()),
        Err(e) => warn!("Failed to restore {}: {e}", dest.display()),
    }
}

/// Write the plain and gzip index files
///
/// Both files are fully written to temporaries before either is renamed
/// into place. If the gzip rename fails the previous plain index is put
/// back, so either both files are replaced or neither is.
pub fn write_index(document: &IndexDocument, output: &Path) -> Result<IndexGenResult> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let gz_path = gzip_path(output);

    let plain = stage(dir, output, &document.xml)?;
    let compressed = stage(dir, &gz_path, &document.gzip)?;
    let previous = backup(dir, output)?;

    plain.persist(output).map_err(|e| {
        Error::IoError(format!("Failed to write {}: {}", output.display(), e.error))
    })?;

    if let Err(e) = compressed.persist(&gz_path) {
        restore(previous, output);
        return Err(Error::IoError(format!(
            "Failed to write {}: {}",
            gz_path.display(),
            e.error
        )));
    }
    info!("Wrote index to {}", output.display());
    info!("Wrote compressed index to {}", gz_path.display());

    Ok(IndexGenResult {
        index_path: output.to_path_buf(),
        gzip_path: gz_path,
        package_count: document.package_count,
    })
}

/// Build and write the index described by `config`
pub fn generate_index(
    config: &IndexGenConfig,
    stats_source: &dyn StatsSource,
    clock: &dyn Clock,
) -> Result<IndexGenResult> {
    let document = build_index(&config.repo_dir, stats_source, clock, config.prettify)?;
    write_index(&document, &config.output)
}
