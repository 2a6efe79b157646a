// src/repository/selector.rs

//! Archive selection for a repository directory
//!
//! Each immediate subdirectory of the repository root holds the packaged
//! archives of one add-on, named `<id>-<version>.zip`. Only the highest
//! version of each add-on goes into the index.

use crate::error::{Error, Result};
use crate::version::LooseVersion;
use std::ffi::OsStr;
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of packaged add-ons
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Separator between add-on id and version in archive names
pub const VERSION_SEPARATOR: char = '-';

/// A packaged add-on archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageArchive {
    pub path: PathBuf,
    pub addon_id: String,
    pub version: String,
}

impl PackageArchive {
    /// Interpret a path as `<id>-<version>.zip`
    ///
    /// Returns None when the extension is wrong or the name has no separator.
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.extension() != Some(OsStr::new(ARCHIVE_EXTENSION)) {
            return None;
        }

        let stem = path.file_stem()?.to_str()?;
        let (addon_id, version) = split_version(stem)?;

        Some(Self {
            path: path.to_path_buf(),
            addon_id: addon_id.to_string(),
            version: version.to_string(),
        })
    }

    pub fn loose_version(&self) -> LooseVersion {
        LooseVersion::parse(&self.version)
    }

    /// Size of the archive on disk in bytes
    pub fn size(&self) -> Result<u64> {
        fs::metadata(&self.path).map(|m| m.len()).map_err(|e| {
            Error::IoError(format!("Failed to stat {}: {e}", self.path.display()))
        })
    }
}

/// Split `<id>-<version>` at the last separator
pub fn split_version(stem: &str) -> Option<(&str, &str)> {
    stem.rsplit_once(VERSION_SEPARATOR)
}

/// Lazy iterator yielding the newest archive of each add-on directory
///
/// Directories are visited in listing order; directories without any
/// matching archive yield nothing.
pub struct ArchiveSelector {
    root: PathBuf,
    entries: ReadDir,
}

impl Iterator for ArchiveSelector {
    type Item = Result<PackageArchive>;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    return Some(Err(Error::IoError(format!(
                        "Failed to read {}: {e}",
                        self.root.display()
                    ))));
                }
            };

            if !path.is_dir() {
                continue;
            }

            match select_latest(&path) {
                Ok(Some(archive)) => return Some(Ok(archive)),
                Ok(None) => debug!("No archives in {}", path.display()),
                Err(e) => return Some(Err(e)),
            }
        }

        None
    }
}

/// Start selecting archives under a repository root
pub fn find_archives(repo_dir: &Path) -> Result<ArchiveSelector> {
    let entries = fs::read_dir(repo_dir).map_err(|e| {
        Error::IoError(format!("Failed to read repository {}: {e}", repo_dir.display()))
    })?;

    Ok(ArchiveSelector {
        root: repo_dir.to_path_buf(),
        entries,
    })
}

/// Pick the highest-versioned archive in one add-on directory
///
/// Among equal versions the first in listing order wins.
pub fn select_latest(addon_dir: &Path) -> Result<Option<PackageArchive>> {
    let entries = fs::read_dir(addon_dir).map_err(|e| {
        Error::IoError(format!("Failed to read {}: {e}", addon_dir.display()))
    })?;

    let mut best: Option<(LooseVersion, PackageArchive)> = None;

    for entry in entries {
        let entry = entry.map_err(|e| {
            Error::IoError(format!("Failed to read {}: {e}", addon_dir.display()))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(candidate) = PackageArchive::from_path(&path) else {
            continue;
        };
        let version = candidate.loose_version();

        let replace = match &best {
            None => true,
            Some((best_version, _)) => version > *best_version,
        };
        if replace {
            best = Some((version, candidate));
        }
    }

    Ok(best.map(|(_, archive)| archive))
}
