// tests/common/mod.rs

//! Shared test utilities: fixture repositories and in-memory collaborators.

#![allow(dead_code)]

use addon_index::repository::{DownloadCount, StatsRecord};
use addon_index::{Clock, Element, Result, StatsSource};
use chrono::NaiveDate;
use filetime::FileTime;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Manifest with a metadata section under the given extension point
pub fn manifest_xml(id: &str, version: &str, point: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<addon id="{id}" name="{id}" version="{version}" provider-name="tester">
    <requires>
        <import addon="xbmc.python" version="3.0.0"/>
    </requires>
    <extension point="xbmc.python.script" library="default.py"/>
    <extension point="{point}">
        <summary lang="en_GB">Summary of {id}</summary>
        <platform>all</platform>
    </extension>
</addon>
"#
    )
}

/// Write `<repo>/<id>/<id>-<version>.zip` holding `<id>/addon.xml` plus the
/// named assets under `<id>/`, and return its path
pub fn write_addon(
    repo: &Path,
    id: &str,
    version: &str,
    manifest: &str,
    assets: &[&str],
) -> PathBuf {
    let dir = repo.join(id);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{id}-{version}.zip"));

    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    zip.start_file(format!("{id}/addon.xml"), SimpleFileOptions::default())
        .unwrap();
    zip.write_all(manifest.as_bytes()).unwrap();
    for asset in assets {
        zip.start_file(format!("{id}/{asset}"), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"asset").unwrap();
    }
    zip.finish().unwrap();

    path
}

/// Write an add-on with a current-style manifest and no assets
pub fn write_plain_addon(repo: &Path, id: &str, version: &str) -> PathBuf {
    write_addon(repo, id, version, &manifest_xml(id, version, "kodi.addon.metadata"), &[])
}

/// Set a file's modification time to `secs` after the epoch
pub fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

/// Statistics source answering from a fixed list of records
pub struct FakeStats {
    pub records: Vec<StatsRecord>,
}

impl FakeStats {
    pub fn new(counts: &[(&str, u64)]) -> Self {
        Self {
            records: counts
                .iter()
                .map(|(filename, downloads)| StatsRecord {
                    filename: filename.to_string(),
                    downloads: DownloadCount::Integer(*downloads),
                })
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }
}

impl StatsSource for FakeStats {
    fn fetch_records(&self, _month: &str) -> Result<Vec<StatsRecord>> {
        Ok(self.records.clone())
    }
}

/// Clock pinned to one day
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    pub fn new() -> Self {
        Self(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Metadata section of an indexed manifest
pub fn metadata_of(addon: &Element) -> &Element {
    addon
        .elements()
        .find(|e| {
            e.name == "extension"
                && matches!(
                    e.attribute("point"),
                    Some("kodi.addon.metadata") | Some("xbmc.addon.metadata")
                )
        })
        .expect("metadata section")
}
