// src/manifest/enrich.rs

//! Manifest enrichment from a packaged add-on
//!
//! Before a manifest goes into the index, index-time facts are appended to
//! its metadata section:
//! - `<noicon>`, `<nofanart>`, `<nochangelog>` set to `true` for each
//!   auxiliary asset the archive lacks (present assets add nothing)
//! - `<size>` with the archive size in bytes
//! - `<downloads>` with last month's download count, when known

use super::{AddonManifest, Element};
use crate::error::{Error, Result};
use crate::repository::{DownloadStats, PackageArchive};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Manifest file inside `<id>/`
pub const MANIFEST_FILE: &str = "addon.xml";

/// Optional assets whose absence is flagged in the index
pub const AUXILIARY_ASSETS: [&str; 3] = ["icon.png", "fanart.jpg", "changelog.txt"];

/// Index-time facts about one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    /// Auxiliary asset file names missing from the archive, in asset order
    pub missing_assets: Vec<&'static str>,
    /// Archive size on disk in bytes
    pub size: u64,
    /// Download count for the previous month
    pub downloads: Option<u64>,
}

/// Element name flagging a missing asset: `icon.png` -> `noicon`
fn missing_flag(asset: &str) -> String {
    let stem = Path::new(asset)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(asset);
    format!("no{stem}")
}

/// Append enrichment elements to the manifest's metadata section
///
/// A manifest without a metadata section is rejected rather than skipped, so
/// an add-on never disappears from the index unnoticed.
pub fn apply_enrichment(
    manifest: &mut AddonManifest,
    addon_id: &str,
    enrichment: &Enrichment,
) -> Result<()> {
    let metadata = manifest
        .metadata_mut()
        .ok_or_else(|| Error::MissingMetadata(addon_id.to_string()))?;

    for asset in &enrichment.missing_assets {
        metadata.push(Element::with_text(missing_flag(asset), "true"));
    }

    metadata.push(Element::with_text("size", enrichment.size.to_string()));

    if let Some(downloads) = enrichment.downloads {
        metadata.push(Element::with_text("downloads", downloads.to_string()));
    }

    Ok(())
}

/// Read and parse `<id>/addon.xml` from an open archive
pub fn read_manifest<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    addon_id: &str,
) -> Result<AddonManifest> {
    let name = format!("{addon_id}/{MANIFEST_FILE}");

    let mut entry = zip.by_name(&name).map_err(|e| match e {
        ZipError::FileNotFound => Error::NotFoundError(format!("{name} not found in archive")),
        e => Error::ArchiveError(format!("Failed to open {name}: {e}")),
    })?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| Error::ArchiveError(format!("Failed to read {name}: {e}")))?;

    AddonManifest::parse(&xml)
}

/// Auxiliary assets not present as `<id>/<asset>` in the archive
pub fn missing_assets<R: Read + Seek>(zip: &ZipArchive<R>, addon_id: &str) -> Vec<&'static str> {
    AUXILIARY_ASSETS
        .into_iter()
        .filter(|asset| {
            let wanted = format!("{addon_id}/{asset}");
            !zip.file_names().any(|name| name == wanted)
        })
        .collect()
}

/// Open an archive, read its manifest and return the enriched root element
pub fn enrich_archive(archive: &PackageArchive, stats: &DownloadStats) -> Result<Element> {
    let file = File::open(&archive.path).map_err(|e| {
        Error::IoError(format!("Failed to open {}: {e}", archive.path.display()))
    })?;
    let mut zip = ZipArchive::new(file).map_err(|e| {
        Error::ArchiveError(format!("Failed to read {}: {e}", archive.path.display()))
    })?;

    let mut manifest = read_manifest(&mut zip, &archive.addon_id).map_err(|e| match e {
        Error::ParseError(msg) => Error::ParseError(format!("{}: {msg}", archive.path.display())),
        e => e,
    })?;

    let enrichment = Enrichment {
        missing_assets: missing_assets(&zip, &archive.addon_id),
        size: archive.size()?,
        downloads: stats.get(&archive.addon_id),
    };
    debug!(
        "Enriching {} {}: {:?}",
        archive.addon_id, archive.version, enrichment
    );

    apply_enrichment(&mut manifest, &archive.addon_id, &enrichment)?;
    Ok(manifest.into_element())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<addon id="foo" name="Foo" version="2.0.0" provider-name="me">
    <extension point="xbmc.python.script" library="default.py"/>
    <extension point="kodi.addon.metadata">
        <summary>Foo</summary>
    </extension>
</addon>"#;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn archive_at(dir: &TempDir, name: &str, entries: &[(&str, &str)]) -> PackageArchive {
        let path = dir.path().join(name);
        write_zip(&path, entries);
        PackageArchive::from_path(&path).unwrap()
    }

    fn metadata_names(root: &Element) -> Vec<String> {
        let metadata = root
            .elements()
            .find(|e| e.attribute("point") == Some("kodi.addon.metadata"))
            .unwrap();
        metadata.elements().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn test_missing_flag_names() {
        assert_eq!(missing_flag("icon.png"), "noicon");
        assert_eq!(missing_flag("fanart.jpg"), "nofanart");
        assert_eq!(missing_flag("changelog.txt"), "nochangelog");
    }

    #[test]
    fn test_apply_enrichment_order() {
        let mut manifest = AddonManifest::parse(MANIFEST).unwrap();
        let enrichment = Enrichment {
            missing_assets: vec!["icon.png", "changelog.txt"],
            size: 2048,
            downloads: Some(42),
        };
        apply_enrichment(&mut manifest, "foo", &enrichment).unwrap();

        let root = manifest.into_element();
        assert_eq!(
            metadata_names(&root),
            vec!["summary", "noicon", "nochangelog", "size", "downloads"]
        );
    }

    #[test]
    fn test_apply_enrichment_without_downloads() {
        let mut manifest = AddonManifest::parse(MANIFEST).unwrap();
        let enrichment = Enrichment {
            missing_assets: Vec::new(),
            size: 7,
            downloads: None,
        };
        apply_enrichment(&mut manifest, "foo", &enrichment).unwrap();
        assert_eq!(metadata_names(manifest.root()), vec!["summary", "size"]);
    }

    #[test]
    fn test_apply_enrichment_requires_metadata() {
        let mut manifest = AddonManifest::parse(r#"<addon id="foo"/>"#).unwrap();
        let enrichment = Enrichment {
            missing_assets: Vec::new(),
            size: 1,
            downloads: None,
        };
        let result = apply_enrichment(&mut manifest, "foo", &enrichment);
        assert!(matches!(result, Err(Error::MissingMetadata(id)) if id == "foo"));
    }

    #[test]
    fn test_enrich_archive_flags_missing_assets() {
        let dir = TempDir::new().unwrap();
        let archive = archive_at(
            &dir,
            "foo-2.0.0.zip",
            &[
                ("foo/addon.xml", MANIFEST),
                ("foo/fanart.jpg", "jpeg"),
                // wrong directory, must not count as present
                ("other/icon.png", "png"),
            ],
        );

        let stats: DownloadStats = vec![("foo", 42)].into_iter().collect();
        let root = enrich_archive(&archive, &stats).unwrap();

        let metadata = root
            .elements()
            .find(|e| e.attribute("point") == Some("kodi.addon.metadata"))
            .unwrap();
        assert_eq!(metadata.child("noicon").unwrap().text(), "true");
        assert_eq!(metadata.child("nochangelog").unwrap().text(), "true");
        assert!(metadata.child("nofanart").is_none());
        assert_eq!(metadata.child("downloads").unwrap().text(), "42");

        let size = fs::metadata(&archive.path).unwrap().len();
        assert_eq!(metadata.child("size").unwrap().text(), size.to_string());
    }

    #[test]
    fn test_enrich_archive_all_assets_present() {
        let dir = TempDir::new().unwrap();
        let archive = archive_at(
            &dir,
            "foo-1.0.zip",
            &[
                ("foo/addon.xml", MANIFEST),
                ("foo/icon.png", "png"),
                ("foo/fanart.jpg", "jpeg"),
                ("foo/changelog.txt", "v1"),
            ],
        );

        let root = enrich_archive(&archive, &DownloadStats::new()).unwrap();
        assert_eq!(metadata_names(&root), vec!["summary", "size"]);
    }

    #[test]
    fn test_enrich_archive_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let archive = archive_at(&dir, "foo-1.0.zip", &[("bar/addon.xml", MANIFEST)]);

        let result = enrich_archive(&archive, &DownloadStats::new());
        assert!(matches!(result, Err(Error::NotFoundError(_))));
    }

    #[test]
    fn test_enrich_archive_corrupt_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foo-1.0.zip");
        fs::write(&path, b"this is not a zip file").unwrap();
        let archive = PackageArchive::from_path(&path).unwrap();

        let result = enrich_archive(&archive, &DownloadStats::new());
        assert!(matches!(result, Err(Error::ArchiveError(_))));
    }

    #[test]
    fn test_enrich_archive_invalid_manifest_names_archive() {
        let dir = TempDir::new().unwrap();
        let archive = archive_at(
            &dir,
            "foo-1.0.zip",
            &[("foo/addon.xml", "<addon><broken></addon>")],
        );

        match enrich_archive(&archive, &DownloadStats::new()) {
            Err(Error::ParseError(msg)) => assert!(msg.contains("foo-1.0.zip")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
