// src/lib.rs

//! Add-on repository index builder
//!
//! Scans a repository directory of packaged add-ons and produces the
//! `addons.xml` index that clients download to discover what a repository
//! offers.
//!
//! # Pipeline
//!
//! - Selection: newest archive of each add-on, by loose version order
//! - Statistics: previous month's download counts from the mirror network
//! - Enrichment: manifest metadata gains asset flags, size and downloads
//! - Output: `<addons>` document plus a reproducible gzip twin

pub mod compression;
mod error;
pub mod index_gen;
pub mod manifest;
pub mod repository;
pub mod version;

pub use error::{Error, Result};
pub use index_gen::{
    build_index, generate_index, gzip_path, write_index, IndexDocument, IndexGenConfig,
    IndexGenResult, INDEX_ROOT,
};
pub use manifest::{AddonManifest, Element, MetadataPoint, Node};
pub use repository::{
    Clock, DownloadStats, PackageArchive, StatsClient, StatsSource, SystemClock,
    DEFAULT_STATS_URL,
};
pub use version::{compare_versions, LooseVersion};
