// src/repository/mod.rs

//! Repository scanning and download statistics
//!
//! This module provides functionality for:
//! - Selecting the newest archive of every add-on in a repository directory
//! - Fetching monthly download statistics from the mirror network
//! - Reducing statistics to one download count per add-on

mod client;

pub mod selector;
pub mod stats;

pub use client::{StatsClient, DEFAULT_STATS_URL, HTTP_TIMEOUT};
pub use selector::{find_archives, select_latest, split_version, ArchiveSelector, PackageArchive};
pub use stats::{
    fetch_download_stats, previous_month, stats_addon_id, Clock, DownloadCount, DownloadStats,
    StatsRecord, StatsSource, SystemClock,
};
