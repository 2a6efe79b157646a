// src/repository/stats.rs

//! Monthly download statistics for add-ons
//!
//! The mirror network publishes per-file download counts for each month.
//! Counts are reduced to one number per add-on id: the largest count seen
//! for any of its archives during the previous calendar month.

use crate::error::{Error, Result};
use chrono::{Datelike, Days, Local, NaiveDate};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Top-level mirror directory holding add-on archives
pub const STATS_PATH_PREFIX: &str = "/addons/";

/// Extension filter sent to, and re-applied on, the statistics endpoint
pub const STATS_EXTENSION_FILTER: &str = ".zip";

/// One row of the statistics response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsRecord {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Downloads")]
    pub downloads: DownloadCount,
}

/// Download count as served; the endpoint is not consistent about its type
///
/// Any other JSON value is accepted while decoding and only rejected when
/// the count of a kept record is read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DownloadCount {
    Integer(u64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl DownloadCount {
    /// Convert to an integer count, truncating fractional values
    pub fn to_count(&self) -> Result<u64> {
        match self {
            Self::Integer(n) => Ok(*n),
            Self::Float(f) if f.is_finite() && *f >= 0.0 => Ok(f.trunc() as u64),
            Self::Float(f) => Err(Error::ParseError(format!("Invalid download count: {f}"))),
            Self::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::ParseError(format!("Invalid download count '{s}': {e}"))),
            Self::Other(value) => {
                Err(Error::ParseError(format!("Invalid download count: {value}")))
            }
        }
    }
}

/// Something that can produce raw statistics records for a month
pub trait StatsSource {
    /// Fetch all records for a `YYYY-MM` month
    fn fetch_records(&self, month: &str) -> Result<Vec<StatsRecord>>;
}

/// Source of the current date
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Format the calendar month before `today` as `YYYY-MM`
pub fn previous_month(today: NaiveDate) -> Result<String> {
    // Stepping back day-of-month days lands on the last day of the previous month
    let last_day = today
        .checked_sub_days(Days::new(u64::from(today.day())))
        .ok_or_else(|| Error::ParseError(format!("No month precedes {today}")))?;

    Ok(last_day.format("%Y-%m").to_string())
}

/// Extract the add-on id from a mirror path such as `/addons/matrix/foo/foo-1.0.zip`
///
/// Returns None for anything that is not an add-on archive.
pub fn stats_addon_id(path: &str) -> Option<&str> {
    if !path.ends_with(STATS_EXTENSION_FILTER) || !path.starts_with(STATS_PATH_PREFIX) {
        return None;
    }

    let basename = path.rsplit('/').next()?;
    basename.rsplit_once('-').map(|(id, _)| id)
}

/// Download counts keyed by add-on id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStats {
    counts: HashMap<String, u64>,
}

impl DownloadStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a count, keeping the maximum seen for the id
    pub fn record(&mut self, addon_id: &str, downloads: u64) {
        let entry = self.counts.entry(addon_id.to_string()).or_insert(downloads);
        if downloads > *entry {
            *entry = downloads;
        }
    }

    /// Filter raw records and reduce them to one count per add-on
    pub fn from_records(records: &[StatsRecord]) -> Result<Self> {
        let mut stats = Self::new();
        let mut skipped = 0usize;

        for record in records {
            match stats_addon_id(&record.filename) {
                Some(addon_id) => stats.record(addon_id, record.downloads.to_count()?),
                None => skipped += 1,
            }
        }

        debug!(
            "Kept {} add-ons from {} records ({} skipped)",
            stats.len(),
            records.len(),
            skipped
        );
        Ok(stats)
    }

    pub fn get(&self, addon_id: &str) -> Option<u64> {
        self.counts.get(addon_id).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, u64)> for DownloadStats {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut stats = Self::new();
        for (addon_id, downloads) in iter {
            stats.record(addon_id.as_ref(), downloads);
        }
        stats
    }
}

/// Fetch and reduce the previous month's download statistics
pub fn fetch_download_stats(source: &dyn StatsSource, clock: &dyn Clock) -> Result<DownloadStats> {
    let month = previous_month(clock.today())?;
    info!("Fetching download statistics for {}", month);

    let records = source.fetch_records(&month)?;
    let stats = DownloadStats::from_records(&records)?;

    info!("Download statistics available for {} add-ons", stats.len());
    Ok(stats)
}
