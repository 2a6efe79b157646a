// src/repository/client.rs

//! HTTP client for the mirror statistics endpoint
//!
//! A single blocking GET per run. Failures are not retried: an index built
//! without download counts would silently drop them for every add-on, so
//! the whole run fails instead.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::info;
use url::Url;

use super::stats::{StatsRecord, StatsSource, STATS_EXTENSION_FILTER};

/// Statistics endpoint of the Kodi mirror network
pub const DEFAULT_STATS_URL: &str = "http://mirrors.kodi.tv/stats";

/// Default timeout for HTTP requests (30 seconds)
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for the download statistics endpoint
pub struct StatsClient {
    client: Client,
    base_url: Url,
}

impl StatsClient {
    /// Create a client with the default timeout
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, HTTP_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid stats URL '{base_url}': {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Full request URL for a `YYYY-MM` month, with no result limit
    pub fn stats_url(&self, month: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("downloadstats", month)
            .append_pair("filter", STATS_EXTENSION_FILTER)
            .append_pair("format", "json")
            .append_pair("limit", "0");
        url
    }
}

impl StatsSource for StatsClient {
    fn fetch_records(&self, month: &str) -> Result<Vec<StatsRecord>> {
        let url = self.stats_url(month);
        info!("Requesting {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        let records: Vec<StatsRecord> = response
            .json()
            .map_err(|e| Error::ParseError(format!("Failed to parse statistics JSON: {e}")))?;

        info!("Received {} statistics records", records.len());
        Ok(records)
    }
}
