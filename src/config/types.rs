//! Core configuration types for the crawler
//!
//! This module contains the main `CrawlConfig` struct that defines the
//! parameters of one crawl run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{
    DEFAULT_CATALOG_URL, DEFAULT_CITY_COOLDOWN_MS, DEFAULT_COMMUNITY_ATTEMPTS,
    DEFAULT_DEGRADED_THRESHOLD, DEFAULT_DISCOVERY_ATTEMPTS, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_MAX_CONCURRENT_CITIES, DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_RETRY_BACKOFF_MS,
    DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, EMBEDDED_DATA_END, EMBEDDED_DATA_START,
};

/// Main configuration struct for a crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Directory receiving the CSV tables, community documents and images.
    pub(crate) output_dir: PathBuf,

    /// Catalog page listing every city
    pub(crate) catalog_url: String,

    /// Maximum number of city tasks holding a browsing session at once
    /// Default: 5
    pub(crate) max_concurrent_cities: usize,

    /// Attempts for state discovery, city discovery and city scrapes
    pub(crate) discovery_attempts: u8,

    /// Attempts for one community scrape
    pub(crate) community_attempts: u8,

    /// Fixed pause between attempts of one stage
    pub(crate) retry_backoff_ms: u64,

    /// Pause at the end of each city task, while it still holds its permit
    pub(crate) city_cooldown_ms: u64,

    /// Timeout in seconds for page navigation
    ///
    /// Default: 60 seconds
    pub(crate) page_load_timeout_secs: u64,

    /// Timeout in seconds for catalog and image HTTP fetches
    pub(crate) fetch_timeout_secs: u64,

    pub(crate) viewport_width: u32,
    pub(crate) viewport_height: u32,
    pub(crate) headless: bool,

    /// File of `user:pass@host:port` lines; one is picked at random per session
    pub(crate) proxy_file: Option<PathBuf>,

    /// Failure ratio above which a stage marks the run degraded
    pub(crate) degraded_threshold: f64,

    /// Markers around the JSON payload embedded in community pages
    pub(crate) embedded_start_marker: String,
    pub(crate) embedded_end_marker: String,

    /// Chrome user data directory for the launched browser
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            max_concurrent_cities: DEFAULT_MAX_CONCURRENT_CITIES,
            discovery_attempts: DEFAULT_DISCOVERY_ATTEMPTS,
            community_attempts: DEFAULT_COMMUNITY_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            city_cooldown_ms: DEFAULT_CITY_COOLDOWN_MS,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            headless: true,
            proxy_file: None,
            degraded_threshold: DEFAULT_DEGRADED_THRESHOLD,
            embedded_start_marker: EMBEDDED_DATA_START.to_string(),
            embedded_end_marker: EMBEDDED_DATA_END.to_string(),
            chrome_data_dir: None,
        }
    }
}
