//! Getter methods for `CrawlConfig`
//!
//! This module provides the accessor methods for retrieving configuration
//! values from a `CrawlConfig` instance.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::CrawlConfig;
use crate::utils::{APARTMENTS_CSV, COMMUNITIES_CSV, COMMUNITY_DOCS_DIR, IMAGES_DIR};

impl CrawlConfig {
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    #[must_use]
    pub fn max_concurrent_cities(&self) -> usize {
        self.max_concurrent_cities
    }

    #[must_use]
    pub fn discovery_attempts(&self) -> u8 {
        self.discovery_attempts
    }

    #[must_use]
    pub fn community_attempts(&self) -> u8 {
        self.community_attempts
    }

    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    #[must_use]
    pub fn city_cooldown(&self) -> Duration {
        Duration::from_millis(self.city_cooldown_ms)
    }

    /// Get the page load timeout
    ///
    /// Bounds each `navigate` call of a browsing session.
    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Viewport as `(width, height)`
    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn proxy_file(&self) -> Option<&Path> {
        self.proxy_file.as_deref()
    }

    #[must_use]
    pub fn degraded_threshold(&self) -> f64 {
        self.degraded_threshold
    }

    #[must_use]
    pub fn embedded_markers(&self) -> (&str, &str) {
        (&self.embedded_start_marker, &self.embedded_end_marker)
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }

    #[must_use]
    pub fn communities_csv_path(&self) -> PathBuf {
        self.output_dir.join(COMMUNITIES_CSV)
    }

    #[must_use]
    pub fn apartments_csv_path(&self) -> PathBuf {
        self.output_dir.join(APARTMENTS_CSV)
    }

    #[must_use]
    pub fn community_docs_dir(&self) -> PathBuf {
        self.output_dir.join(COMMUNITY_DOCS_DIR)
    }

    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join(IMAGES_DIR)
    }
}
