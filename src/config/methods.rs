//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;

use super::builder::CrawlConfigBuilder;

impl<State> CrawlConfigBuilder<State> {
    #[must_use]
    pub fn catalog_url(mut self, url: impl Into<String>) -> Self {
        self.config.catalog_url = url.into();
        self
    }

    /// Set how many city tasks may hold a browsing session concurrently
    #[must_use]
    pub fn max_concurrent_cities(mut self, limit: usize) -> Self {
        self.config.max_concurrent_cities = limit;
        self
    }

    #[must_use]
    pub fn discovery_attempts(mut self, attempts: u8) -> Self {
        self.config.discovery_attempts = attempts;
        self
    }

    #[must_use]
    pub fn community_attempts(mut self, attempts: u8) -> Self {
        self.config.community_attempts = attempts;
        self
    }

    #[must_use]
    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    /// Pause held at the end of each city task before its permit is released
    #[must_use]
    pub fn city_cooldown_ms(mut self, ms: u64) -> Self {
        self.config.city_cooldown_ms = ms;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    /// Set browser headless mode
    ///
    /// Headed mode is useful when debugging selectors against the live site.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn proxy_file(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.config.proxy_file = path.map(Into::into);
        self
    }

    #[must_use]
    pub fn degraded_threshold(mut self, ratio: f64) -> Self {
        self.config.degraded_threshold = ratio;
        self
    }

    /// Override the markers around the embedded JSON payload
    #[must_use]
    pub fn embedded_markers(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.config.embedded_start_marker = start.into();
        self.config.embedded_end_marker = end.into();
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.chrome_data_dir = dir;
        self
    }
}
