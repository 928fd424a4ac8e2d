//! Environment overlay for the builder
//!
//! Values present in the environment replace the builder's current values.
//! Unset variables leave them untouched; set but unparsable ones are errors.

use anyhow::{Context, Result};
use std::str::FromStr;

use super::builder::CrawlConfigBuilder;

pub const ENV_CATALOG_URL: &str = "CRAWLER_CATALOG_URL";
pub const ENV_HEADLESS: &str = "CRAWLER_HEADLESS";
pub const ENV_PAGE_LOAD_TIMEOUT_SECS: &str = "CRAWLER_PAGE_LOAD_TIMEOUT_SECS";
pub const ENV_CITY_COOLDOWN_MS: &str = "CRAWLER_CITY_COOLDOWN_MS";
/// Kept lowercase for compatibility with existing `.env` files
pub const ENV_PROXY_FILE: &str = "proxy_file_path";

impl<State> CrawlConfigBuilder<State> {
    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_CATALOG_URL) {
            self = self.catalog_url(url);
        }
        if let Some(headless) = parse_var::<bool, _>(&lookup, ENV_HEADLESS)? {
            self = self.headless(headless);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_PAGE_LOAD_TIMEOUT_SECS)? {
            self = self.page_load_timeout_secs(secs);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_CITY_COOLDOWN_MS)? {
            self = self.city_cooldown_ms(ms);
        }
        if let Some(path) = lookup(ENV_PROXY_FILE).filter(|p| !p.trim().is_empty()) {
            self = self.proxy_file(Some(path.trim()));
        }
        Ok(self)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value: {raw:?}"))
        })
        .transpose()
}
