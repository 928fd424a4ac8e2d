//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! The output directory is the only required field; `build()` is not
//! available until it has been set.

use anyhow::{Result, anyhow, bail};
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::CrawlConfig;
use crate::utils::is_valid_url;

// Type states for the builder
pub struct WithOutputDir;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) config: CrawlConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            output_dir: None,
            config: CrawlConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

impl CrawlConfigBuilder<()> {
    pub fn output_dir(self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithOutputDir> {
        CrawlConfigBuilder {
            output_dir: Some(dir.into()),
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl CrawlConfigBuilder<WithOutputDir> {
    pub fn build(self) -> Result<CrawlConfig> {
        let output_dir = self
            .output_dir
            .ok_or_else(|| anyhow!("output_dir is required"))?;

        let config = CrawlConfig {
            output_dir,
            ..self.config
        };

        if !is_valid_url(&config.catalog_url) {
            bail!("catalog_url must be an absolute http(s) URL: {}", config.catalog_url);
        }
        if config.max_concurrent_cities == 0 {
            bail!("max_concurrent_cities must be at least 1");
        }
        if config.discovery_attempts == 0 || config.community_attempts == 0 {
            bail!("retry budgets must allow at least one attempt");
        }
        if !(0.0..=1.0).contains(&config.degraded_threshold) {
            bail!(
                "degraded_threshold must lie in [0, 1], got {}",
                config.degraded_threshold
            );
        }
        if config.embedded_start_marker.is_empty() || config.embedded_end_marker.is_empty() {
            bail!("embedded data markers must not be empty");
        }

        Ok(config)
    }
}
