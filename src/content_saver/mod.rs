//! Persistence of crawl results
//!
//! Two deduplicated CSV tables, one JSON document per community and the
//! unit images, all under the configured output directory.

mod image_saver;
mod json_saver;
mod rows;
pub mod tabular;

pub use image_saver::save_image;
pub use json_saver::{community_document_path, save_community_document};
pub use rows::{community_row, unit_row};
pub use tabular::TabularStore;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::CrawlConfig;
use crate::crawl_engine::{CrawlError, CrawlResult};
use crate::extract::{Community, CommunityDocument, Unit};
use crate::net::{HttpFetch, ProxyCredentials};
use crate::utils::{APARTMENT_CSV_HEADERS, COMMUNITY_CSV_HEADERS};
use json_saver::BLOCKING_WRITE_TIMEOUT;

/// Column deduplicating `communities.csv`
pub const COMMUNITY_KEY_COLUMN: &str = "community_url";
/// Column deduplicating `apartments.csv`
pub const UNIT_KEY_COLUMN: &str = "unit_url";

/// Every write target of a run, shared by all tasks
#[derive(Debug)]
pub struct PersistenceSink {
    communities: Arc<TabularStore>,
    apartments: Arc<TabularStore>,
    docs_dir: PathBuf,
    images_dir: PathBuf,
}

impl PersistenceSink {
    /// Open both tables (loading their existing keys) under the output directory
    pub fn open(config: &CrawlConfig) -> CrawlResult<Self> {
        std::fs::create_dir_all(config.output_dir())?;
        Ok(Self {
            communities: Arc::new(TabularStore::open(
                config.communities_csv_path(),
                &COMMUNITY_CSV_HEADERS,
                COMMUNITY_KEY_COLUMN,
            )?),
            apartments: Arc::new(TabularStore::open(
                config.apartments_csv_path(),
                &APARTMENT_CSV_HEADERS,
                UNIT_KEY_COLUMN,
            )?),
            docs_dir: config.community_docs_dir(),
            images_dir: config.images_dir(),
        })
    }

    /// Append the community row; `false` when it was already present
    pub async fn record_community(
        &self,
        community: &Community,
        scraped_at: DateTime<Utc>,
    ) -> CrawlResult<bool> {
        let row = community_row(community, scraped_at);
        Ok(append_rows(&self.communities, vec![row]).await? == 1)
    }

    /// Append unit rows, returning how many were new
    pub async fn record_units(&self, community_url: &str, units: &[Unit]) -> CrawlResult<usize> {
        let rows = units.iter().map(|u| unit_row(u, community_url)).collect();
        let written = append_rows(&self.apartments, rows).await?;
        debug!(
            "{community_url}: {written} new of {} unit rows",
            units.len()
        );
        Ok(written)
    }

    /// Overwrite the community's JSON document
    pub async fn save_document(&self, document: CommunityDocument) -> CrawlResult<PathBuf> {
        save_community_document(document, self.docs_dir.clone()).await
    }

    /// Download the unit's image if it has one. Failures are logged only.
    pub async fn save_unit_image(
        &self,
        fetcher: &dyn HttpFetch,
        unit: &Unit,
        fetch_timeout: Duration,
        proxy: Option<&ProxyCredentials>,
    ) -> bool {
        let (Some(url), Some(filename)) = (&unit.image_url, &unit.image_filename) else {
            return false;
        };
        let path = self.images_dir.join(filename);
        match save_image(fetcher, url, &path, fetch_timeout, proxy).await {
            Ok(written) => written,
            Err(e) => {
                warn!("Image for unit {} not saved from {url}: {e}", unit.unit_id);
                false
            }
        }
    }

    #[must_use]
    pub fn communities(&self) -> &TabularStore {
        self.communities.as_ref()
    }

    #[must_use]
    pub fn apartments(&self) -> &TabularStore {
        self.apartments.as_ref()
    }
}

/// Append rows on the blocking pool, returning how many were new
async fn append_rows(table: &Arc<TabularStore>, rows: Vec<Vec<String>>) -> CrawlResult<usize> {
    let writer = Arc::clone(table);
    let blocking_task = tokio::task::spawn_blocking(move || -> CrawlResult<usize> {
        let mut written = 0;
        for row in &rows {
            if writer.append(row)? {
                written += 1;
            }
        }
        Ok(written)
    });

    match timeout(BLOCKING_WRITE_TIMEOUT, blocking_task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(CrawlError::persistence(format!(
            "table write task panicked: {e}"
        ))),
        Err(_) => {
            warn!(
                "Table write timeout for {} (timeout: {BLOCKING_WRITE_TIMEOUT:?})",
                table.path().display()
            );
            Err(CrawlError::persistence(format!(
                "table write timed out after {BLOCKING_WRITE_TIMEOUT:?}"
            )))
        }
    }
}
