//! Unit image downloads.

use log::debug;
use std::path::Path;
use std::time::Duration;

use crate::crawl_engine::{CrawlError, CrawlResult};
use crate::net::{HttpFetch, ProxyCredentials};

/// Fetch `url` into `path` unless the file already exists.
///
/// Returns whether bytes were written. Non-2xx responses are navigation
/// errors.
pub async fn save_image(
    fetcher: &dyn HttpFetch,
    url: &str,
    path: &Path,
    fetch_timeout: Duration,
    proxy: Option<&ProxyCredentials>,
) -> CrawlResult<bool> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!("Image already saved: {}", path.display());
        return Ok(false);
    }

    let response = fetcher.get(url, fetch_timeout, proxy).await?;
    if !response.is_success() {
        return Err(CrawlError::navigation(format!(
            "image {url} returned status {}",
            response.status
        )));
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &response.body).await?;
    Ok(true)
}
