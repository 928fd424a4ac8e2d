use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::time::timeout;

use crate::crawl_engine::{CrawlError, CrawlResult};
use crate::extract::CommunityDocument;
use crate::utils::community_id;

/// Timeout for blocking JSON serialization and write
/// Prevents hangs on a stalled filesystem
pub(super) const BLOCKING_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Path of the document for `community_url` under `docs_dir`
#[must_use]
pub fn community_document_path(docs_dir: &Path, community_url: &str) -> PathBuf {
    docs_dir.join(format!("{}.json", community_id(community_url)))
}

/// Write one community and its units as a single-element JSON array.
///
/// The file is replaced wholesale through a temp file in the same directory.
pub async fn save_community_document(
    document: CommunityDocument,
    docs_dir: PathBuf,
) -> CrawlResult<PathBuf> {
    let path = community_document_path(&docs_dir, &document.community.url);
    let target = path.clone();

    let blocking_task = tokio::task::spawn_blocking(move || -> CrawlResult<()> {
        std::fs::create_dir_all(&docs_dir)?;
        let json = serde_json::to_vec_pretty(&[document])
            .map_err(|e| CrawlError::persistence(format!("serialization failed: {e}")))?;

        let mut temp_file = NamedTempFile::new_in(&docs_dir)?;
        temp_file.write_all(&json)?;
        temp_file
            .persist(&target)
            .map_err(|e| CrawlError::persistence(format!("{}: {e}", target.display())))?;
        Ok(())
    });

    match timeout(BLOCKING_WRITE_TIMEOUT, blocking_task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => {
            return Err(CrawlError::persistence(format!(
                "document write task panicked: {e}"
            )));
        }
        Err(_) => {
            log::warn!(
                "Document write timeout for {} (timeout: {BLOCKING_WRITE_TIMEOUT:?})",
                path.display()
            );
            return Err(CrawlError::persistence(format!(
                "document write timed out after {BLOCKING_WRITE_TIMEOUT:?}"
            )));
        }
    }

    log::debug!("Saved community document {}", path.display());
    Ok(path)
}
