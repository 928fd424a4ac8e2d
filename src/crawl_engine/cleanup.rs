//! Browser and resource cleanup functionality
//!
//! Runs once after the crawl, when no session is open any more.

use chromiumoxide::Browser;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// Close the browser, remove its data directory, then stop its CDP handler.
///
/// The handler is aborted last; the browser needs the CDP connection to
/// close cleanly.
pub async fn shutdown_browser(
    browser: Arc<Browser>,
    handler_task: JoinHandle<()>,
    chrome_data_dir: PathBuf,
) -> CleanupResult {
    let mut errors = Vec::new();

    match Arc::try_unwrap(browser) {
        Ok(mut browser) => {
            debug!(target: "avalon_crawler::cleanup", "Closing browser");
            if let Err(e) = browser.close().await {
                warn!(target: "avalon_crawler::cleanup", "Failed to close browser: {e}");
                errors.push(format!("Browser close failed: {e}"));
            }

            // Wait for the process to exit before its profile directory goes away
            if let Err(e) = browser.wait().await {
                warn!(target: "avalon_crawler::cleanup", "Failed to wait for browser exit: {e}");
                errors.push(format!("Browser wait failed: {e}"));
            }
        }
        Err(arc) => {
            warn!(
                target: "avalon_crawler::cleanup",
                "Browser still has {} strong references, it will close on drop",
                Arc::strong_count(&arc)
            );
            errors.push("Browser still shared at shutdown".to_string());
        }
    }

    debug!(target: "avalon_crawler::cleanup", "Removing Chrome data directory {}", chrome_data_dir.display());
    if let Err(e) = std::fs::remove_dir_all(&chrome_data_dir) {
        warn!(target: "avalon_crawler::cleanup", "Failed to clean up Chrome data directory: {e}");
        errors.push(format!("Directory cleanup failed: {e}"));
    }

    info!(target: "avalon_crawler::cleanup", "Aborting browser handler task");
    handler_task.abort();
    if let Err(e) = handler_task.await
        && !e.is_cancelled()
    {
        warn!(target: "avalon_crawler::cleanup", "Handler task failed during abort: {e}");
        errors.push(format!("Handler task failed: {e}"));
    }

    if errors.is_empty() {
        CleanupResult::Success
    } else {
        CleanupResult::PartialFailure(errors)
    }
}
