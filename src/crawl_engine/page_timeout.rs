//! Timeout utilities for page operations
//!
//! Provides async timeout wrappers to prevent indefinite hangs during
//! page navigation, clicks and content capture.

use std::future::Future;
use std::time::Duration;

use super::crawl_types::{CrawlError, CrawlResult};

/// Wrap an async page operation with an explicit timeout
///
/// A timeout is reported as a navigation failure naming the operation, so it
/// flows through the same retry path as any other page error.
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout` - Upper bound for the operation
/// * `operation_name` - Human-readable name for error messages
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &str,
) -> CrawlResult<T>
where
    F: Future<Output = CrawlResult<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(CrawlError::Navigation(format!(
            "{operation_name} timeout after {} seconds",
            timeout.as_secs()
        ))),
    }
}
