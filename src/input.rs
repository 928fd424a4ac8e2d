//! Identifier lists for the list entry modes.

use std::path::Path;

use crate::crawl_engine::{CrawlError, CrawlResult};

/// One identifier per line; blank lines dropped, whitespace trimmed.
///
/// An unreadable file is a run-level error.
pub fn read_identifier_list(path: &Path) -> CrawlResult<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|e| CrawlError::InputUnreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(parse_identifier_list(&text))
}

#[must_use]
pub fn parse_identifier_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
