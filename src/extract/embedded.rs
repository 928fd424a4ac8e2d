//! The JSON payload embedded in community pages.
//!
//! Community pages carry a script assignment such as
//! `Fusion.globalContent={...};Fusion.globalContentConfig=...` holding unit
//! and promotion records parallel to the rendered cards.

use serde_json::Value;
use std::collections::VecDeque;

use crate::crawl_engine::{CrawlError, CrawlResult};

/// How deep to look for the `units` / `promotions` arrays
const MAX_SEARCH_DEPTH: usize = 4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedData {
    pub units: Vec<Value>,
    pub promotions: Vec<Value>,
}

impl EmbeddedData {
    /// Locate and decode the payload between `start` and `end` in `markup`.
    ///
    /// Missing markers or a payload that is not JSON fail with
    /// [`CrawlError::EmbeddedDataUnparsable`]. A payload without a `units`
    /// or `promotions` array yields an empty collection for it.
    pub fn from_markup(markup: &str, url: &str, start: &str, end: &str) -> CrawlResult<Self> {
        let unparsable = |reason: String| CrawlError::EmbeddedDataUnparsable {
            url: url.to_string(),
            reason,
        };

        let begin = markup
            .find(start)
            .ok_or_else(|| unparsable(format!("start marker {start:?} not found")))?
            + start.len();
        let len = markup[begin..]
            .find(end)
            .ok_or_else(|| unparsable(format!("end marker {end:?} not found")))?;

        let payload = markup[begin..begin + len].trim().trim_end_matches(';');
        let root: Value =
            serde_json::from_str(payload).map_err(|e| unparsable(format!("invalid JSON: {e}")))?;

        Ok(Self::from_value(&root))
    }

    #[must_use]
    pub fn from_value(root: &Value) -> Self {
        Self {
            units: find_array(root, "units").unwrap_or_default(),
            promotions: find_array(root, "promotions").unwrap_or_default(),
        }
    }
}

/// Breadth-first search for the shallowest array stored under `key`
fn find_array(root: &Value, key: &str) -> Option<Vec<Value>> {
    let mut queue = VecDeque::from([(root, 0usize)]);

    while let Some((value, depth)) = queue.pop_front() {
        if let Value::Object(map) = value {
            if let Some(Value::Array(items)) = map.get(key) {
                return Some(items.clone());
            }
            if depth < MAX_SEARCH_DEPTH {
                queue.extend(
                    map.values()
                        .filter(|v| v.is_object())
                        .map(|v| (v, depth + 1)),
                );
            }
        }
    }
    None
}
