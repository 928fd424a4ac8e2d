//! Run-scoped set of communities already claimed for scraping.

use dashmap::DashSet;
use std::sync::Arc;

use crate::utils::canonicalize_url;

/// Lock-free visited set shared by every city task
///
/// Keys are canonical community URLs. The set only grows during a run.
#[derive(Debug, Clone, Default)]
pub struct VisitedTracker {
    seen: Arc<DashSet<String>>,
}

impl VisitedTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `url` for this run.
    ///
    /// Returns `true` only for the first caller; the check and the insert are
    /// one atomic step, so two cities racing on the same community cannot
    /// both win.
    pub fn mark(&self, url: &str) -> bool {
        self.seen.insert(canonicalize_url(url))
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(&canonicalize_url(url))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
