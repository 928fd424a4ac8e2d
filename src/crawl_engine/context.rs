//! Shared state handed to every crawl task.

use std::sync::Arc;

use super::gate::ConcurrencyGate;
use super::retry::RetryPolicy;
use super::run_stats::RunStats;
use super::visited::VisitedTracker;
use crate::browser::{BrowsingEngine, Viewport};
use crate::config::CrawlConfig;
use crate::content_saver::PersistenceSink;
use crate::net::{HttpFetch, ProxySupplier};

/// Process-scoped context for one run.
///
/// Cloning is cheap; every field is shared.
#[derive(Clone)]
pub struct CrawlContext {
    pub config: Arc<CrawlConfig>,
    pub visited: VisitedTracker,
    pub stats: Arc<RunStats>,
    pub gate: ConcurrencyGate,
    pub sink: Arc<PersistenceSink>,
    pub engine: Arc<dyn BrowsingEngine>,
    pub fetcher: Arc<dyn HttpFetch>,
    pub proxies: Arc<dyn ProxySupplier>,
}

impl CrawlContext {
    /// Fresh visited set, counters and gate around the given collaborators
    #[must_use]
    pub fn new(
        config: CrawlConfig,
        sink: PersistenceSink,
        engine: Arc<dyn BrowsingEngine>,
        fetcher: Arc<dyn HttpFetch>,
        proxies: Arc<dyn ProxySupplier>,
    ) -> Self {
        let gate = ConcurrencyGate::new(config.max_concurrent_cities());
        Self {
            config: Arc::new(config),
            visited: VisitedTracker::new(),
            stats: Arc::new(RunStats::new()),
            gate,
            sink: Arc::new(sink),
            engine,
            fetcher,
            proxies,
        }
    }

    /// Budget for catalog discovery and city scrapes
    #[must_use]
    pub fn discovery_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.discovery_attempts(), self.config.retry_backoff())
    }

    #[must_use]
    pub fn community_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.community_attempts(), self.config.retry_backoff())
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.config.viewport().into()
    }
}
