//! Run orchestration
//!
//! Resolves the entry scope to a set of cities (or communities), runs one
//! task per city under the concurrency gate, and reports run health at the
//! end:
//! - Catalog discovery for state and city scopes
//! - Concurrent city tasks, each owning its permit and session
//! - Run-level errors close the gate so no further city starts
//! - Completion, degraded and error notifications

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::city::crawl_city;
use super::community::crawl_community;
use super::context::CrawlContext;
use super::crawl_types::{CrawlError, CrawlResult, Stage};
use super::discovery::{discover_named_city, discover_state_cities};
use super::run_stats::StatsSnapshot;
use crate::extract::{City, CommunityLink};
use crate::notify::Notifier;
use crate::utils::{canonicalize_url, url_slug};

/// What a run crawls. Exactly one scope per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlScope {
    WholeSite,
    State(String),
    StateList(Vec<String>),
    NamedCity(String),
    Community(String),
    CommunityList(Vec<String>),
}

impl fmt::Display for CrawlScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WholeSite => f.write_str("whole site"),
            Self::State(name) => write!(f, "state {name}"),
            Self::StateList(names) => write!(f, "{} states", names.len()),
            Self::NamedCity(name) => write!(f, "city {name}"),
            Self::Community(url) => write!(f, "community {url}"),
            Self::CommunityList(urls) => write!(f, "{} communities", urls.len()),
        }
    }
}

/// End-of-run summary
#[derive(Debug, Clone)]
pub struct RunReport {
    pub scope: CrawlScope,
    pub stats: StatsSnapshot,
    /// Stage failure ratio above the configured threshold
    pub degraded: bool,
    /// The run-level error that aborted the run, if any
    pub fatal: Option<CrawlError>,
    pub elapsed: Duration,
    pub communities_visited: usize,
}

impl RunReport {
    /// Ran to completion without a run-level error
    #[must_use]
    pub fn completed(&self) -> bool {
        self.fatal.is_none()
    }

    #[must_use]
    pub fn summary(&self) -> String {
        let status = match (&self.fatal, self.degraded) {
            (Some(e), _) => format!("aborted: {e}"),
            (None, true) => "completed (degraded)".to_string(),
            (None, false) => "completed".to_string(),
        };
        format!(
            "Crawl of {} {status} in {:.1}s, {} communities visited\n{}",
            self.scope,
            self.elapsed.as_secs_f64(),
            self.communities_visited,
            self.stats.summary()
        )
    }
}

pub struct Orchestrator {
    ctx: CrawlContext,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(ctx: CrawlContext, notifier: Arc<dyn Notifier>) -> Self {
        Self { ctx, notifier }
    }

    #[must_use]
    pub fn context(&self) -> &CrawlContext {
        &self.ctx
    }

    /// Crawl `scope` to completion and notify about the outcome.
    ///
    /// Entity-level failures are counted in the report; only a run-level
    /// error sets [`RunReport::fatal`].
    pub async fn run(&self, scope: CrawlScope) -> RunReport {
        let start = Instant::now();
        info!("Starting crawl of {scope}");

        let fatal = self.execute(&scope).await.err();
        if let Some(e) = &fatal {
            error!("Crawl of {scope} aborted: {e}");
        }

        let stats = self.ctx.stats.snapshot();
        let threshold = self.ctx.config.degraded_threshold();
        let report = RunReport {
            degraded: stats.is_degraded(threshold),
            stats,
            fatal,
            elapsed: start.elapsed(),
            communities_visited: self.ctx.visited.len(),
            scope,
        };

        self.send_notifications(&report, threshold).await;
        report
    }

    async fn send_notifications(&self, report: &RunReport, threshold: f64) {
        let body = report.summary();
        info!("{body}");

        if let Some(e) = &report.fatal {
            self.notifier
                .notify(&format!("Crawler error: {e}"), &body)
                .await;
            return;
        }

        if report.degraded {
            let stages: Vec<String> = report
                .stats
                .degraded_stages(threshold)
                .iter()
                .map(ToString::to_string)
                .collect();
            warn!("Run degraded in stages: {}", stages.join(", "));
            self.notifier
                .notify(
                    &format!("Crawler error: degraded stages {}", stages.join(", ")),
                    &body,
                )
                .await;
        }

        self.notifier
            .notify(&format!("Crawler finished: {}", report.scope), &body)
            .await;
    }

    async fn execute(&self, scope: &CrawlScope) -> CrawlResult<()> {
        match scope {
            CrawlScope::WholeSite => self.crawl_states(None).await,
            CrawlScope::State(name) => self.crawl_states(Some(std::slice::from_ref(name))).await,
            CrawlScope::StateList(names) => self.crawl_states(Some(names)).await,
            CrawlScope::NamedCity(name) => match discover_named_city(&self.ctx, name).await? {
                Some(city) => self.crawl_cities(vec![city]).await,
                None => Ok(()),
            },
            CrawlScope::Community(url) => self.crawl_communities(std::slice::from_ref(url)).await,
            CrawlScope::CommunityList(urls) => self.crawl_communities(urls).await,
        }
    }

    async fn crawl_states(&self, states: Option<&[String]>) -> CrawlResult<()> {
        match discover_state_cities(&self.ctx, states).await? {
            Some(cities) => self.crawl_cities(cities).await,
            None => Ok(()),
        }
    }

    /// One task per city, at most `max_concurrent_cities` at a time.
    ///
    /// A failing or panicking task never cancels its siblings. A run-level
    /// error closes the gate: running cities finish, no new city starts.
    async fn crawl_cities(&self, cities: Vec<City>) -> CrawlResult<()> {
        let cooldown = self.ctx.config.city_cooldown();
        let total = cities.len();
        let mut active_tasks = FuturesUnordered::new();
        let mut gate_error = None;

        for (index, city) in cities.into_iter().enumerate() {
            // Acquire before spawning so at most `capacity` sessions exist
            let permit = match self.ctx.gate.acquire().await {
                Ok(p) => p,
                Err(e) => {
                    warn!("Stopped scheduling cities after {index} of {total}: {e}");
                    gate_error = Some(e);
                    break;
                }
            };

            let ctx = self.ctx.clone();
            active_tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let result = crawl_city(&ctx, &city).await;
                match &result {
                    Err(e) if e.is_fatal() => ctx.gate.close(),
                    _ if !cooldown.is_zero() => tokio::time::sleep(cooldown).await,
                    _ => {}
                }
                (city, result)
            }));
        }

        let mut fatal = None;
        while let Some(joined) = active_tasks.next().await {
            match joined {
                Ok((city, Ok(Some(outcome)))) => {
                    debug!(
                        "City {} finished: {}/{} communities crawled, {} completed",
                        city.name, outcome.crawled, outcome.discovered, outcome.completed
                    );
                }
                Ok((city, Ok(None))) => {
                    debug!("City {} produced nothing", city.name);
                }
                Ok((city, Err(e))) => {
                    error!("City {} hit a run-level error: {e}", city.name);
                    fatal.get_or_insert(e);
                }
                Err(e) => {
                    error!("City task panicked: {e}");
                    self.ctx
                        .stats
                        .record_failure(Stage::City, &CrawlError::TaskPanicked(e.to_string()));
                }
            }
        }

        match fatal.or(gate_error) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Community-only scopes: one permit, one session, communities in order
    async fn crawl_communities(&self, urls: &[String]) -> CrawlResult<()> {
        let _permit = self.ctx.gate.acquire().await?;

        let proxy = self.ctx.proxies.next_proxy();
        let session = self
            .ctx
            .engine
            .new_session(proxy.as_ref(), self.ctx.viewport())
            .await
            .map_err(|e| CrawlError::BrowserLaunch(format!("no browser session: {e}")))?;

        let mut result = Ok(());
        for raw in urls {
            let url = canonicalize_url(raw);
            if !self.ctx.visited.mark(&url) {
                debug!("Already visited {url}");
                continue;
            }
            let link = CommunityLink {
                name: url_slug(&url),
                url,
                address_text: None,
            };
            if let Err(e) = crawl_community(&self.ctx, session.as_ref(), &link, proxy.as_ref()).await
            {
                result = Err(e);
                break;
            }
        }

        session.close().await;
        result
    }
}
