//! In-memory site, browser and HTTP fakes shared by the integration tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use avalon_crawler::browser::{BrowsingEngine, Session, Viewport};
use avalon_crawler::config::CrawlConfig;
use avalon_crawler::content_saver::PersistenceSink;
use avalon_crawler::crawl_engine::{CrawlContext, CrawlError, CrawlResult};
use avalon_crawler::net::{FetchResponse, HttpFetch, NoProxy, ProxyCredentials};

pub const ORIGIN: &str = "https://www.example.test";
pub const CATALOG_URL: &str = "https://www.example.test/apartment-locations";

/// Rendered pages by canonical URL, plus a log of every navigation
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    panicking: HashSet<String>,
    latency: Duration,
    navigations: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl FakeSite {
    #[allow(dead_code)]
    pub fn with_page(mut self, url: &str, markup: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), markup.into());
        self
    }

    /// Navigating to `url` panics the calling task
    #[allow(dead_code)]
    pub fn with_panic(mut self, url: &str) -> Self {
        self.panicking.insert(url.to_string());
        self
    }

    /// Every navigation takes `latency` so concurrent tasks overlap
    #[allow(dead_code)]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[allow(dead_code)]
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().expect("navigation log").clone()
    }

    #[allow(dead_code)]
    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigations
            .lock()
            .expect("navigation log")
            .iter()
            .filter(|u| *u == url)
            .count()
    }
}

pub struct FakeEngine {
    site: Arc<FakeSite>,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    /// Most sessions open at the same time
    pub peak_sessions: AtomicUsize,
}

impl FakeEngine {
    pub fn new(site: Arc<FakeSite>) -> Self {
        Self {
            site,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            live: Arc::new(AtomicUsize::new(0)),
            peak_sessions: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BrowsingEngine for FakeEngine {
    async fn new_session(
        &self,
        _proxy: Option<&ProxyCredentials>,
        _viewport: Viewport,
    ) -> CrawlResult<Box<dyn Session>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_sessions.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            site: Arc::clone(&self.site),
            current: Mutex::new(None),
            closed: Arc::clone(&self.closed),
            live: Arc::clone(&self.live),
        }))
    }
}

struct FakeSession {
    site: Arc<FakeSite>,
    current: Mutex<Option<String>>,
    closed: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> CrawlResult<()> {
        self.site
            .navigations
            .lock()
            .expect("navigation log")
            .push(url.to_string());
        if self.site.panicking.contains(url) {
            panic!("renderer crashed on {url}");
        }

        let in_flight = self.site.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.site.peak_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if !self.site.latency.is_zero() {
            tokio::time::sleep(self.site.latency).await;
        }
        self.site.in_flight.fetch_sub(1, Ordering::SeqCst);

        if !self.site.pages.contains_key(url) {
            return Err(CrawlError::navigation(format!("{url}: net::ERR_CONNECTION_RESET")));
        }
        *self.current.lock().expect("current page") = Some(url.to_string());
        Ok(())
    }

    async fn click(&self, _selector: &str) -> CrawlResult<()> {
        Ok(())
    }

    async fn content(&self) -> CrawlResult<String> {
        let current = self.current.lock().expect("current page").clone();
        current
            .and_then(|url| self.site.pages.get(&url).cloned())
            .ok_or_else(|| CrawlError::navigation("no page loaded"))
    }

    async fn close(self: Box<Self>) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves fixed bodies by URL; anything else is a 404
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
    pub requests: AtomicUsize,
}

impl FakeFetcher {
    #[allow(dead_code)]
    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }
}

#[async_trait]
impl HttpFetch for FakeFetcher {
    async fn get(
        &self,
        url: &str,
        _timeout: Duration,
        _proxy: Option<&ProxyCredentials>,
    ) -> CrawlResult<FetchResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(match self.bodies.get(url) {
            Some(body) => FetchResponse {
                status: 200,
                body: body.clone(),
            },
            None => FetchResponse {
                status: 404,
                body: Vec::new(),
            },
        })
    }
}

pub fn test_config(output_dir: &Path) -> CrawlConfig {
    CrawlConfig::builder()
        .output_dir(output_dir)
        .catalog_url(CATALOG_URL)
        .retry_backoff_ms(0)
        .city_cooldown_ms(0)
        .max_concurrent_cities(2)
        .build()
        .expect("test config is valid")
}

pub fn test_context(
    output_dir: &Path,
    engine: Arc<FakeEngine>,
    fetcher: Arc<FakeFetcher>,
) -> CrawlContext {
    let config = test_config(output_dir);
    let sink = PersistenceSink::open(&config).expect("open sink");
    CrawlContext::new(config, sink, engine, fetcher, Arc::new(NoProxy))
}

#[allow(dead_code)]
pub fn catalog_markup(cities: &[(&str, &str)]) -> String {
    let links: String = cities
        .iter()
        .map(|(path, name)| format!(r#"<div class="col-sm"><a href="{path}">{name}</a></div>"#))
        .collect();
    format!("<html><body>{links}</body></html>")
}

/// City page listing `(path, name, address)` community cards
#[allow(dead_code)]
pub fn city_markup(communities: &[(&str, &str, &str)]) -> String {
    let cards: String = communities
        .iter()
        .map(|(path, name, address)| {
            format!(
                r#"<div class="community-card-wrapper">
                     <a class="community-card-link" href="{path}">{name}</a>
                     <div class="community-card-name">{name}</div>
                     <div>{address}</div>
                   </div>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><h1>Apartments</h1><button id="community-toggle">Communities</button>{cards}</body></html>"#
    )
}

#[allow(dead_code)]
pub fn not_found_markup() -> String {
    "<html><body><h1>404 Page Not Found</h1></body></html>".to_string()
}

/// Community page with two unit cards; only `3-204` has an embedded record
#[allow(dead_code)]
pub fn community_markup(community_path: &str, name: &str) -> String {
    format!(
        r#"<html><body>
          <h1>{name}</h1>
          <div class="community-address">1099 Admiral Ct. • San Bruno, CA 94066</div>
          <a href="tel:(650) 555-0100">Call</a>
          <div class="office-hours"><p>Mon-Fri 9-6</p></div>
          <div class="ant-card-body">
            <div class="title">Apt. 3-204</div>
            <div class="price">$2,450/mo</div>
            <img src="/images/204.jpg">
            <a href="{community_path}/apartment/3-204">Details</a>
          </div>
          <div class="ant-card-body">
            <div class="title">Apt. 9-999</div>
            <div class="price">$9,999</div>
          </div>
          <script>Fusion.globalContent={{"units":[{{"name":"204","bedroomNumber":2,"bathroomNumber":1,"squareFeet":850,"availableDateUnfurnished":"5/3/2024 12:00 AM"}}],"promotions":[]}};Fusion.globalContentConfig={{}};</script>
        </body></html>"#
    )
}

#[allow(dead_code)]
pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}
