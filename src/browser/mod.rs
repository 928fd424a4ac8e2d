//! Browsing capability used by the crawl stages.
//!
//! A [`BrowsingEngine`] hands out isolated [`Session`]s; each session owns one
//! page. Stages query the rendered markup with [`Session::content`] and the
//! selectors in [`crate::extract::cards`] rather than asking the browser for
//! individual element properties.

use async_trait::async_trait;
use std::time::Duration;

use crate::crawl_engine::CrawlResult;
use crate::net::ProxyCredentials;

pub mod chromium;

pub use chromium::ChromiumEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Viewport {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// One isolated browsing context with a single page.
///
/// A city lends its session to each of its communities in turn; calls on one
/// session never overlap.
#[async_trait]
pub trait Session: Send + Sync {
    /// Load `url` and wait for it to settle
    async fn navigate(&self, url: &str, timeout: Duration) -> CrawlResult<()>;

    /// Click the first element matching the CSS `selector`
    async fn click(&self, selector: &str) -> CrawlResult<()>;

    /// Current rendered markup
    async fn content(&self) -> CrawlResult<String>;

    /// Release the page and its context; errors are logged, not returned
    async fn close(self: Box<Self>);
}

/// Shared browser able to open sessions
#[async_trait]
pub trait BrowsingEngine: Send + Sync {
    async fn new_session(
        &self,
        proxy: Option<&ProxyCredentials>,
        viewport: Viewport,
    ) -> CrawlResult<Box<dyn Session>>;
}
