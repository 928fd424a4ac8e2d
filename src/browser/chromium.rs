//! Chromium sessions over the DevTools protocol.
//!
//! Each session is a fresh browser context (separate cookies and cache) so a
//! per-session proxy can be set on it. Proxy credentials are answered through
//! the Fetch domain.

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams,
    ContinueWithAuthParams, EnableParams, EventAuthRequired, EventRequestPaused,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{BrowsingEngine, Session, Viewport};
use crate::crawl_engine::page_timeout::with_page_timeout;
use crate::crawl_engine::{CrawlError, CrawlResult};
use crate::net::ProxyCredentials;

/// Pause after a click so the toggled content can render
const CLICK_SETTLE: Duration = Duration::from_millis(750);

/// Opens one browser context per session on a shared browser
#[derive(Clone)]
pub struct ChromiumEngine {
    browser: Arc<Browser>,
    action_timeout: Duration,
}

impl ChromiumEngine {
    #[must_use]
    pub fn new(browser: Arc<Browser>, action_timeout: Duration) -> Self {
        Self {
            browser,
            action_timeout,
        }
    }

    async fn open_page(
        &self,
        context_id: &BrowserContextId,
        proxy: Option<&ProxyCredentials>,
        viewport: Viewport,
    ) -> CrawlResult<(Page, Vec<JoinHandle<()>>)> {
        let page = self
            .browser
            .new_page(blank_target(context_id)?)
            .await
            .map_err(|e| CrawlError::navigation(format!("failed to create page: {e}")))?;

        page.execute(
            SetDeviceMetricsOverrideParams::builder()
                .width(i64::from(viewport.width))
                .height(i64::from(viewport.height))
                .device_scale_factor(1.0)
                .mobile(false)
                .build()
                .map_err(CrawlError::navigation)?,
        )
        .await
        .map_err(|e| CrawlError::navigation(format!("failed to set viewport: {e}")))?;

        let mut listeners = Vec::new();
        if let Some(proxy) = proxy
            && let (Some(username), Some(password)) = (&proxy.username, &proxy.password)
        {
            listeners = answer_proxy_auth(&page, username.clone(), password.clone()).await?;
        }

        Ok((page, listeners))
    }
}

#[async_trait]
impl BrowsingEngine for ChromiumEngine {
    async fn new_session(
        &self,
        proxy: Option<&ProxyCredentials>,
        viewport: Viewport,
    ) -> CrawlResult<Box<dyn Session>> {
        let context_id = self
            .browser
            .execute(context_params(proxy))
            .await
            .map_err(|e| CrawlError::navigation(format!("failed to create browser context: {e}")))?
            .result
            .browser_context_id;

        match self.open_page(&context_id, proxy, viewport).await {
            Ok((page, listeners)) => Ok(Box::new(ChromiumSession {
                browser: Arc::clone(&self.browser),
                context_id,
                page,
                listeners,
                action_timeout: self.action_timeout,
            })),
            Err(e) => {
                dispose_context(&self.browser, context_id).await;
                Err(e)
            }
        }
    }
}

/// Isolated context routed through `proxy`; credentials are answered later
fn context_params(proxy: Option<&ProxyCredentials>) -> CreateBrowserContextParams {
    let mut params = CreateBrowserContextParams::default();
    params.proxy_server = proxy.map(|p| p.server.clone());
    params
}

fn blank_target(context_id: &BrowserContextId) -> CrawlResult<CreateTargetParams> {
    CreateTargetParams::builder()
        .url("about:blank")
        .browser_context_id(context_id.clone())
        .build()
        .map_err(CrawlError::navigation)
}

/// Enable request interception and answer proxy auth challenges
async fn answer_proxy_auth(
    page: &Page,
    username: String,
    password: String,
) -> CrawlResult<Vec<JoinHandle<()>>> {
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(CrawlError::navigation)?;
    let mut auth = page
        .event_listener::<EventAuthRequired>()
        .await
        .map_err(CrawlError::navigation)?;

    page.execute(EnableParams {
        patterns: None,
        handle_auth_requests: Some(true),
    })
    .await
    .map_err(|e| CrawlError::navigation(format!("failed to enable fetch interception: {e}")))?;

    let paused_page = page.clone();
    let paused_task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            if let Err(e) = paused_page
                .execute(ContinueRequestParams::new(event.request_id.clone()))
                .await
            {
                debug!("Failed to continue paused request: {e}");
            }
        }
    });

    let auth_page = page.clone();
    let auth_task = tokio::spawn(async move {
        while let Some(event) = auth.next().await {
            let response = AuthChallengeResponse {
                response: AuthChallengeResponseResponse::ProvideCredentials,
                username: Some(username.clone()),
                password: Some(password.clone()),
            };
            if let Err(e) = auth_page
                .execute(ContinueWithAuthParams::new(event.request_id.clone(), response))
                .await
            {
                warn!("Failed to answer proxy auth challenge: {e}");
            }
        }
    });

    Ok(vec![paused_task, auth_task])
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        warn!("Failed to dispose browser context: {e}");
    }
}

pub struct ChromiumSession {
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    page: Page,
    listeners: Vec<JoinHandle<()>>,
    action_timeout: Duration,
}

#[async_trait]
impl Session for ChromiumSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> CrawlResult<()> {
        debug!("Navigating to {url}");
        let page = &self.page;
        with_page_timeout(
            async {
                page.goto(url)
                    .await
                    .map_err(|e| CrawlError::navigation(format!("{url}: {e}")))?;
                page.wait_for_navigation()
                    .await
                    .map_err(|e| CrawlError::navigation(format!("{url}: {e}")))?;
                Ok::<(), CrawlError>(())
            },
            timeout,
            "Page navigation",
        )
        .await
    }

    async fn click(&self, selector: &str) -> CrawlResult<()> {
        let page = &self.page;
        with_page_timeout(
            async {
                page.find_element(selector)
                    .await
                    .map_err(|e| CrawlError::navigation(format!("{selector} not found: {e}")))?
                    .click()
                    .await
                    .map_err(|e| CrawlError::navigation(format!("click on {selector}: {e}")))?;
                Ok::<(), CrawlError>(())
            },
            self.action_timeout,
            "Click",
        )
        .await?;

        tokio::time::sleep(CLICK_SETTLE).await;
        Ok(())
    }

    async fn content(&self) -> CrawlResult<String> {
        let page = &self.page;
        with_page_timeout(
            async {
                page.content()
                    .await
                    .map_err(|e| CrawlError::navigation(format!("failed to read content: {e}")))
            },
            self.action_timeout,
            "Content capture",
        )
        .await
    }

    async fn close(self: Box<Self>) {
        let this = *self;
        for listener in &this.listeners {
            listener.abort();
        }
        if let Err(e) = this.page.close().await {
            debug!("Failed to close page: {e}");
        }
        dispose_context(&this.browser, this.context_id).await;
    }
}
