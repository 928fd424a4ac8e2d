//! Plain HTTP fetches for the catalog page and unit images.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use super::proxy::ProxyCredentials;
use crate::crawl_engine::{CrawlError, CrawlResult};
use crate::utils::constants::CHROME_USER_AGENT;

/// Upper bound on a fetched body
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP GET capability
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Fetch `url`; transport failures and timeouts are navigation errors.
    ///
    /// Non-2xx responses are returned as-is; callers decide what they mean.
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        proxy: Option<&ProxyCredentials>,
    ) -> CrawlResult<FetchResponse>;
}

/// `reqwest` implementation with one pooled client per proxy endpoint
#[derive(Debug, Default)]
pub struct ReqwestFetcher {
    clients: DashMap<String, Client>,
}

impl ReqwestFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&self, proxy: Option<&ProxyCredentials>) -> CrawlResult<Client> {
        let key = proxy.map(|p| p.full_url.clone()).unwrap_or_default();
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = Client::builder().user_agent(CHROME_USER_AGENT);
        if let Some(p) = proxy {
            let mut reqwest_proxy = reqwest::Proxy::all(&p.server)
                .map_err(|e| CrawlError::navigation(format!("invalid proxy {}: {e}", p.server)))?;
            if let (Some(user), Some(pass)) = (&p.username, &p.password) {
                reqwest_proxy = reqwest_proxy.basic_auth(user, pass);
            }
            builder = builder.proxy(reqwest_proxy);
        }

        let client = builder
            .build()
            .map_err(|e| CrawlError::navigation(format!("failed to build HTTP client: {e}")))?;
        self.clients.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        proxy: Option<&ProxyCredentials>,
    ) -> CrawlResult<FetchResponse> {
        let client = self.client_for(proxy)?;

        let response = client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| CrawlError::navigation(format!("GET {url} failed: {e}")))?;

        let status = response.status().as_u16();

        let expected_size = response.content_length().unwrap_or(0);
        if expected_size > MAX_BODY_BYTES as u64 {
            return Err(CrawlError::navigation(format!(
                "GET {url}: body of {expected_size} bytes exceeds limit"
            )));
        }

        let mut body = Vec::with_capacity(usize::try_from(expected_size).unwrap_or(0));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| CrawlError::navigation(format!("GET {url}: read failed: {e}")))?;
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(CrawlError::navigation(format!(
                    "GET {url}: body exceeded {MAX_BODY_BYTES} bytes"
                )));
            }
            body.extend_from_slice(&chunk);
        }

        debug!("GET {url} -> {status} ({} bytes)", body.len());
        Ok(FetchResponse { status, body })
    }
}
