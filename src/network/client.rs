//! HTTP client for search index calls and page fetches

use super::dns::CachingResolver;
use super::types::{is_textual, HttpRequest, HttpResponse};
use super::user_agent::{accept_html, accept_language, generate_user_agent};
use super::PageClient;
use crate::config::OutgoingSettings;
use crate::error::TransportError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper presenting a browser-like header profile
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_page_bytes: usize,
    user_agent: String,
    accept_language: String,
    resolver: Arc<CachingResolver>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let resolver = Arc::new(CachingResolver::new(
            Duration::from_secs(settings.dns_cache_ttl),
            settings.dns_cache_capacity,
        ));
        Self::with_resolver(settings, resolver)
    }

    /// Create a client that shares an existing DNS cache
    pub fn with_resolver(settings: &OutgoingSettings, resolver: Arc<CachingResolver>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(settings.request_timeout())
            .pool_max_idle_per_host(settings.pool_maxsize)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .dns_resolver(resolver.clone());

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            max_page_bytes: settings.max_page_bytes,
            user_agent: generate_user_agent(),
            accept_language: accept_language(&settings.language),
            resolver,
        })
    }

    /// Execute a request with a custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let accept = request
            .headers
            .get("Accept")
            .map(String::as_str)
            .unwrap_or(accept_html());
        let mut req_builder = self.browser_get(&request.url, accept).timeout(timeout);

        for (key, value) in &request.headers {
            if !key.eq_ignore_ascii_case("accept") {
                req_builder = req_builder.header(key, value);
            }
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        let response = req_builder.send().await?;
        let (status, url, headers) = Self::response_head(&response);
        let text = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            text,
            url,
        })
    }

    /// GET with the browser header profile applied
    fn browser_get(&self, url: &str, accept: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", accept)
            .header("Accept-Language", &self.accept_language)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("DNT", "1")
            .header("Upgrade-Insecure-Requests", "1")
    }

    /// Status, final URL and lowercased headers of a response
    fn response_head(response: &Response) -> (u16, String, HashMap<String, String>) {
        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.as_str().to_ascii_lowercase(), v.to_string());
            }
        }

        (response.status().as_u16(), response.url().to_string(), headers)
    }

    /// Read at most `limit` bytes of the body, decoding it lossily as UTF-8
    async fn read_capped(mut response: Response, limit: usize) -> Result<String, TransportError> {
        let mut body: Vec<u8> = Vec::new();

        while let Some(chunk) = response.chunk().await? {
            let room = limit - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!(url = %response.url(), limit, "page body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Shared DNS cache
    pub fn resolver(&self) -> &Arc<CachingResolver> {
        &self.resolver
    }
}

#[async_trait]
impl PageClient for HttpClient {
    async fn get_page(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError> {
        let response = self
            .browser_get(url, accept_html())
            .timeout(timeout)
            .send()
            .await?;
        let (status, url, headers) = Self::response_head(&response);

        // Bodies that can never pass the content gates are not downloaded
        let textual = headers
            .get("content-type")
            .map(|ct| is_textual(ct))
            .unwrap_or(false);
        let text = if textual {
            Self::read_capped(response, self.max_page_bytes).await?
        } else {
            String::new()
        };

        Ok(HttpResponse {
            status,
            headers,
            text,
            url,
        })
    }
}
