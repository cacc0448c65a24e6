//! HTTP transport for bootstrap and RDAP requests
//!
//! Every exchange goes through [`HttpClient`], so the network layer can be
//! swapped for a caching wrapper or a closure in tests.

pub mod cache;
pub mod fetcher;

pub use cache::{header_cache_detector, CacheStore, CachingClient, MemoryCache};
pub use fetcher::{CacheDetector, FetchOutcome, Fetcher, RdapResponse};

use crate::error::{RdapError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

/// Media type every RDAP server response must carry.
pub const RDAP_MEDIA_TYPE: &str = "application/rdap+json";

/// A prepared GET request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: HeaderMap,
}

impl HttpRequest {
    /// Parse `url`, failing before anything is sent.
    pub fn get(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| RdapError::invalid_url(url, e.to_string()))?;
        Ok(Self {
            url: parsed,
            headers: HeaderMap::new(),
        })
    }

    /// Attach a header; invalid names or values are a local error.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RdapError::invalid_header(name, e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| RdapError::invalid_header(name, e.to_string()))?;
        self.headers.insert(header, value);
        Ok(self)
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Set a header. Names are case-insensitive; a name or value that is
    /// not valid HTTP is skipped and the response is returned unchanged.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<String> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let media = value.split(';').next()?.trim().to_ascii_lowercase();
        Some(media)
    }

    pub fn is_rdap(&self) -> bool {
        self.media_type().as_deref() == Some(RDAP_MEDIA_TYPE)
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// One HTTP exchange.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<F> HttpClient for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse> + Send + Sync,
{
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self(request)
    }
}

/// [`HttpClient`] backed by reqwest.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| RdapError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.to_string();
        let response = self
            .client
            .get(request.url)
            .headers(request.headers)
            .send()
            .await
            .map_err(|e| RdapError::transport(e.to_string(), Some(url.clone())))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| RdapError::transport(e.to_string(), Some(url)))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
