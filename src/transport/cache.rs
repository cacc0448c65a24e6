//! In-memory HTTP response cache
//!
//! The cache sits behind [`HttpClient`], so the fetchers never know whether
//! a response came from the network. Cached responses carry an
//! `X-From-Cache: 1` header that [`header_cache_detector`] recognises.

use super::{CacheDetector, HttpClient, HttpRequest, HttpResponse};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderValue, CACHE_CONTROL};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Header added to every response served from a [`CachingClient`].
pub const FROM_CACHE_HEADER: &str = "x-from-cache";

/// A stored response and its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub response: HttpResponse,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Storage used by [`CachingClient`].
///
/// Shared by concurrent queries, so implementations do their own locking.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn set(&self, key: &str, entry: CacheEntry);
    fn remove(&self, key: &str);
}

/// Process-local [`CacheStore`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        self.entries.write().retain(|_, entry| entry.is_fresh());
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Expired entries are dropped on every insert, so the map only holds
    /// responses that could still be served.
    fn set(&self, key: &str, entry: CacheEntry) {
        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.is_fresh());
        entries.insert(key.to_string(), entry);
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

/// How long a response may be cached, `None` if it must not be stored.
fn cache_lifetime(response: &HttpResponse, default_ttl: Duration) -> Option<Duration> {
    if !response.status.is_success() {
        return None;
    }

    let Some(directives) = response.header_str(CACHE_CONTROL.as_str()) else {
        return Some(default_ttl);
    };

    let mut max_age = None;
    for directive in directives.split(',').map(|d| d.trim().to_ascii_lowercase()) {
        if directive == "no-store" || directive == "no-cache" {
            return None;
        }
        if let Some(secs) = directive.strip_prefix("max-age=") {
            max_age = secs.trim_matches('"').parse::<u64>().ok();
        }
    }

    match max_age {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => Some(default_ttl),
    }
}

/// [`HttpClient`] wrapper serving fresh responses from a [`CacheStore`].
pub struct CachingClient {
    inner: Arc<dyn HttpClient>,
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl CachingClient {
    pub fn new(inner: Arc<dyn HttpClient>, store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self {
            inner,
            store,
            default_ttl,
        }
    }
}

#[async_trait]
impl HttpClient for CachingClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let key = request.url.to_string();

        if let Some(entry) = self.store.get(&key) {
            if entry.is_fresh() {
                let mut response = entry.response;
                response
                    .headers
                    .insert(FROM_CACHE_HEADER, HeaderValue::from_static("1"));
                return Ok(response);
            }
            self.store.remove(&key);
        }

        let response = self.inner.execute(request).await?;
        if let Some(ttl) = cache_lifetime(&response, self.default_ttl) {
            self.store.set(
                &key,
                CacheEntry {
                    response: response.clone(),
                    expires_at: Instant::now() + ttl,
                },
            );
        }

        Ok(response)
    }
}

/// Detector recognising responses marked by [`CachingClient`].
pub fn header_cache_detector() -> CacheDetector {
    Arc::new(|response: &HttpResponse| response.header_str(FROM_CACHE_HEADER) == Some("1"))
}
