//! Single RDAP exchanges and the ordered candidate loop

use super::{HttpClient, HttpRequest, HttpResponse, RDAP_MEDIA_TYPE};
use crate::error::{RdapError, Result};
use crate::protocol::ErrorResponse;
use crate::query::QueryTarget;
use crate::types::QueryMetrics;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Reports whether a response was served from a cache. Diagnostics only.
pub type CacheDetector = Arc<dyn Fn(&HttpResponse) -> bool + Send + Sync>;

/// A successful RDAP response, body still undecoded.
#[derive(Debug, Clone)]
pub struct RdapResponse {
    pub url: String,
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
    pub from_cache: bool,
}

impl RdapResponse {
    /// Decode the body into a concrete RDAP object.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode the body as untyped JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        self.decode()
    }
}

/// Classified result of one RDAP exchange.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(RdapResponse),
    NotFound { url: String },
    Protocol(ErrorResponse),
    Failure(RdapError),
}

impl FetchOutcome {
    pub fn into_result(self) -> Result<RdapResponse> {
        match self {
            FetchOutcome::Success(response) => Ok(response),
            FetchOutcome::NotFound { url } => Err(RdapError::NotFound { url: Some(url) }),
            FetchOutcome::Protocol(error) => Err(error.into()),
            FetchOutcome::Failure(error) => Err(error),
        }
    }
}

/// Build `<base>/<segment>/<identifier>`.
///
/// The identifier is percent-encoded as path segments; a CIDR block keeps
/// its `/` by being pushed as address and prefix length.
pub fn query_url(base: &str, target: &QueryTarget) -> Result<String> {
    let mut url = Url::parse(base).map_err(|e| RdapError::invalid_url(base, e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| RdapError::invalid_url(base, "cannot be used as a base URL"))?;
        segments.pop_if_empty().push(target.segment());
        match target {
            QueryTarget::IpNetwork(net) => {
                segments
                    .push(&net.addr().to_string())
                    .push(&net.prefix_len().to_string());
            }
            other => {
                segments.push(&other.to_string());
            }
        }
    }
    Ok(url.into())
}

/// Performs and classifies HTTP exchanges against RDAP servers.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    forwarded_for: Option<String>,
    cache_detector: Option<CacheDetector>,
    metrics: Arc<QueryMetrics>,
}

impl Fetcher {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            forwarded_for: None,
            cache_detector: None,
            metrics: Arc::new(QueryMetrics::new()),
        }
    }

    /// Send `X-Forwarded-For: <addr>` with every request; `None` omits it.
    pub fn with_forwarded_for(mut self, addr: Option<String>) -> Self {
        self.forwarded_for = addr.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn with_cache_detector(mut self, detector: CacheDetector) -> Self {
        self.cache_detector = Some(detector);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<QueryMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<QueryMetrics> {
        &self.metrics
    }

    fn request(&self, url: &str, accept: &str) -> Result<HttpRequest> {
        let request = HttpRequest::get(url)?.header("accept", accept)?;
        match &self.forwarded_for {
            Some(addr) => request.header("x-forwarded-for", addr),
            None => Ok(request),
        }
    }

    fn observe_cache(&self, url: &str, response: &HttpResponse) -> bool {
        let from_cache = self
            .cache_detector
            .as_ref()
            .map_or(false, |detect| detect(response));
        if from_cache {
            self.metrics.increment_cache_hits();
            tracing::debug!(url = %url, "Response served from cache");
        }
        from_cache
    }

    /// Raw GET of a JSON document, without RDAP classification.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        let request = self.request(url, "application/json")?;
        let response = self.client.execute(request).await?;
        self.observe_cache(url, &response);
        Ok(response)
    }

    /// One RDAP exchange against `url`, classified.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let request = match self.request(url, RDAP_MEDIA_TYPE) {
            Ok(request) => request,
            Err(e) => return FetchOutcome::Failure(e),
        };

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failure(e),
        };
        let from_cache = self.observe_cache(url, &response);

        if response.status == StatusCode::NOT_FOUND {
            return FetchOutcome::NotFound {
                url: url.to_string(),
            };
        }

        let is_rdap = response.is_rdap();
        if !response.status.is_success() {
            if !is_rdap {
                return FetchOutcome::Failure(RdapError::UnexpectedResponse {
                    status: response.status.to_string(),
                });
            }
            return match serde_json::from_slice::<ErrorResponse>(&response.body) {
                Ok(mut error) => {
                    error.error_code.get_or_insert(u32::from(response.status.as_u16()));
                    FetchOutcome::Protocol(error)
                }
                Err(e) => FetchOutcome::Failure(RdapError::MalformedErrorPayload {
                    message: e.to_string(),
                }),
            };
        }

        if !is_rdap {
            return FetchOutcome::Failure(RdapError::UnexpectedResponse {
                status: response.status.to_string(),
            });
        }

        FetchOutcome::Success(RdapResponse {
            url: url.to_string(),
            status: response.status,
            content_type: RDAP_MEDIA_TYPE.to_string(),
            body: response.body,
            from_cache,
        })
    }

    /// Query `target` on each base URL in order; the first success wins.
    ///
    /// A protocol error ends the loop at once. Any other failure moves on
    /// to the next candidate, and only the last one is reported.
    pub async fn fetch_candidates(
        &self,
        uris: &[String],
        target: &QueryTarget,
    ) -> Result<RdapResponse> {
        let identifier = target.to_string();
        let mut last_error = None;

        for base in uris {
            self.metrics.increment_candidate_attempts();
            let url = match query_url(base, target) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(base = %base, error = %e, "RDAP candidate failed, trying next");
                    last_error = Some(e);
                    continue;
                }
            };

            match self.fetch(&url).await.into_result() {
                Ok(response) => {
                    tracing::debug!(url = %url, from_cache = response.from_cache, "RDAP query succeeded");
                    return Ok(response);
                }
                Err(e) if e.is_terminal() => {
                    tracing::debug!(url = %url, error = %e, "RDAP server returned an error object");
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "RDAP candidate failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RdapError::no_matches(identifier)))
    }
}
