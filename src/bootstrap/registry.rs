//! IANA bootstrap service registry (RFC 7484 section 10.2).

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded bootstrap registry.
///
/// Service URL lists are HTTPS-prioritized while decoding, so a registry
/// value never exposes them in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRegistry {
    pub version: String,
    pub publication: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl ServiceRegistry {
    /// Decode a registry document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// One `[entries, urls]` pair of a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(Vec<String>, Vec<String>)",
    into = "(Vec<String>, Vec<String>)"
)]
pub struct Service {
    entries: Vec<String>,
    urls: Vec<String>,
}

impl Service {
    pub fn new(entries: Vec<String>, urls: Vec<String>) -> Self {
        Self {
            urls: prioritize_https(&urls),
            entries,
        }
    }

    /// Match keys: TLDs, AS ranges or CIDR blocks depending on the registry.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Base URLs, HTTPS first.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

impl From<(Vec<String>, Vec<String>)> for Service {
    fn from((entries, urls): (Vec<String>, Vec<String>)) -> Self {
        Self::new(entries, urls)
    }
}

impl From<Service> for (Vec<String>, Vec<String>) {
    fn from(service: Service) -> Self {
        (service.entries, service.urls)
    }
}

fn is_https(url: &str) -> bool {
    url.split_once(':')
        .map(|(scheme, _)| scheme.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// Stable reorder placing `https` URLs before every other scheme.
pub fn prioritize_https(urls: &[String]) -> Vec<String> {
    let (secure, plain): (Vec<&String>, Vec<&String>) = urls.iter().partition(|u| is_https(u));
    secure.into_iter().chain(plain).cloned().collect()
}
