//! Core configuration and diagnostics types for rdap-forge

use crate::error::{RdapError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default IANA bootstrap location; `{}` is replaced by the registry name.
pub const DEFAULT_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/{}.json";

/// Configuration for the RDAP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Bootstrap URL template containing a `{}` placeholder
    pub bootstrap_url: String,
    /// Explicit RDAP servers; when non-empty bootstrap is skipped
    pub servers: Vec<String>,
    /// Originating address sent as `X-Forwarded-For`
    pub forwarded_for: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
    /// Serve repeated requests from the in-memory HTTP cache
    pub cache: bool,
    /// Lifetime of cached responses without a `max-age` directive
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            servers: Vec::new(),
            forwarded_for: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("rdap-forge/{}", crate::VERSION),
            cache: true,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

impl ClientConfig {
    /// Build a configuration from `RDAP_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var("RDAP_BOOTSTRAP_URL") {
            config.bootstrap_url = url;
        }

        if let Ok(servers) = env::var("RDAP_SERVERS") {
            config.servers = servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(addr) = env::var("RDAP_FORWARDED_FOR") {
            if !addr.trim().is_empty() {
                config.forwarded_for = Some(addr.trim().to_string());
            }
        }

        if let Ok(secs) = env::var("RDAP_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                RdapError::config(format!("RDAP_TIMEOUT_SECS must be a number, got '{}'", secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Ok(flag) = env::var("RDAP_NO_CACHE") {
            config.cache = !matches!(flag.trim(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}

/// Query counters, shared by every component of one client
#[derive(Debug, Default)]
pub struct QueryMetrics {
    queries: AtomicU64,
    bootstrap_fetches: AtomicU64,
    candidate_attempts: AtomicU64,
    cache_hits: AtomicU64,
    failures: AtomicU64,
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_bootstrap_fetches(&self) {
        self.bootstrap_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_candidate_attempts(&self) {
        self.candidate_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            bootstrap_fetches: self.bootstrap_fetches.load(Ordering::Relaxed),
            candidate_attempts: self.candidate_attempts.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`QueryMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub queries: u64,
    pub bootstrap_fetches: u64,
    pub candidate_attempts: u64,
    pub cache_hits: u64,
    pub failures: u64,
}

impl MetricsSnapshot {
    /// Fraction of responses that were served from cache
    pub fn cache_hit_rate(&self) -> f64 {
        let responses = self.bootstrap_fetches + self.candidate_attempts;
        if responses == 0 {
            0.0
        } else {
            self.cache_hits as f64 / responses as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.bootstrap_url.contains("{}"));
        assert!(config.servers.is_empty());
        assert!(config.forwarded_for.is_none());
        assert!(config.cache);
        assert!(config.user_agent.starts_with("rdap-forge/"));
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = QueryMetrics::new();
        assert_eq!(metrics.get_stats(), MetricsSnapshot::default());

        metrics.increment_queries();
        metrics.increment_bootstrap_fetches();
        metrics.increment_candidate_attempts();
        metrics.increment_cache_hits();

        let stats = metrics.get_stats();
        assert_eq!(stats.queries, 1);
        assert_eq!(stats.failures, 0);
        assert!((stats.cache_hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
