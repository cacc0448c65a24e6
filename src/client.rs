//! RDAP client: the public query entry point

use crate::bootstrap::{BootstrapConfig, BootstrapFetcher};
use crate::error::Result;
use crate::net::IpNetwork;
use crate::protocol::{self, AutNum, Domain, Entity, RdapObject};
use crate::query::QueryTarget;
use crate::transport::{
    header_cache_detector, CachingClient, Fetcher, HttpClient, MemoryCache, RdapResponse,
    ReqwestClient,
};
use crate::types::{ClientConfig, MetricsSnapshot, QueryMetrics};
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

/// RDAP client resolving servers through IANA bootstrap
pub struct RdapClient {
    config: ClientConfig,
    bootstrap: BootstrapFetcher,
    metrics: Arc<QueryMetrics>,
}

impl RdapClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client over reqwest, with the in-memory cache if enabled
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let network: Arc<dyn HttpClient> =
            Arc::new(ReqwestClient::new(config.timeout, &config.user_agent)?);

        let client: Arc<dyn HttpClient> = if config.cache {
            Arc::new(CachingClient::new(
                network,
                Arc::new(MemoryCache::new()),
                config.cache_ttl,
            ))
        } else {
            network
        };

        Ok(Self::with_http_client(config, client))
    }

    /// Create a client over any [`HttpClient`]; `config.cache` is not applied
    pub fn with_http_client(config: ClientConfig, client: Arc<dyn HttpClient>) -> Self {
        let metrics = Arc::new(QueryMetrics::new());
        let fetcher = Fetcher::new(client)
            .with_forwarded_for(config.forwarded_for.clone())
            .with_cache_detector(header_cache_detector())
            .with_metrics(Arc::clone(&metrics));
        let bootstrap = BootstrapFetcher::new(
            fetcher,
            BootstrapConfig::with_template(config.bootstrap_url.clone()),
        );

        Self {
            config,
            bootstrap,
            metrics,
        }
    }

    /// Candidate servers for `target`, as bootstrap resolves them
    pub async fn resolve(&self, target: &QueryTarget) -> Result<Vec<String>> {
        self.bootstrap.resolve(target).await
    }

    /// Query `target` and return the undecoded response
    pub async fn fetch(&self, target: &QueryTarget) -> Result<RdapResponse> {
        let start_time = Instant::now();
        self.metrics.increment_queries();

        let result = self.bootstrap.fetch(target, &self.config.servers).await;
        let duration = start_time.elapsed();

        match &result {
            Ok(response) => tracing::info!(
                target = %target,
                url = %response.url,
                from_cache = response.from_cache,
                duration_ms = %duration.as_millis(),
                "RDAP query completed"
            ),
            Err(e) => {
                self.metrics.increment_failures();
                tracing::warn!(
                    target = %target,
                    error = %e,
                    duration_ms = %duration.as_millis(),
                    "RDAP query failed"
                );
            }
        }

        result
    }

    /// Query `target` and decode the result into `T`
    pub async fn query<T: DeserializeOwned>(&self, target: &QueryTarget) -> Result<T> {
        self.fetch(target).await?.decode()
    }

    pub async fn query_domain(&self, fqdn: &str) -> Result<Domain> {
        let name = fqdn.trim().trim_end_matches('.').to_lowercase();
        self.query(&QueryTarget::Domain(name)).await
    }

    pub async fn query_autnum(&self, asn: u32) -> Result<AutNum> {
        self.query(&QueryTarget::AutNum(asn)).await
    }

    pub async fn query_ip(&self, addr: IpAddr) -> Result<protocol::IpNetwork> {
        self.query(&QueryTarget::Ip(addr)).await
    }

    pub async fn query_ip_network(&self, network: IpNetwork) -> Result<protocol::IpNetwork> {
        self.query(&QueryTarget::IpNetwork(network)).await
    }

    /// Entity lookup; needs explicit servers since there is no entity bootstrap
    pub async fn query_entity(&self, handle: &str) -> Result<Entity> {
        self.query(&QueryTarget::Entity(handle.to_string())).await
    }

    /// Query any target, decoding into the matching object class
    pub async fn lookup(&self, target: &QueryTarget) -> Result<RdapObject> {
        let response = self.fetch(target).await?;
        Ok(match target {
            QueryTarget::Domain(_) => RdapObject::Domain(response.decode()?),
            QueryTarget::AutNum(_) => RdapObject::AutNum(response.decode()?),
            QueryTarget::Ip(_) | QueryTarget::IpNetwork(_) => {
                RdapObject::IpNetwork(response.decode()?)
            }
            QueryTarget::Entity(_) => RdapObject::Entity(response.decode()?),
        })
    }

    /// Get client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get performance metrics
    pub fn get_metrics(&self) -> Arc<QueryMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Get current metrics snapshot
    pub fn get_metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.get_stats()
    }
}
