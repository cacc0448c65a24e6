//! Resolve identifiers through IANA bootstrap and query the matched servers.

use super::registry::{prioritize_https, ServiceRegistry};
use crate::config_error;
use crate::error::{RdapError, Result};
use crate::query::{QueryTarget, RegistryKind};
use crate::transport::{Fetcher, RdapResponse};
use crate::types::DEFAULT_BOOTSTRAP_URL;

/// Bootstrap registry version this client understands.
pub const SUPPORTED_VERSION: &str = "1.0";

/// Where bootstrap registries live and which version they must declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// URL template; `{}` is replaced by `dns`, `asn`, `ipv4` or `ipv6`.
    pub url_template: String,
    pub supported_version: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_BOOTSTRAP_URL.to_string(),
            supported_version: SUPPORTED_VERSION.to_string(),
        }
    }
}

impl BootstrapConfig {
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            url_template: template.into(),
            ..Self::default()
        }
    }

    /// Bootstrap document URL for `kind`.
    pub fn registry_url(&self, kind: RegistryKind) -> Result<String> {
        if !self.url_template.contains("{}") {
            return Err(config_error!(
                "bootstrap URL template '{}' has no '{{}}' placeholder",
                self.url_template
            ));
        }
        Ok(self.url_template.replacen("{}", kind.bootstrap_name(), 1))
    }
}

/// Bootstrap resolution layered over a [`Fetcher`].
#[derive(Clone)]
pub struct BootstrapFetcher {
    fetcher: Fetcher,
    config: BootstrapConfig,
}

impl BootstrapFetcher {
    pub fn new(fetcher: Fetcher, config: BootstrapConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Download, decode and version-check the registry for `kind`.
    pub async fn registry(&self, kind: RegistryKind) -> Result<ServiceRegistry> {
        let url = self.config.registry_url(kind)?;
        self.fetcher.metrics().increment_bootstrap_fetches();

        let response = self.fetcher.get(&url).await?;
        if !response.status.is_success() {
            return Err(RdapError::UnexpectedStatus {
                status: response.status.to_string(),
            });
        }

        let registry = ServiceRegistry::from_slice(&response.body)?;
        if registry.version != self.config.supported_version {
            return Err(RdapError::IncompatibleVersion {
                found: registry.version,
                expected: self.config.supported_version.clone(),
            });
        }

        tracing::debug!(
            registry = %kind,
            services = registry.services.len(),
            publication = %registry.publication,
            "Bootstrap registry loaded"
        );
        Ok(registry)
    }

    /// Candidate base URLs for `target`, HTTPS first.
    pub async fn resolve(&self, target: &QueryTarget) -> Result<Vec<String>> {
        let kind = target.registry_kind().ok_or_else(|| RdapError::NoBootstrap {
            query: target.type_name().to_string(),
        })?;

        let registry = self.registry(kind).await?;
        registry.match_target(target)
    }

    /// Query `target`, either on `servers` when given or on the servers
    /// bootstrap resolves.
    pub async fn fetch(&self, target: &QueryTarget, servers: &[String]) -> Result<RdapResponse> {
        let candidates = if servers.is_empty() {
            self.resolve(target).await?
        } else {
            prioritize_https(servers)
        };

        tracing::debug!(
            target = %target,
            candidates = ?candidates,
            "Querying RDAP candidates"
        );
        self.fetcher.fetch_candidates(&candidates, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::{HttpRequest, HttpResponse, RDAP_MEDIA_TYPE};
    use parking_lot::Mutex;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    const DNS_URL: &str = "https://data.iana.org/rdap/dns.json";

    fn registry_body(version: &str, services: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "version": version,
            "publication": "2024-01-16T19:00:02Z",
            "description": "This is a test registry",
            "services": services,
        }))
        .unwrap()
    }

    fn rdap_ok(body: &str) -> HttpResponse {
        HttpResponse::new(StatusCode::OK)
            .with_header("content-type", RDAP_MEDIA_TYPE)
            .with_body(body)
    }

    /// Fetcher answering from a URL → response table, logging every URL.
    fn routed(routes: Vec<(&str, Result<HttpResponse>)>) -> (BootstrapFetcher, Arc<Mutex<Vec<String>>>) {
        let table: HashMap<String, Result<HttpResponse>> =
            routes.into_iter().map(|(url, r)| (url.to_string(), r)).collect();
        let log = Arc::new(Mutex::new(Vec::new()));
        let seen = log.clone();

        let client = move |request: HttpRequest| -> Result<HttpResponse> {
            let url = request.url.to_string();
            seen.lock().push(url.clone());
            table
                .get(&url)
                .cloned()
                .unwrap_or_else(|| Err(RdapError::transport(format!("no handler for URL {}", url), None)))
        };

        let fetcher = Fetcher::new(Arc::new(client));
        (BootstrapFetcher::new(fetcher, BootstrapConfig::default()), log)
    }

    #[test]
    fn test_registry_url() {
        let config = BootstrapConfig::default();
        assert_eq!(config.registry_url(RegistryKind::Asn).unwrap(), "https://data.iana.org/rdap/asn.json");

        let config = BootstrapConfig::with_template("https://mirror.test/bootstrap/{}");
        assert_eq!(config.registry_url(RegistryKind::Ipv6).unwrap(), "https://mirror.test/bootstrap/ipv6");

        let err = BootstrapConfig::with_template("https://mirror.test/dns.json")
            .registry_url(RegistryKind::Dns)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Local);
    }

    #[tokio::test]
    async fn test_resolve_and_query() {
        let (bootstrap, log) = routed(vec![
            (
                DNS_URL,
                Ok(HttpResponse::new(StatusCode::OK)
                    .with_header("content-type", "application/json")
                    .with_body(registry_body("1.0", json!([[["com"], ["https://rdap.example-registry.test/"]]])))),
            ),
            (
                "https://rdap.example-registry.test/domain/example.com",
                Ok(rdap_ok(r#"{"objectClassName":"domain","ldhName":"example.com"}"#)),
            ),
        ]);

        let target = QueryTarget::Domain("example.com".to_string());
        let response = bootstrap.fetch(&target, &[]).await.unwrap();
        assert_eq!(response.url, "https://rdap.example-registry.test/domain/example.com");
        assert_eq!(log.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_explicit_servers_skip_bootstrap() {
        let (bootstrap, log) = routed(vec![(
            "https://rdap.registro.br/entity/h_05506560000136-NICBR",
            Ok(rdap_ok(r#"{"objectClassName":"entity","handle":"05.506.560/0001-36"}"#)),
        )]);

        let target = QueryTarget::Entity("h_05506560000136-NICBR".to_string());
        let servers = vec!["https://rdap.registro.br".to_string()];
        bootstrap.fetch(&target, &servers).await.unwrap();
        assert_eq!(
            *log.lock(),
            vec!["https://rdap.registro.br/entity/h_05506560000136-NICBR".to_string()]
        );
    }

    #[tokio::test]
    async fn test_entity_without_servers_fails_before_network() {
        let (bootstrap, log) = routed(Vec::new());
        let err = bootstrap
            .fetch(&QueryTarget::Entity("ABC-1".to_string()), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_transport_failure() {
        let (bootstrap, _) = routed(vec![(DNS_URL, Err(RdapError::transport("I'm a crazy error!", None)))]);
        let err = bootstrap
            .resolve(&QueryTarget::Domain("example.com".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "I'm a crazy error!");
    }

    #[tokio::test]
    async fn test_bootstrap_unexpected_status() {
        let (bootstrap, _) = routed(vec![(DNS_URL, Ok(HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR)))]);
        let err = bootstrap
            .resolve(&QueryTarget::Domain("example.com".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unexpected status code 500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_bootstrap_invalid_document() {
        let (bootstrap, _) = routed(vec![(
            DNS_URL,
            Ok(HttpResponse::new(StatusCode::OK).with_body("{{{{")),
        )]);
        let err = bootstrap
            .resolve(&QueryTarget::Domain("example.com".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Local);
    }

    #[tokio::test]
    async fn test_version_mismatch_is_checked_before_matching() {
        // No service would match, so a NoMatches error would mean the
        // matcher ran first.
        let (bootstrap, log) = routed(vec![(
            DNS_URL,
            Ok(HttpResponse::new(StatusCode::OK).with_body(registry_body("1.0x", json!([])))),
        )]);

        let err = bootstrap
            .fetch(&QueryTarget::Domain("example.com".to_string()), &[])
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "incompatible bootstrap specification version: 1.0x (expecting 1.0)"
        );
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_no_match_is_resolution_error() {
        let (bootstrap, _) = routed(vec![(
            "https://data.iana.org/rdap/asn.json",
            Ok(HttpResponse::new(StatusCode::OK)
                .with_body(registry_body("1.0", json!([[["1-100"], ["https://rir.test/"]]])))),
        )]);

        let err = bootstrap.resolve(&QueryTarget::AutNum(4200000000)).await.unwrap_err();
        assert_eq!(err.to_string(), "no matches for 4200000000");
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }
}
