//! IANA bootstrap registries (RFC 7484).
//!
//! Registries are fetched per query and never cached here; repeated
//! downloads are absorbed by the HTTP cache behind the transport.

pub mod fetcher;
pub mod matcher;
pub mod registry;

pub use fetcher::{BootstrapConfig, BootstrapFetcher, SUPPORTED_VERSION};
pub use registry::{prioritize_https, Service, ServiceRegistry};
