//! RDAP Forge - RDAP client with IANA bootstrap resolution
//!
//! Finds the authoritative RDAP server for a domain, AS number or IP
//! network through the IANA bootstrap registries, queries the candidates
//! in priority order and decodes the answer.

pub mod bootstrap;
pub mod client;
pub mod error;
pub mod net;
pub mod protocol;
pub mod query;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorKind, RdapError, Result};
pub use net::IpNetwork;
pub use query::{QueryTarget, RegistryKind};
pub use types::{ClientConfig, MetricsSnapshot, QueryMetrics};

// Re-export main functionality
pub use bootstrap::{BootstrapConfig, BootstrapFetcher, ServiceRegistry};
pub use client::RdapClient;
pub use transport::{Fetcher, HttpClient, RdapResponse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    Ok(())
}
