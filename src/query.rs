//! Query targets and the registry each one is resolved through

use crate::error::{RdapError, Result};
use crate::net::IpNetwork;
use regex::Regex;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::OnceLock;

/// Which IANA bootstrap registry a query is resolved through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    Dns,
    Asn,
    Ipv4,
    Ipv6,
}

impl RegistryKind {
    /// Bootstrap file name, substituted into the bootstrap URL template.
    pub fn bootstrap_name(&self) -> &'static str {
        match self {
            RegistryKind::Dns => "dns",
            RegistryKind::Asn => "asn",
            RegistryKind::Ipv4 => "ipv4",
            RegistryKind::Ipv6 => "ipv6",
        }
    }

    /// RDAP path segment for objects resolved through this registry.
    pub fn segment(&self) -> &'static str {
        match self {
            RegistryKind::Dns => "domain",
            RegistryKind::Asn => "autnum",
            RegistryKind::Ipv4 | RegistryKind::Ipv6 => "ip",
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bootstrap_name())
    }
}

/// A classified identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    Domain(String),
    AutNum(u32),
    Ip(IpAddr),
    IpNetwork(IpNetwork),
    /// Entity handle; there is no bootstrap registry for entities.
    Entity(String),
}

impl QueryTarget {
    /// Bootstrap registry for this target, `None` for entities.
    pub fn registry_kind(&self) -> Option<RegistryKind> {
        match self {
            QueryTarget::Domain(_) => Some(RegistryKind::Dns),
            QueryTarget::AutNum(_) => Some(RegistryKind::Asn),
            QueryTarget::Ip(addr) => Some(ip_kind(addr.is_ipv4())),
            QueryTarget::IpNetwork(net) => Some(ip_kind(net.is_ipv4())),
            QueryTarget::Entity(_) => None,
        }
    }

    /// RDAP path segment used in the query URL.
    pub fn segment(&self) -> &'static str {
        match self.registry_kind() {
            Some(kind) => kind.segment(),
            None => "entity",
        }
    }

    /// Short name of the target type, used in log events and errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            QueryTarget::Domain(_) => "domain",
            QueryTarget::AutNum(_) => "autnum",
            QueryTarget::Ip(_) => "ip",
            QueryTarget::IpNetwork(_) => "ip network",
            QueryTarget::Entity(_) => "entity",
        }
    }
}

fn ip_kind(is_ipv4: bool) -> RegistryKind {
    if is_ipv4 {
        RegistryKind::Ipv4
    } else {
        RegistryKind::Ipv6
    }
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTarget::Domain(name) => write!(f, "{}", name),
            QueryTarget::AutNum(asn) => write!(f, "{}", asn),
            QueryTarget::Ip(addr) => write!(f, "{}", addr),
            QueryTarget::IpNetwork(net) => write!(f, "{}", net),
            QueryTarget::Entity(handle) => write!(f, "{}", handle),
        }
    }
}

fn fqdn_pattern() -> &'static Regex {
    static FQDN: OnceLock<Regex> = OnceLock::new();
    FQDN.get_or_init(|| {
        Regex::new(r"^([[:alnum:]](([[:alnum:]]|-){0,61}[[:alnum:]])?\.)+[[:alnum:]](([[:alnum:]]|-){0,61}[[:alnum:]])?\.?$")
            .expect("FQDN pattern is valid")
    })
}

impl FromStr for QueryTarget {
    type Err = RdapError;

    /// Classify a raw identifier.
    ///
    /// Order matters: AS numbers, then addresses, then CIDR blocks, then
    /// domain names; anything left over is taken as an entity handle.
    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RdapError::invalid_identifier(input, "empty identifier"));
        }

        let digits = input
            .strip_prefix("AS")
            .or_else(|| input.strip_prefix("as"))
            .unwrap_or(input);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return digits
                .parse::<u32>()
                .map(QueryTarget::AutNum)
                .map_err(|e| RdapError::invalid_identifier(input, e.to_string()));
        }

        if let Ok(addr) = input.parse::<IpAddr>() {
            return Ok(QueryTarget::Ip(addr));
        }

        if input.contains('/') {
            return input.parse::<IpNetwork>().map(QueryTarget::IpNetwork);
        }

        if fqdn_pattern().is_match(input) {
            let name = input.trim_end_matches('.').to_lowercase();
            return Ok(QueryTarget::Domain(name));
        }

        Ok(QueryTarget::Entity(input.to_string()))
    }
}
