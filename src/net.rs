//! CIDR network blocks for IP registry matching

use crate::error::{RdapError, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// An IPv4 or IPv6 network in CIDR notation, stored with host bits cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    addr: IpAddr,
    prefix_len: u8,
}

impl IpNetwork {
    /// Build a network, masking off host bits of `addr`.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let max = max_prefix_len(&addr);
        if prefix_len > max {
            return Err(RdapError::invalid_identifier(
                format!("{}/{}", addr, prefix_len),
                format!("prefix length exceeds {}", max),
            ));
        }
        Ok(Self {
            addr: mask(addr, prefix_len),
            prefix_len,
        })
    }

    /// The single-address network containing only `addr`.
    pub fn host(addr: IpAddr) -> Self {
        Self {
            addr,
            prefix_len: max_prefix_len(&addr),
        }
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn is_ipv4(&self) -> bool {
        self.addr.is_ipv4()
    }

    /// Whether `other` lies entirely within this network.
    ///
    /// Networks of different address families never contain each other.
    pub fn contains(&self, other: &IpNetwork) -> bool {
        if self.addr.is_ipv4() != other.addr.is_ipv4() || other.prefix_len < self.prefix_len {
            return false;
        }
        mask(other.addr, self.prefix_len) == self.addr
    }
}

fn max_prefix_len(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(addr: IpAddr, prefix_len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let masked = match prefix_len {
                0 => 0,
                n => bits & (u32::MAX << (32 - u32::from(n))),
            };
            IpAddr::V4(Ipv4Addr::from(masked))
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let masked = match prefix_len {
                0 => 0,
                n => bits & (u128::MAX << (128 - u32::from(n))),
            };
            IpAddr::V6(Ipv6Addr::from(masked))
        }
    }
}

impl FromStr for IpNetwork {
    type Err = RdapError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| RdapError::invalid_identifier(s, "missing prefix length"))?;
        let addr: IpAddr = addr
            .parse()
            .map_err(|e: std::net::AddrParseError| RdapError::invalid_identifier(s, e.to_string()))?;
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| RdapError::invalid_identifier(s, "invalid prefix length"))?;
        Self::new(addr, prefix_len)
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix_len)
    }
}
