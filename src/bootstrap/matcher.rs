//! Best-match selection of a bootstrap service for an identifier.

use super::registry::ServiceRegistry;
use crate::error::{RdapError, Result};
use crate::net::IpNetwork;
use crate::query::QueryTarget;

impl ServiceRegistry {
    /// Candidate URLs of the service that best matches `target`.
    pub fn match_target(&self, target: &QueryTarget) -> Result<Vec<String>> {
        match target {
            QueryTarget::Domain(name) => self.match_domain(name),
            QueryTarget::AutNum(asn) => self.match_asn(*asn),
            QueryTarget::Ip(addr) => self.match_ip_network(&IpNetwork::host(*addr)),
            QueryTarget::IpNetwork(net) => self.match_ip_network(net),
            QueryTarget::Entity(_) => Err(RdapError::NoBootstrap {
                query: target.type_name().to_string(),
            }),
        }
    }

    /// Longest right-aligned label suffix wins; ties keep document order.
    pub fn match_domain(&self, fqdn: &str) -> Result<Vec<String>> {
        let fqdn = fqdn.trim_end_matches('.').to_lowercase();
        let labels: Vec<&str> = fqdn.split('.').rev().collect();

        let mut best: Option<(usize, &[String])> = None;
        for service in &self.services {
            for entry in service.entries() {
                let entry = entry.trim_matches('.').to_lowercase();
                let entry_labels: Vec<&str> = if entry.is_empty() {
                    Vec::new()
                } else {
                    entry.split('.').rev().collect()
                };

                let is_suffix = entry_labels.len() <= labels.len()
                    && entry_labels.iter().zip(&labels).all(|(e, q)| e == q);
                if !is_suffix {
                    continue;
                }

                if best.map_or(true, |(len, _)| entry_labels.len() > len) {
                    best = Some((entry_labels.len(), service.urls()));
                }
            }
        }

        best.map(|(_, urls)| urls.to_vec())
            .ok_or_else(|| RdapError::no_matches(fqdn))
    }

    /// First inclusive `low-high` range containing `asn`, in document order.
    pub fn match_asn(&self, asn: u32) -> Result<Vec<String>> {
        for service in &self.services {
            for entry in service.entries() {
                let Some((low, high)) = parse_asn_range(entry) else {
                    tracing::warn!(entry = %entry, "Skipping malformed AS range in bootstrap registry");
                    continue;
                };
                if low <= asn && asn <= high {
                    return Ok(service.urls().to_vec());
                }
            }
        }

        Err(RdapError::no_matches(asn))
    }

    /// Most specific block containing `network`; ties keep document order.
    pub fn match_ip_network(&self, network: &IpNetwork) -> Result<Vec<String>> {
        let mut best: Option<(u8, &[String])> = None;
        for service in &self.services {
            for entry in service.entries() {
                let block = match entry.parse::<IpNetwork>() {
                    Ok(block) => block,
                    Err(e) => {
                        tracing::warn!(entry = %entry, error = %e, "Skipping malformed CIDR in bootstrap registry");
                        continue;
                    }
                };
                if !block.contains(network) {
                    continue;
                }
                if best.map_or(true, |(len, _)| block.prefix_len() > len) {
                    best = Some((block.prefix_len(), service.urls()));
                }
            }
        }

        best.map(|(_, urls)| urls.to_vec())
            .ok_or_else(|| RdapError::no_matches(network))
    }
}

fn parse_asn_range(entry: &str) -> Option<(u32, u32)> {
    let entry = entry.trim();
    match entry.split_once('-') {
        Some((low, high)) => Some((low.trim().parse().ok()?, high.trim().parse().ok()?)),
        None => {
            let single = entry.parse().ok()?;
            Some((single, single))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::registry::Service;
    use chrono::Utc;

    fn registry(services: &[(&[&str], &[&str])]) -> ServiceRegistry {
        ServiceRegistry {
            version: "1.0".to_string(),
            publication: Utc::now(),
            description: None,
            services: services
                .iter()
                .map(|(entries, urls)| {
                    Service::new(
                        entries.iter().map(|s| s.to_string()).collect(),
                        urls.iter().map(|s| s.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_domain_longest_suffix_wins() {
        let r = registry(&[
            (&["uk"], &["https://uk.test"]),
            (&["co.uk"], &["https://co-uk.test"]),
            (&["com"], &["https://com.test"]),
        ]);

        assert_eq!(r.match_domain("example.co.uk").unwrap(), vec!["https://co-uk.test"]);
        assert_eq!(r.match_domain("example.org.uk").unwrap(), vec!["https://uk.test"]);
        assert_eq!(r.match_domain("EXAMPLE.COM.").unwrap(), vec!["https://com.test"]);
    }

    #[test]
    fn test_domain_requires_whole_labels() {
        let r = registry(&[(&["com"], &["https://com.test"])]);
        assert!(r.match_domain("example.xcom").is_err());
        assert!(r.match_domain("com.example").is_err());

        let r = registry(&[(&["co.uk"], &["https://co-uk.test"])]);
        assert!(r.match_domain("uk").is_err());
    }

    #[test]
    fn test_domain_tie_keeps_document_order() {
        let r = registry(&[
            (&["com"], &["https://first.test"]),
            (&["com"], &["https://second.test"]),
        ]);
        assert_eq!(r.match_domain("example.com").unwrap(), vec!["https://first.test"]);
    }

    #[test]
    fn test_domain_no_match_message() {
        let r = registry(&[(&["com"], &["https://com.test"])]);
        let err = r.match_domain("example.invalid").unwrap_err();
        assert_eq!(err.to_string(), "no matches for example.invalid");
    }

    #[test]
    fn test_asn_inclusive_ranges() {
        let r = registry(&[
            (&["1-1876", "1902-2042"], &["https://rir-a.test"]),
            (&["1877-1901"], &["https://rir-b.test"]),
            (&["64496"], &["https://doc.test"]),
        ]);

        assert_eq!(r.match_asn(1).unwrap(), vec!["https://rir-a.test"]);
        assert_eq!(r.match_asn(1876).unwrap(), vec!["https://rir-a.test"]);
        assert_eq!(r.match_asn(1877).unwrap(), vec!["https://rir-b.test"]);
        assert_eq!(r.match_asn(2042).unwrap(), vec!["https://rir-a.test"]);
        assert_eq!(r.match_asn(64496).unwrap(), vec!["https://doc.test"]);
        assert!(r.match_asn(0).is_err());
        assert!(r.match_asn(2043).is_err());
    }

    #[test]
    fn test_asn_overlap_first_wins() {
        let r = registry(&[
            (&["100-200"], &["https://first.test"]),
            (&["150-250"], &["https://second.test"]),
        ]);
        assert_eq!(r.match_asn(175).unwrap(), vec!["https://first.test"]);
        assert_eq!(r.match_asn(225).unwrap(), vec!["https://second.test"]);
    }

    #[test]
    fn test_asn_skips_malformed_entries() {
        let r = registry(&[
            (&["garbage"], &["https://bad.test"]),
            (&["10-20"], &["https://good.test"]),
        ]);
        assert_eq!(r.match_asn(15).unwrap(), vec!["https://good.test"]);
    }

    #[test]
    fn test_ip_most_specific_wins() {
        let r = registry(&[
            (&["10.0.0.0/8"], &["https://wide.test"]),
            (&["10.20.0.0/16"], &["https://narrow.test"]),
            (&["2001:db8::/32"], &["https://v6.test"]),
        ]);

        let q = |s: &str| s.parse::<IpNetwork>().unwrap();
        assert_eq!(r.match_ip_network(&q("10.20.30.0/24")).unwrap(), vec!["https://narrow.test"]);
        assert_eq!(r.match_ip_network(&q("10.1.0.0/16")).unwrap(), vec!["https://wide.test"]);
        assert_eq!(r.match_ip_network(&q("2001:db8:1::/48")).unwrap(), vec!["https://v6.test"]);
        assert!(r.match_ip_network(&q("10.0.0.0/7")).is_err());
        assert!(r.match_ip_network(&q("192.0.2.0/24")).is_err());
    }

    #[test]
    fn test_match_target_dispatch() {
        let r = registry(&[
            (&["192.0.2.0/24"], &["https://ip.test"]),
            (&["net"], &["https://net.test"]),
        ]);

        let ip = QueryTarget::Ip("192.0.2.7".parse().unwrap());
        assert_eq!(r.match_target(&ip).unwrap(), vec!["https://ip.test"]);

        let domain = QueryTarget::Domain("example.net".to_string());
        assert_eq!(r.match_target(&domain).unwrap(), vec!["https://net.test"]);

        let entity = QueryTarget::Entity("ABC-1".to_string());
        assert_eq!(
            r.match_target(&entity).unwrap_err().kind(),
            crate::error::ErrorKind::Resolution
        );
    }
}
