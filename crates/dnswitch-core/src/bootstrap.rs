//! Bootstrap planning for encrypted resolvers.
//!
//! An encrypted resolver is usually named by hostname, and that hostname has
//! to be resolved before the resolver can be used. The plan is picked in
//! three tiers:
//!
//! 1. the target's own `bootstrap_ip`
//! 2. the configured global bootstrap resolver, one level deep
//! 3. the operating system's resolver

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use tracing::debug;

use crate::types::{Protocol, ServerSpec};

/// Resolver used to look up an encrypted resolver's hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapResolver {
    /// Protocol of the bootstrap resolver
    pub protocol: Protocol,
    /// Its first endpoint
    pub endpoint: String,
    /// Address for the bootstrap resolver's own hostname, if it has one
    pub bootstrap_ip: Option<Ipv4Addr>,
}

/// How to reach the host of a server's first endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "via", rename_all = "lowercase")]
pub enum BootstrapPlan {
    /// Connect to this address; no lookup needed
    Direct(Ipv4Addr),
    /// Look the host up through another resolver
    Resolver(BootstrapResolver),
    /// Use the system resolver
    System,
}

/// Pick the bootstrap plan for `target`.
///
/// Pure: the same inputs always give the same plan. A global key that is
/// missing from `registry`, or that names `target` itself, falls back to
/// [`BootstrapPlan::System`].
#[must_use]
pub fn resolve_bootstrap(
    target: &ServerSpec,
    registry: &[ServerSpec],
    global_key: Option<&str>,
) -> BootstrapPlan {
    if let Some(ip) = target.bootstrap_ip {
        return BootstrapPlan::Direct(ip);
    }

    let entry = global_key
        .filter(|key| target.key != *key)
        .and_then(|key| registry.iter().find(|s| s.key == key));

    match entry {
        Some(entry) if !entry.endpoints.is_empty() => {
            let bootstrap_ip = if entry.protocol.is_encrypted() {
                entry.bootstrap_ip
            } else {
                None
            };
            debug!(server = %target.key, via = %entry.key, "bootstrap through global resolver");
            BootstrapPlan::Resolver(BootstrapResolver {
                protocol: entry.protocol,
                endpoint: entry.primary_endpoint().to_string(),
                bootstrap_ip,
            })
        }
        _ => BootstrapPlan::System,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_servers;
    use crate::types::ServerKey;

    fn doh(key: &str, bootstrap_ip: Option<Ipv4Addr>) -> ServerSpec {
        ServerSpec {
            key: ServerKey::new(key),
            name: key.to_string(),
            protocol: Protocol::Doh,
            endpoints: vec![format!("https://{}.example/dns-query", key.to_lowercase())],
            tags: Vec::new(),
            bootstrap_ip,
        }
    }

    #[test]
    fn test_own_bootstrap_ip_wins() {
        let ip = Ipv4Addr::new(1, 1, 1, 1);
        let target = doh("TARGET", Some(ip));
        let registry = default_servers();
        assert_eq!(
            resolve_bootstrap(&target, &registry, Some("GOOGLE_DNS")),
            BootstrapPlan::Direct(ip)
        );
    }

    #[test]
    fn test_global_plain_resolver() {
        let target = doh("TARGET", None);
        let registry = default_servers();
        assert_eq!(
            resolve_bootstrap(&target, &registry, Some("GOOGLE_DNS")),
            BootstrapPlan::Resolver(BootstrapResolver {
                protocol: Protocol::Plain,
                endpoint: "8.8.8.8".into(),
                bootstrap_ip: None,
            })
        );
    }

    #[test]
    fn test_global_encrypted_resolver_carries_its_ip() {
        let target = doh("TARGET", None);
        let via_ip = Ipv4Addr::new(9, 9, 9, 9);
        let registry = vec![doh("VIA", Some(via_ip)), doh("BARE", None)];

        assert_eq!(
            resolve_bootstrap(&target, &registry, Some("VIA")),
            BootstrapPlan::Resolver(BootstrapResolver {
                protocol: Protocol::Doh,
                endpoint: "https://via.example/dns-query".into(),
                bootstrap_ip: Some(via_ip),
            })
        );

        // Not chased further when the bootstrap resolver has no IP of its own
        assert_eq!(
            resolve_bootstrap(&target, &registry, Some("BARE")),
            BootstrapPlan::Resolver(BootstrapResolver {
                protocol: Protocol::Doh,
                endpoint: "https://bare.example/dns-query".into(),
                bootstrap_ip: None,
            })
        );
    }

    #[test]
    fn test_system_fallbacks() {
        let target = doh("TARGET", None);
        let mut registry = default_servers();
        assert_eq!(resolve_bootstrap(&target, &registry, None), BootstrapPlan::System);
        assert_eq!(
            resolve_bootstrap(&target, &registry, Some("DELETED")),
            BootstrapPlan::System
        );

        registry.push(target.clone());
        assert_eq!(
            resolve_bootstrap(&target, &registry, Some("TARGET")),
            BootstrapPlan::System
        );
    }

    #[test]
    fn test_deterministic() {
        let target = doh("TARGET", None);
        let registry = default_servers();
        let first = resolve_bootstrap(&target, &registry, Some("QUAD9_DOH"));
        for _ in 0..3 {
            assert_eq!(resolve_bootstrap(&target, &registry, Some("QUAD9_DOH")), first);
        }
    }
}
