//! hickory-resolver construction per endpoint kind.

use dnswitch_core::{Endpoint, Protocol};
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol as Transport;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

use crate::error::{ProbeError, Result};

/// hickory transport carrying `protocol`
pub fn transport(protocol: Protocol) -> Result<Transport> {
    match protocol {
        Protocol::Plain => Ok(Transport::Udp),
        #[cfg(feature = "encrypted")]
        Protocol::Doh => Ok(Transport::Https),
        #[cfg(feature = "encrypted")]
        Protocol::Dot => Ok(Transport::Tls),
        #[cfg(feature = "encrypted")]
        Protocol::Doq => Ok(Transport::Quic),
        #[cfg(feature = "encrypted")]
        Protocol::Doh3 => Ok(Transport::H3),
        #[cfg(not(feature = "encrypted"))]
        other => Err(ProbeError::Unsupported(other)),
    }
}

/// One attempt, no cache: every probe hits the wire
fn probe_options(timeout: Duration) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 1;
    opts.cache_size = 0;
    opts
}

/// Resolver that talks only to `endpoint`, connecting to `ip`
pub fn resolver_for(endpoint: &Endpoint, ip: IpAddr, timeout: Duration) -> Result<TokioResolver> {
    let protocol = endpoint.protocol();
    let addr = SocketAddr::new(ip, endpoint.port());
    let mut server = NameServerConfig::new(addr, transport(protocol)?);
    if protocol.is_encrypted() {
        server.tls_dns_name = Some(endpoint.host().to_string());
    }
    if let Some(path) = endpoint.http_path() {
        server.http_endpoint = Some(path.to_string());
    }

    let mut config = ResolverConfig::new();
    config.add_name_server(server);
    debug!(%endpoint, %ip, "built probe resolver");

    Ok(Resolver::builder_with_config(config, TokioConnectionProvider::default())
        .with_options(probe_options(timeout))
        .build())
}

/// The operating system's resolver with probe timeouts
pub fn system_resolver(timeout: Duration) -> Result<TokioResolver> {
    let builder = TokioResolver::builder_tokio()
        .map_err(|e| ProbeError::Setup(format!("failed to read system resolver config: {e}")))?;
    Ok(builder.with_options(probe_options(timeout)).build())
}

/// First address for `host`, preferring IPv4
pub async fn lookup_first(resolver: &TokioResolver, host: &str) -> Result<IpAddr> {
    let lookup = resolver
        .lookup_ip(host)
        .await
        .map_err(|e| ProbeError::Dns(e.to_string()))?;
    let addrs: Vec<IpAddr> = lookup.iter().collect();
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| ProbeError::NoAddresses(host.to_string()))
}
