//! Connectivity probes over hickory-resolver.

use async_trait::async_trait;
use dnswitch_core::{BootstrapPlan, BootstrapResolver, Endpoint, Host, ProbeExecutor, ProbeOutcome};
use std::future::Future;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::error::{ProbeError, Result};
use crate::transport::{lookup_first, resolver_for, system_resolver};

/// Deadline for each lookup a probe makes
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Probes in flight at once during a scan
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Probe tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Deadline per lookup
    pub timeout: Duration,
    /// Maximum concurrent probes in a scan
    pub concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// [`ProbeExecutor`] that resolves the test domain through the endpoint under test.
///
/// The endpoint's host is reached according to the [`BootstrapPlan`]:
///
/// | plan | host address |
/// |---|---|
/// | IPv4 literal host | used as is |
/// | `Direct(ip)` | `ip` |
/// | `Resolver(r)` | looked up through `r`, reached via its bootstrap IP or system DNS |
/// | `System` | system resolver |
///
/// Reported latency covers the test lookup only.
#[derive(Debug, Clone, Default)]
pub struct HickoryProber {
    config: ProbeConfig,
}

impl HickoryProber {
    /// Prober with default timeouts
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prober with custom tuning
    #[must_use]
    pub const fn with_config(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Set the per-lookup deadline
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Current tuning
    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Address to connect to for `endpoint`
    pub async fn resolve_target(
        &self,
        endpoint: &Endpoint,
        plan: &BootstrapPlan,
    ) -> Result<IpAddr> {
        let name = match endpoint.host() {
            Host::Ipv4(ip) => return Ok(ip.into()),
            Host::Domain(name) => name,
        };
        match plan {
            BootstrapPlan::Direct(ip) => Ok((*ip).into()),
            BootstrapPlan::Resolver(via) => self.lookup_via(via, &name).await,
            BootstrapPlan::System => self.lookup_system(&name).await,
        }
    }

    async fn lookup_via(&self, via: &BootstrapResolver, host: &str) -> Result<IpAddr> {
        let via_endpoint = Endpoint::detect(&via.endpoint)?;
        let via_ip = match (via_endpoint.host(), via.bootstrap_ip) {
            (Host::Ipv4(ip), _) | (Host::Domain(_), Some(ip)) => ip.into(),
            (Host::Domain(name), None) => self.lookup_system(&name).await?,
        };
        debug!(host, via = %via_endpoint, %via_ip, "bootstrapping through resolver");

        let resolver = resolver_for(&via_endpoint, via_ip, self.config.timeout)?;
        self.deadline(lookup_first(&resolver, host))
            .await
            .map_err(|e| bootstrap_error(host, e))
    }

    async fn lookup_system(&self, host: &str) -> Result<IpAddr> {
        let resolver = system_resolver(self.config.timeout)?;
        self.deadline(lookup_first(&resolver, host))
            .await
            .map_err(|e| bootstrap_error(host, e))
    }

    /// Run one probe, returning the test lookup's latency
    #[instrument(skip(self, plan), level = "debug")]
    pub async fn try_probe(
        &self,
        endpoint: &str,
        test_domain: &str,
        plan: &BootstrapPlan,
    ) -> Result<Duration> {
        let endpoint = Endpoint::detect(endpoint)?;
        let ip = self.resolve_target(&endpoint, plan).await?;
        let resolver = resolver_for(&endpoint, ip, self.config.timeout)?;

        let start = Instant::now();
        self.deadline(lookup_first(&resolver, test_domain)).await?;
        Ok(start.elapsed())
    }

    async fn deadline<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| ProbeError::Timeout(self.config.timeout))?
    }
}

fn bootstrap_error(host: &str, err: ProbeError) -> ProbeError {
    match err {
        nested @ ProbeError::Bootstrap { .. } => nested,
        other => ProbeError::Bootstrap {
            host: host.to_string(),
            reason: other.to_string(),
        },
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl ProbeExecutor for HickoryProber {
    async fn probe(
        &self,
        endpoint: &str,
        test_domain: &str,
        bootstrap: &BootstrapPlan,
    ) -> ProbeOutcome {
        let start = Instant::now();
        match self.try_probe(endpoint, test_domain, bootstrap).await {
            Ok(latency) => ProbeOutcome::success(millis(latency)),
            Err(e) => {
                debug!(endpoint, error = %e, "probe failed");
                ProbeOutcome::failure(millis(start.elapsed()), e.to_string())
            }
        }
    }
}
