//! Concurrent probing of many servers.

use dnswitch_core::{
    resolve_bootstrap, BootstrapPlan, ProbeExecutor, ProbeOutcome, ServerKey, ServerSpec,
};
use futures_util::stream::{self, Stream, StreamExt};

/// One probe to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJob {
    /// Server being probed
    pub key: ServerKey,
    /// Its first endpoint; results are correlated by this string
    pub endpoint: String,
    /// How to reach the endpoint's host
    pub bootstrap: BootstrapPlan,
}

/// Build probe jobs for `targets`, planning each one's bootstrap against `registry`
#[must_use]
pub fn plan_scan<'a, I>(
    targets: I,
    registry: &[ServerSpec],
    global_key: Option<&str>,
) -> Vec<ScanJob>
where
    I: IntoIterator<Item = &'a ServerSpec>,
{
    targets
        .into_iter()
        .filter(|s| !s.endpoints.is_empty())
        .map(|server| ScanJob {
            key: server.key.clone(),
            endpoint: server.primary_endpoint().to_string(),
            bootstrap: resolve_bootstrap(server, registry, global_key),
        })
        .collect()
}

/// Probe every job with at most `concurrency` in flight, yielding results as they finish
pub fn scan_stream<'a, E>(
    executor: &'a E,
    jobs: Vec<ScanJob>,
    test_domain: &'a str,
    concurrency: usize,
) -> impl Stream<Item = (ScanJob, ProbeOutcome)> + 'a
where
    E: ProbeExecutor + ?Sized,
{
    stream::iter(jobs)
        .map(move |job| async move {
            let outcome = executor.probe(&job.endpoint, test_domain, &job.bootstrap).await;
            (job, outcome)
        })
        .buffer_unordered(concurrency.max(1))
}

/// Probe every job and collect the results in completion order
pub async fn scan<E>(
    executor: &E,
    jobs: Vec<ScanJob>,
    test_domain: &str,
    concurrency: usize,
) -> Vec<(ScanJob, ProbeOutcome)>
where
    E: ProbeExecutor + ?Sized,
{
    scan_stream(executor, jobs, test_domain, concurrency)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dnswitch_core::{default_servers, ProbeCoordinator, Protocol};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sleeps, then succeeds, tracking peak concurrency
    #[derive(Default)]
    struct CountingExecutor {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl ProbeExecutor for CountingExecutor {
        async fn probe(&self, endpoint: &str, _: &str, _: &BootstrapPlan) -> ProbeOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10 + endpoint.len() as u64)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            ProbeOutcome::success(7)
        }
    }

    #[test]
    fn test_plan_scan_uses_bootstrap_tiers() {
        let registry = default_servers();
        let doh: Vec<_> = registry.iter().filter(|s| s.protocol == Protocol::Doh).collect();
        let jobs = plan_scan(doh.iter().copied(), &registry, Some("QUAD9_DNS"));

        assert_eq!(jobs.len(), doh.len());
        assert_eq!(jobs[0].endpoint, "https://cloudflare-dns.com/dns-query");
        assert!(matches!(
            &jobs[0].bootstrap,
            BootstrapPlan::Resolver(via) if via.endpoint == "9.9.9.9"
        ));

        let jobs = plan_scan(&registry, &registry, None);
        assert!(jobs.iter().all(|j| j.bootstrap == BootstrapPlan::System));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_bounds_concurrency() {
        let registry = default_servers();
        let jobs = plan_scan(&registry, &registry, None);
        let executor = CountingExecutor::default();

        let results = scan(&executor, jobs, "youtube.com", 3).await;
        assert_eq!(results.len(), registry.len());
        assert!(executor.peak.load(Ordering::SeqCst) <= 3);
        assert!(executor.peak.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_feed_coordinator() {
        let registry = default_servers();
        let jobs = plan_scan(&registry, &registry, None);
        let mut coordinator = ProbeCoordinator::new();
        coordinator.mark_testing(jobs.iter().map(|j| &j.key));

        let executor = CountingExecutor::default();
        let mut stream = Box::pin(scan_stream(&executor, jobs, "youtube.com", 8));
        while let Some((job, outcome)) = stream.next().await {
            let updated = coordinator.record_for_endpoint(&registry, &job.endpoint, outcome);
            assert!(updated.contains(&job.key));
        }
        assert_eq!(coordinator.pending(), 0);
        assert_eq!(coordinator.get("YANDEX_DNS").latency_ms(), Some(7));
    }
}
