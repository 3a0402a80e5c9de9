//! Connectivity probe bookkeeping.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

use crate::bootstrap::BootstrapPlan;
use crate::types::{ProbeOutcome, ProbeResult, ServerKey, ServerSpec};

static UNSET: ProbeResult = ProbeResult::Unset;

/// Runs one connectivity check against a resolver endpoint
#[async_trait]
pub trait ProbeExecutor: Send + Sync {
    /// Resolve `test_domain` through `endpoint`, reaching its host per `bootstrap`.
    ///
    /// Failures are reported in the outcome, never as a panic or error.
    async fn probe(&self, endpoint: &str, test_domain: &str, bootstrap: &BootstrapPlan)
        -> ProbeOutcome;
}

/// Per-server probe state for the current session.
///
/// Results arrive asynchronously and are correlated by the server's first
/// endpoint, so a result for an endpoint that was edited away is dropped.
#[derive(Debug, Default)]
pub struct ProbeCoordinator {
    results: HashMap<ServerKey, ProbeResult>,
}

impl ProbeCoordinator {
    /// Empty coordinator; every server reads as [`ProbeResult::Unset`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark servers as testing, skipping any that already have a state.
    ///
    /// Returns the keys that were newly marked.
    pub fn mark_testing<'a, I>(&mut self, keys: I) -> Vec<ServerKey>
    where
        I: IntoIterator<Item = &'a ServerKey>,
    {
        let mut marked = Vec::new();
        for key in keys {
            if !self.results.contains_key(key) {
                self.results.insert(key.clone(), ProbeResult::Testing);
                marked.push(key.clone());
            }
        }
        marked
    }

    /// Force a server back to testing for an explicit retry
    pub fn retest(&mut self, key: &ServerKey) {
        self.results.insert(key.clone(), ProbeResult::Testing);
    }

    /// Store a result, replacing whatever was there
    pub fn record_result(&mut self, key: &ServerKey, result: ProbeResult) {
        debug!(key = %key, ?result, "probe result");
        self.results.insert(key.clone(), result);
    }

    /// Attribute an executor outcome to every server whose first endpoint is `endpoint`.
    ///
    /// Returns the keys that were updated. When none match the outcome is dropped.
    pub fn record_for_endpoint(
        &mut self,
        servers: &[ServerSpec],
        endpoint: &str,
        outcome: ProbeOutcome,
    ) -> Vec<ServerKey> {
        let result = ProbeResult::from(outcome);
        let updated: Vec<ServerKey> = servers
            .iter()
            .filter(|s| s.primary_endpoint() == endpoint)
            .map(|s| s.key.clone())
            .collect();
        if updated.is_empty() {
            debug!(endpoint, "dropping probe result for unknown endpoint");
        }
        for key in &updated {
            self.record_result(key, result.clone());
        }
        updated
    }

    /// Current state of a server
    #[must_use]
    pub fn get(&self, key: &str) -> &ProbeResult {
        self.results.get(key).unwrap_or(&UNSET)
    }

    /// Number of probes still outstanding
    #[must_use]
    pub fn pending(&self) -> usize {
        self.results.values().filter(|r| r.is_testing()).count()
    }

    /// Forget every result
    pub fn reset(&mut self) {
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_servers;

    struct FixedLatency(u64);

    #[async_trait]
    impl ProbeExecutor for FixedLatency {
        async fn probe(&self, endpoint: &str, _: &str, _: &BootstrapPlan) -> ProbeOutcome {
            if endpoint.starts_with("quic://") {
                ProbeOutcome::failure(self.0, "unsupported")
            } else {
                ProbeOutcome::success(self.0)
            }
        }
    }

    fn key(k: &str) -> ServerKey {
        ServerKey::new(k)
    }

    #[test]
    fn test_mark_testing_skips_known_keys() {
        let mut coordinator = ProbeCoordinator::new();
        coordinator.record_result(&key("A"), ProbeResult::Success { latency_ms: 5 });

        let marked = coordinator.mark_testing(&[key("A"), key("B")]);
        assert_eq!(marked, vec![key("B")]);
        assert_eq!(coordinator.get("A"), &ProbeResult::Success { latency_ms: 5 });
        assert_eq!(coordinator.get("B"), &ProbeResult::Testing);
        assert_eq!(coordinator.get("C"), &ProbeResult::Unset);
        assert_eq!(coordinator.pending(), 1);
    }

    #[test]
    fn test_retest_and_reset() {
        let mut coordinator = ProbeCoordinator::new();
        coordinator.record_result(&key("A"), ProbeResult::Failure { reason: "timeout".into() });
        coordinator.retest(&key("A"));
        assert!(coordinator.get("A").is_testing());

        coordinator.reset();
        assert_eq!(coordinator.get("A"), &ProbeResult::Unset);
    }

    #[test]
    fn test_record_for_endpoint() {
        let servers = default_servers();
        let mut coordinator = ProbeCoordinator::new();

        let updated =
            coordinator.record_for_endpoint(&servers, "8.8.8.8", ProbeOutcome::success(12));
        assert_eq!(updated, vec![key("GOOGLE_DNS")]);
        assert_eq!(coordinator.get("GOOGLE_DNS").latency_ms(), Some(12));

        // Second endpoints are not used for correlation
        assert!(coordinator
            .record_for_endpoint(&servers, "8.8.4.4", ProbeOutcome::success(1))
            .is_empty());
        let renamed = ProbeOutcome::failure(0, "x");
        assert!(coordinator
            .record_for_endpoint(&servers, "tls://renamed.example:853", renamed)
            .is_empty());
    }

    #[test]
    fn test_shared_first_endpoint_updates_every_server() {
        let mut servers = default_servers();
        servers.push(ServerSpec {
            key: key("MY_GOOGLE"),
            name: "My Google".into(),
            protocol: crate::types::Protocol::Plain,
            endpoints: vec!["8.8.8.8".into(), "1.1.1.1".into()],
            tags: Vec::new(),
            bootstrap_ip: None,
        });
        let mut coordinator = ProbeCoordinator::new();
        coordinator.mark_testing(&[key("GOOGLE_DNS"), key("MY_GOOGLE")]);

        let updated =
            coordinator.record_for_endpoint(&servers, "8.8.8.8", ProbeOutcome::success(5));
        assert_eq!(updated, vec![key("GOOGLE_DNS"), key("MY_GOOGLE")]);
        assert_eq!(coordinator.get("GOOGLE_DNS"), &ProbeResult::Success { latency_ms: 5 });
        assert_eq!(coordinator.get("MY_GOOGLE"), &ProbeResult::Success { latency_ms: 5 });
        assert_eq!(coordinator.pending(), 0);
    }

    #[tokio::test]
    async fn test_executor_results_flow_into_coordinator() {
        let servers = default_servers();
        let executor = FixedLatency(20);
        let mut coordinator = ProbeCoordinator::new();
        let keys: Vec<_> = servers.iter().map(|s| s.key.clone()).collect();
        coordinator.mark_testing(&keys);

        for server in &servers {
            let outcome = executor
                .probe(server.primary_endpoint(), "youtube.com", &BootstrapPlan::System)
                .await;
            coordinator.record_for_endpoint(&servers, server.primary_endpoint(), outcome);
        }

        assert_eq!(coordinator.pending(), 0);
        assert_eq!(coordinator.get("CLOUDFLARE_DOH").latency_ms(), Some(20));
        assert_eq!(
            coordinator.get("QUAD9_DOQ"),
            &ProbeResult::Failure { reason: "unsupported".into() }
        );
    }
}
