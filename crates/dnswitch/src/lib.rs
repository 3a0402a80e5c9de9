//! Switch DNS resolvers safely.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dnswitch::{plan_scan_for, MemoryStore, ProbeCoordinator, Registry};
//! use dnswitch::probe::{scan, HickoryProber, DEFAULT_CONCURRENCY};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::load(MemoryStore::with_defaults())?;
//!     let jobs = plan_scan_for(&registry, None);
//!
//!     let mut coordinator = ProbeCoordinator::new();
//!     coordinator.mark_testing(jobs.iter().map(|j| &j.key));
//!
//!     let prober = HickoryProber::new();
//!     for (job, outcome) in scan(&prober, jobs, "youtube.com", DEFAULT_CONCURRENCY).await {
//!         coordinator.record_for_endpoint(registry.list(), &job.endpoint, outcome);
//!         println!("{}: {:?}", job.key, coordinator.get(job.key.as_str()));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `default` - Enables `probe`
//! - `probe` - hickory-resolver backed connectivity probes, re-exported as [`probe`]

#![doc(html_root_url = "https://docs.rs/dnswitch/0.3.0")]

// Re-export core types
pub use dnswitch_core::*;

// Re-export probes if enabled
#[cfg(feature = "probe")]
pub use dnswitch_probe as probe;

/// Probe jobs for every server in `registry`
#[cfg(feature = "probe")]
#[must_use]
pub fn plan_scan_for<S: ServerStore>(
    registry: &Registry<S>,
    global_key: Option<&str>,
) -> Vec<probe::ScanJob> {
    probe::plan_scan(registry.list(), registry.list(), global_key)
}

// Re-export runtime for convenience
pub use serde;
pub use serde_json;
pub use tokio;

#[cfg(all(test, feature = "probe"))]
mod tests {
    use super::*;

    #[test]
    fn test_plan_scan_for_covers_registry() {
        let registry = Registry::load(MemoryStore::with_defaults()).unwrap();
        let jobs = plan_scan_for(&registry, Some("CLOUDFLARE_DNS"));
        assert_eq!(jobs.len(), registry.list().len());

        let cloudflare = jobs.iter().find(|j| j.key == "CLOUDFLARE_DNS").unwrap();
        assert_eq!(cloudflare.bootstrap, BootstrapPlan::System);
    }

    #[test]
    fn test_invalid_endpoint_probe_through_facade() {
        use crate::probe::HickoryProber;

        let outcome = tokio_test::block_on(HickoryProber::new().probe(
            "not-a-resolver",
            DEFAULT_TEST_DOMAIN,
            &BootstrapPlan::System,
        ));
        assert!(!outcome.success);
    }
}
