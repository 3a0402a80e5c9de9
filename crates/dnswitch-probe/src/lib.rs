//! Resolver connectivity probes for dnswitch.
//!
//! [`HickoryProber`] implements [`dnswitch_core::ProbeExecutor`] on top of
//! `hickory-resolver`, honoring the bootstrap plan computed by the core.
//! [`scan`] drives many probes concurrently.
//!
//! Encrypted transports (DoH, DoT, DoQ, DoH3) need the `encrypted` feature,
//! which is on by default.

#![doc(html_root_url = "https://docs.rs/dnswitch-probe/0.3.0")]

mod error;
pub mod prober;
pub mod scanner;
mod transport;

pub use error::{ProbeError, Result};
pub use prober::{HickoryProber, ProbeConfig, DEFAULT_CONCURRENCY, DEFAULT_PROBE_TIMEOUT};
pub use scanner::{plan_scan, scan, scan_stream, ScanJob};
