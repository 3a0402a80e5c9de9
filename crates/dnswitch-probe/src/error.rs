use dnswitch_core::{Protocol, ValidationErrors};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors raised while probing a resolver.
///
/// They never escape [`ProbeExecutor::probe`]; the message becomes the
/// failure reason shown for the server.
///
/// [`ProbeExecutor::probe`]: dnswitch_core::ProbeExecutor::probe
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Endpoint string does not parse
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] ValidationErrors),

    /// Transport not compiled into this build
    #[error("{0} probes are not supported by this build")]
    Unsupported(Protocol),

    /// The resolver's own hostname could not be resolved
    #[error("bootstrap lookup of {host} failed: {reason}")]
    Bootstrap {
        /// Hostname being bootstrapped
        host: String,
        /// Underlying failure
        reason: String,
    },

    /// Resolver could not be constructed
    #[error("resolver setup failed: {0}")]
    Setup(String),

    /// Test query failed
    #[error("DNS error: {0}")]
    Dns(String),

    /// Lookup succeeded but returned nothing usable
    #[error("no addresses returned for {0}")]
    NoAddresses(String),

    /// Probe exceeded its deadline
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}
