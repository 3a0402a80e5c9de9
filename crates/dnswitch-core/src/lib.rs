//! Core logic for dnswitch.
//!
//! This crate holds everything that decides *what* to do, independent of
//! transports and storage:
//!
//! - **Validation**: protocol-aware parsing and normalization of server definitions
//! - **Registry**: keyed server collection with write-through persistence
//! - **Bootstrap**: how an encrypted resolver's own hostname gets resolved
//! - **Rules**: static-answer overrides with exact and wildcard matching
//! - **Probes**: per-server connectivity state and the [`ProbeExecutor`] seam
//!
//! # Example
//!
//! ```rust
//! use dnswitch_core::{MemoryStore, Protocol, Registry, RuleDraft, RuleEngine, ServerInput};
//!
//! let mut registry = Registry::load(MemoryStore::new()).unwrap();
//! let spec = registry
//!     .create(&ServerInput::new("Quad9 DoT").endpoint("tls://dns.quad9.net:853"), Protocol::Dot)
//!     .unwrap();
//! assert_eq!(spec.key.as_str(), "QUAD9_DOT");
//!
//! let mut rules = RuleEngine::load(MemoryStore::new()).unwrap();
//! rules.upsert(RuleDraft::new("*.ads.example.com", "0.0.0.0")).unwrap();
//! assert!(rules.match_domain("x.ads.example.com").is_some());
//! assert!(rules.match_domain("ads.example.com").is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/dnswitch-core/0.3.0")]

pub mod bootstrap;
pub mod coordinator;
pub mod debounce;
pub mod defaults;
mod error;
mod key;
pub mod log_view;
pub mod registry;
pub mod rules;
pub mod store;
pub mod types;
pub mod validate;

pub use bootstrap::{resolve_bootstrap, BootstrapPlan, BootstrapResolver};
pub use coordinator::{ProbeCoordinator, ProbeExecutor};
pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use defaults::default_servers;
pub use error::{
    DuplicateKeyError, Outcome, RegistryError, Result, RuleError, StoreError, ValidationError,
    ValidationErrors,
};
pub use key::generate_key;
pub use log_view::QueryLog;
pub use registry::Registry;
pub use rules::RuleEngine;
pub use store::{MemoryStore, RuleStore, ServerStore};
pub use types::*;
pub use validate::{
    is_valid_domain, parse_endpoint_list, validate_and_normalize, Endpoint, EndpointParts, Host,
    ServerInput,
};
