//! # dnswitch-cli
//!
//! Command-line interface for dnswitch.
//!
//! ## Features
//!
//! - **Resolver registry**: add, edit, remove and reset plain DNS, DoH, DoT, DoQ and DoH3 servers
//! - **Domain overrides**: exact and wildcard rules with static A/AAAA answers
//! - **Probes**: concurrent, bootstrap-aware connectivity checks
//! - **Educational mode**: `--explain` flag explains what commands do
//! - **Multiple output formats**: Pretty tables, JSON, CSV, YAML

pub mod cli;
pub mod config;
pub mod education;
pub mod output;
pub mod store;

pub use cli::run;
