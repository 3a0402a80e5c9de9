//! Persistence seams for servers and rules.
//!
//! The core never touches disk. Hosts hand a store to [`Registry`] or
//! [`RuleEngine`] and the owner writes through it before changing memory.
//!
//! [`Registry`]: crate::Registry
//! [`RuleEngine`]: crate::RuleEngine

use crate::defaults::default_servers;
use crate::error::Result;
use crate::types::{DomainRule, RuleId, ServerSpec};

/// Backing storage for the server registry
pub trait ServerStore {
    /// Read every stored server, in order
    fn load_servers(&self) -> Result<Vec<ServerSpec>>;

    /// Replace the stored list with `servers`
    fn persist_servers(&mut self, servers: &[ServerSpec]) -> Result<()>;

    /// Replace the stored list with the built-ins and return them
    fn reset_to_defaults(&mut self) -> Result<Vec<ServerSpec>> {
        let servers = default_servers();
        self.persist_servers(&servers)?;
        Ok(servers)
    }
}

/// Backing storage for domain rules
pub trait RuleStore {
    /// Read every stored rule, in order
    fn load_rules(&self) -> Result<Vec<DomainRule>>;

    /// Insert a rule, or replace the one with the same id in place
    fn persist_rule(&mut self, rule: &DomainRule) -> Result<()>;

    /// Remove a rule; unknown ids are ignored
    fn delete_rule(&mut self, id: &RuleId) -> Result<()>;
}

/// In-memory store for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    servers: Vec<ServerSpec>,
    rules: Vec<DomainRule>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the built-in servers
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::with_servers(default_servers())
    }

    /// Store seeded with `servers`
    #[must_use]
    pub fn with_servers(servers: Vec<ServerSpec>) -> Self {
        Self {
            servers,
            rules: Vec::new(),
        }
    }

    /// Stored servers
    #[must_use]
    pub fn servers(&self) -> &[ServerSpec] {
        &self.servers
    }

    /// Stored rules
    #[must_use]
    pub fn rules(&self) -> &[DomainRule] {
        &self.rules
    }
}

impl ServerStore for MemoryStore {
    fn load_servers(&self) -> Result<Vec<ServerSpec>> {
        Ok(self.servers.clone())
    }

    fn persist_servers(&mut self, servers: &[ServerSpec]) -> Result<()> {
        self.servers = servers.to_vec();
        Ok(())
    }
}

impl RuleStore for MemoryStore {
    fn load_rules(&self) -> Result<Vec<DomainRule>> {
        Ok(self.rules.clone())
    }

    fn persist_rule(&mut self, rule: &DomainRule) -> Result<()> {
        upsert_by_id(&mut self.rules, rule);
        Ok(())
    }

    fn delete_rule(&mut self, id: &RuleId) -> Result<()> {
        self.rules.retain(|r| &r.id != id);
        Ok(())
    }
}

/// Replace the rule with the same id in place, or append it
pub fn upsert_by_id(rules: &mut Vec<DomainRule>, rule: &DomainRule) {
    match rules.iter_mut().find(|r| r.id == rule.id) {
        Some(existing) => *existing = rule.clone(),
        None => rules.push(rule.clone()),
    }
}
