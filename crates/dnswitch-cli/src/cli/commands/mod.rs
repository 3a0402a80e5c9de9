//! Command implementations.

pub mod bootstrap;
pub mod config;
pub mod ips;
pub mod logs;
pub mod probe;
pub mod rules;
pub mod servers;

use anyhow::{Context as _, Result};
use dnswitch::{QueryLog, QueryLogEntry, Registry, RuleEngine};
use std::path::Path;

use crate::config::{Config, Paths};
use crate::output::OutputFormat;
use crate::store::JsonFileStore;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output format
    pub output_format: OutputFormat,

    /// Whether to show educational explanations
    pub explain: bool,

    /// Verbose output
    pub verbose: bool,

    /// Disable colors
    pub no_color: bool,

    /// Skip confirmation prompts
    pub yes: bool,

    /// Config and data locations
    pub paths: Paths,

    /// Loaded configuration
    pub config: Config,
}

impl Context {
    /// Store rooted at the data directory.
    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(&self.paths.data_dir)
    }

    /// Load the resolver registry.
    pub fn registry(&self) -> Result<Registry<JsonFileStore>> {
        let store = self.store();
        let path = store.servers_path();
        Registry::load(store).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Load the domain rules.
    pub fn rules(&self) -> Result<RuleEngine<JsonFileStore>> {
        let store = self.store();
        let path = store.rules_path();
        RuleEngine::load(store).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Persist the current configuration.
    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.paths.config_file())
    }

    /// Ask before a destructive change; `--yes` answers for the user.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }
        let answer = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Confirmation needs a terminal; pass --yes to skip it")?;
        Ok(answer)
    }
}

/// Read a query log export into a bounded newest-first buffer.
///
/// The export is a JSON array in the order queries were observed.
pub fn load_query_log(path: &Path, capacity: usize) -> Result<QueryLog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let entries: Vec<QueryLogEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid query log in {}", path.display()))?;

    let mut log = QueryLog::with_capacity(capacity);
    log.extend(entries);
    Ok(log)
}
