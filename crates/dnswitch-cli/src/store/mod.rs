//! JSON file persistence for servers and rules.

use dnswitch::store::upsert_by_id;
use dnswitch::{default_servers, DomainRule, RuleId, RuleStore, ServerSpec, ServerStore, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Server list file name
pub const SERVERS_FILE: &str = "servers.json";

/// Rule list file name
pub const RULES_FILE: &str = "dns_rules.json";

/// Store backed by `servers.json` and `dns_rules.json` in one directory.
///
/// A missing server file reads as the built-in list; a missing rule file
/// reads as empty. Every write goes to a sibling temp file first and is
/// renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `dir`; nothing is created until the first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the server list
    pub fn servers_path(&self) -> PathBuf {
        self.dir.join(SERVERS_FILE)
    }

    /// Path of the rule list
    pub fn rules_path(&self) -> PathBuf {
        self.dir.join(RULES_FILE)
    }

    fn write(&self, path: &Path, value: &impl Serialize) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(value)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "wrote store file");
        Ok(())
    }
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl ServerStore for JsonFileStore {
    fn load_servers(&self) -> Result<Vec<ServerSpec>, StoreError> {
        Ok(read(&self.servers_path())?.unwrap_or_else(default_servers))
    }

    fn persist_servers(&mut self, servers: &[ServerSpec]) -> Result<(), StoreError> {
        self.write(&self.servers_path(), &servers)
    }
}

impl RuleStore for JsonFileStore {
    fn load_rules(&self) -> Result<Vec<DomainRule>, StoreError> {
        Ok(read(&self.rules_path())?.unwrap_or_default())
    }

    fn persist_rule(&mut self, rule: &DomainRule) -> Result<(), StoreError> {
        let mut rules = self.load_rules()?;
        upsert_by_id(&mut rules, rule);
        self.write(&self.rules_path(), &rules)
    }

    fn delete_rule(&mut self, id: &RuleId) -> Result<(), StoreError> {
        let mut rules = self.load_rules()?;
        rules.retain(|r| &r.id != id);
        self.write(&self.rules_path(), &rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnswitch::{Protocol, Registry, RuleDraft, RuleEngine, ServerInput};
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_read_as_defaults() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.load_servers().unwrap(), default_servers());
        assert!(store.load_rules().unwrap().is_empty());
        assert!(!store.servers_path().exists());
    }

    #[test]
    fn test_registry_writes_through() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::load(JsonFileStore::new(dir.path())).unwrap();
        registry
            .create(&ServerInput::new("Home Router").endpoint("192.168.1.1"), Protocol::Plain)
            .unwrap();

        let text = fs::read_to_string(dir.path().join(SERVERS_FILE)).unwrap();
        assert!(text.contains("\"HOME_ROUTER\""));
        assert!(text.contains("\"type\": \"dns\""));
        assert!(!dir.path().join("servers.json.tmp").exists());

        let reloaded = Registry::load(JsonFileStore::new(dir.path())).unwrap();
        assert_eq!(reloaded.list().len(), default_servers().len() + 1);
        assert!(reloaded.contains("HOME_ROUTER"));
    }

    #[test]
    fn test_rules_keep_order_across_reloads() {
        let dir = TempDir::new().unwrap();
        let mut engine = RuleEngine::load(JsonFileStore::new(dir.path())).unwrap();
        let first = engine.upsert(RuleDraft::new("ads.example.com", "0.0.0.0")).unwrap();
        engine.upsert(RuleDraft::new("*.example.com", "127.0.0.1")).unwrap();
        engine
            .upsert(RuleDraft::from_rule(&first).enabled(false))
            .unwrap();

        let reloaded = RuleEngine::load(JsonFileStore::new(dir.path())).unwrap();
        let patterns: Vec<_> = reloaded.list().iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, ["ads.example.com", "*.example.com"]);
        assert!(!reloaded.list()[0].enabled);

        let mut reloaded = reloaded;
        assert!(reloaded.delete(&first.id).unwrap().is_applied());
        let again = RuleEngine::load(JsonFileStore::new(dir.path())).unwrap();
        assert_eq!(again.list().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SERVERS_FILE), b"{ not json").unwrap();
        let err = JsonFileStore::new(dir.path()).load_servers().unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[test]
    fn test_reset_replaces_file_contents() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::load(JsonFileStore::new(dir.path())).unwrap();
        registry
            .remove(&dnswitch::ServerKey::new("GOOGLE_DNS"))
            .unwrap()
            .applied()
            .unwrap();
        assert!(!Registry::load(JsonFileStore::new(dir.path())).unwrap().contains("GOOGLE_DNS"));

        registry.reset().unwrap();
        assert!(Registry::load(JsonFileStore::new(dir.path())).unwrap().contains("GOOGLE_DNS"));
    }
}
