//! The server registry.

use tracing::{debug, info};

use crate::error::{DuplicateKeyError, Outcome, RegistryError, StoreError};
use crate::store::ServerStore;
use crate::types::{Protocol, ServerKey, ServerSpec};
use crate::validate::{validate_and_normalize, ServerInput};

/// Ordered collection of servers with unique keys, written through to `S`.
///
/// Every mutation builds the next list on a copy, persists it and only then
/// swaps it in. A failed persist leaves the registry as it was.
#[derive(Debug)]
pub struct Registry<S> {
    servers: Vec<ServerSpec>,
    store: S,
}

impl<S: ServerStore> Registry<S> {
    /// Load the registry from its store
    pub fn load(store: S) -> Result<Self, StoreError> {
        let servers = store.load_servers()?;
        debug!(count = servers.len(), "loaded servers");
        Ok(Self { servers, store })
    }

    /// All servers, in insertion order
    #[must_use]
    pub fn list(&self) -> &[ServerSpec] {
        &self.servers
    }

    /// Look up a server by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ServerSpec> {
        self.servers.iter().find(|s| s.key == key)
    }

    /// Returns true if `key` is registered
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Servers of one protocol, in insertion order
    pub fn filter(&self, protocol: Protocol) -> impl Iterator<Item = &ServerSpec> {
        self.servers.iter().filter(move |s| s.protocol == protocol)
    }

    /// The backing store
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Append an already-validated server.
    ///
    /// # Errors
    ///
    /// Fails with [`RegistryError::Duplicate`] if the key is taken; nothing
    /// is inserted.
    pub fn register(&mut self, spec: ServerSpec) -> Result<(), RegistryError> {
        if self.contains(spec.key.as_str()) {
            return Err(DuplicateKeyError { key: spec.key }.into());
        }
        let key = spec.key.clone();
        let mut next = self.servers.clone();
        next.push(spec);
        self.commit(next)?;
        info!(key = %key, "registered server");
        Ok(())
    }

    /// Validate `input` and register the result under its derived key
    pub fn create(
        &mut self,
        input: &ServerInput,
        protocol: Protocol,
    ) -> Result<ServerSpec, RegistryError> {
        let spec = validate_and_normalize(input, protocol)?;
        self.register(spec.clone())?;
        Ok(spec)
    }

    /// Replace the server with the same key in place
    pub fn update(&mut self, spec: ServerSpec) -> Result<Outcome<ServerSpec>, StoreError> {
        let Some(index) = self.position(&spec.key) else {
            debug!(key = %spec.key, "update of unknown server ignored");
            return Ok(Outcome::NotFound);
        };
        let mut next = self.servers.clone();
        next[index] = spec.clone();
        self.commit(next)?;
        info!(key = %spec.key, "updated server");
        Ok(Outcome::Applied(spec))
    }

    /// Validate `input` as a new version of `key`.
    ///
    /// The key never changes, even if the name does.
    pub fn edit(
        &mut self,
        key: &ServerKey,
        input: &ServerInput,
        protocol: Protocol,
    ) -> Result<Outcome<ServerSpec>, RegistryError> {
        if !self.contains(key.as_str()) {
            return Ok(Outcome::NotFound);
        }
        let mut spec = validate_and_normalize(input, protocol)?;
        spec.key = key.clone();
        Ok(self.update(spec)?)
    }

    /// Remove a server by key
    pub fn remove(&mut self, key: &ServerKey) -> Result<Outcome<ServerSpec>, StoreError> {
        let Some(index) = self.position(key) else {
            debug!(key = %key, "remove of unknown server ignored");
            return Ok(Outcome::NotFound);
        };
        let mut next = self.servers.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!(key = %key, "removed server");
        Ok(Outcome::Applied(removed))
    }

    /// Replace the whole collection with the store's built-in defaults
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.servers = self.store.reset_to_defaults()?;
        info!(count = self.servers.len(), "registry reset to defaults");
        Ok(())
    }

    fn position(&self, key: &ServerKey) -> Option<usize> {
        self.servers.iter().position(|s| &s.key == key)
    }

    fn commit(&mut self, next: Vec<ServerSpec>) -> Result<(), StoreError> {
        self.store.persist_servers(&next)?;
        self.servers = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_servers;
    use crate::store::MemoryStore;

    /// Store that can be told to reject writes
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail: bool,
    }

    impl ServerStore for FlakyStore {
        fn load_servers(&self) -> crate::Result<Vec<ServerSpec>> {
            self.inner.load_servers()
        }

        fn persist_servers(&mut self, servers: &[ServerSpec]) -> crate::Result<()> {
            if self.fail {
                return Err(StoreError::Backend("disk full".into()));
            }
            self.inner.persist_servers(servers)
        }
    }

    fn google() -> ServerInput {
        ServerInput::new("Google DNS")
            .endpoint("8.8.8.8")
            .endpoint("8.8.4.4")
    }

    #[test]
    fn test_create_derives_key_and_persists() {
        let mut registry = Registry::load(MemoryStore::new()).unwrap();
        let spec = registry.create(&google(), Protocol::Plain).unwrap();
        assert_eq!(spec.key, "GOOGLE_DNS");
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.store().servers(), registry.list());
    }

    #[test]
    fn test_duplicate_key_rejected_without_partial_insert() {
        let mut registry = Registry::load(MemoryStore::new()).unwrap();
        registry.create(&google(), Protocol::Plain).unwrap();

        let again = ServerInput::new("google dns").endpoint("1.1.1.1");
        let err = registry.create(&again, Protocol::Plain).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(ref e) if e.key == "GOOGLE_DNS"));
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.get("GOOGLE_DNS").unwrap().endpoints[0], "8.8.8.8");
    }

    #[test]
    fn test_invalid_input_not_registered() {
        let mut registry = Registry::load(MemoryStore::new()).unwrap();
        let err = registry
            .create(&ServerInput::new("Bad").endpoint("x"), Protocol::Plain)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_failed_persist_leaves_state_unchanged() {
        let mut registry = Registry::load(FlakyStore::default()).unwrap();
        registry.create(&google(), Protocol::Plain).unwrap();
        registry.store.fail = true;

        let err = registry
            .create(&ServerInput::new("Quad9").endpoint("9.9.9.9"), Protocol::Plain)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Store(_)));
        assert_eq!(registry.list().len(), 1);

        let key = ServerKey::new("GOOGLE_DNS");
        assert!(registry.remove(&key).is_err());
        assert!(registry.contains("GOOGLE_DNS"));
        assert!(registry.reset().is_err());
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_edit_keeps_key() {
        let mut registry = Registry::load(MemoryStore::new()).unwrap();
        let spec = registry.create(&google(), Protocol::Plain).unwrap();

        let renamed = ServerInput::new("Google Primary").endpoint("8.8.8.8");
        let edited = registry
            .edit(&spec.key, &renamed, Protocol::Plain)
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(edited.key, "GOOGLE_DNS");
        assert_eq!(edited.name, "Google Primary");
        assert_eq!(registry.get("GOOGLE_DNS").unwrap().endpoints, vec!["8.8.8.8"]);
        assert!(registry.get("GOOGLE_PRIMARY").is_none());
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let mut registry = Registry::load(MemoryStore::with_defaults()).unwrap();
        let before = registry.list().to_vec();
        let ghost = ServerKey::new("NOPE");

        assert!(registry.remove(&ghost).unwrap().is_not_found());
        assert!(registry
            .edit(&ghost, &google(), Protocol::Plain)
            .unwrap()
            .is_not_found());
        let mut spec = before[0].clone();
        spec.key = ghost;
        assert!(registry.update(spec).unwrap().is_not_found());
        assert_eq!(registry.list(), before.as_slice());
    }

    #[test]
    fn test_filter_and_reset() {
        let mut registry = Registry::load(MemoryStore::new()).unwrap();
        registry.create(&google(), Protocol::Plain).unwrap();
        registry.reset().unwrap();
        assert_eq!(registry.list(), default_servers().as_slice());

        let doq: Vec<_> = registry.filter(Protocol::Doq).map(|s| s.key.as_str()).collect();
        assert_eq!(doq, ["CLOUDFLARE_DOQ", "QUAD9_DOQ", "ADGUARD_DOQ", "CONTROLD_DOQ"]);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut registry = Registry::load(MemoryStore::with_defaults()).unwrap();
        let removed = registry
            .remove(&ServerKey::new("CLOUDFLARE_DOH"))
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(removed.protocol, Protocol::Doh);
        assert_eq!(registry.list()[0].key, "CLOUDFLARE_DNS");
        assert_eq!(registry.list()[1].key, "CLOUDFLARE_DOT");
        assert_eq!(registry.store().servers().len(), 25);
    }
}
