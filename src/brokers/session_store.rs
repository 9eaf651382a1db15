use dashmap::DashMap;

use super::broker_errors::{BrokerError, Result};
use super::broker_model::SessionKey;

/// Keyed store for opaque broker session credentials. Injected into the
/// broker providers so session caching never lives in process globals.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &SessionKey) -> Result<Option<String>>;
    fn put(&self, key: &SessionKey, session: &str) -> Result<()>;
    fn remove(&self, key: &SessionKey) -> Result<()>;
}

/// In-memory session store; sessions do not survive a restart
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &SessionKey) -> Result<Option<String>> {
        Ok(self.sessions.get(&key.to_string()).map(|s| s.clone()))
    }

    fn put(&self, key: &SessionKey, session: &str) -> Result<()> {
        self.sessions.insert(key.to_string(), session.to_string());
        Ok(())
    }

    fn remove(&self, key: &SessionKey) -> Result<()> {
        self.sessions.remove(&key.to_string());
        Ok(())
    }
}

/// Session store backed by the OS credential store
pub struct KeyringSessionStore {
    service_prefix: String,
}

impl KeyringSessionStore {
    pub fn new(service_prefix: &str) -> Self {
        Self {
            service_prefix: service_prefix.to_string(),
        }
    }

    fn entry(&self, key: &SessionKey) -> Result<keyring::Entry> {
        keyring::Entry::new(&format!("{}.{}", self.service_prefix, key), "session")
            .map_err(|e| BrokerError::SessionStore(e.to_string()))
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self, key: &SessionKey) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(session) => Ok(Some(session)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(BrokerError::SessionStore(e.to_string())),
        }
    }

    fn put(&self, key: &SessionKey, session: &str) -> Result<()> {
        self.entry(key)?
            .set_password(session)
            .map_err(|e| BrokerError::SessionStore(e.to_string()))
    }

    fn remove(&self, key: &SessionKey) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(BrokerError::SessionStore(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Institution;

    #[test]
    fn memory_store_replaces_session_on_put() {
        let store = MemorySessionStore::new();
        let key = SessionKey::new(Institution::Wealthsimple, "user@example.com");

        assert_eq!(store.get(&key).unwrap(), None);

        store.put(&key, "session-1").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("session-1"));

        // A re-login overwrites the prior session
        store.put(&key, "session-2").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("session-2"));

        store.remove(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn sessions_are_scoped_per_username() {
        let store = MemorySessionStore::new();
        let alice = SessionKey::new(Institution::Wealthsimple, "alice@example.com");
        let bob = SessionKey::new(Institution::Wealthsimple, "bob@example.com");

        store.put(&alice, "alice-session").unwrap();
        assert_eq!(store.get(&bob).unwrap(), None);
    }
}
