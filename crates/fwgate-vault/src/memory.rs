//! Process-local secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use fwgate_core::{Error, Result, VaultEntry};

use crate::store::{PasswordSource, SecretStore};

/// Unencrypted store kept in memory, never asks for a password
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    entries: RwLock<HashMap<String, VaultEntry>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl SecretStore for InMemorySecretStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn exists(&self) -> bool {
        !self.is_empty()
    }

    fn get(&self, name: &str, _password: &dyn PasswordSource) -> Result<VaultEntry> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("vault entry {}", name)))
    }

    fn set(&self, entry: &VaultEntry, _password: &dyn PasswordSource) -> Result<()> {
        self.entries.write().insert(entry.key.clone(), entry.clone());
        Ok(())
    }
}
