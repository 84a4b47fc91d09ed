//! Secret storage capability

use zeroize::Zeroizing;

use fwgate_core::{Result, VaultEntry};

/// Supplies the vault password when a store needs one
///
/// Called lazily: only when the store is about to decrypt or encrypt.
pub trait PasswordSource: Send + Sync {
    fn vault_password(&self) -> Result<Zeroizing<String>>;
}

/// Keyed storage of [`VaultEntry`] values
///
/// Implementations decide whether a password is needed for an operation.
pub trait SecretStore: Send + Sync {
    /// Human-readable location, used in prompts and log messages
    fn location(&self) -> String;

    /// Whether the backing storage has been created yet
    fn exists(&self) -> bool;

    /// Fetch one entry; `Error::NotFound` when absent
    fn get(&self, name: &str, password: &dyn PasswordSource) -> Result<VaultEntry>;

    /// Insert or replace one entry
    fn set(&self, entry: &VaultEntry, password: &dyn PasswordSource) -> Result<()>;
}
