//! Encrypted credential vault
//!
//! Holds the developer-portal credentials in a single password-protected
//! file. The vault password is asked for lazily, the first time something
//! actually has to be decrypted or encrypted, and at most once per process.
//!
//! # Example
//!
//! ```rust,no_run
//! use fwgate_vault::{CredentialVault, VaultConfig};
//!
//! # fn run(prompt: std::sync::Arc<dyn fwgate_core::CredentialPrompt>) -> fwgate_core::Result<()> {
//! let vault = CredentialVault::open(VaultConfig::default(), Some(prompt))?;
//! let creds = vault.load_credentials()?;
//! # Ok(())
//! # }
//! ```

mod file;
mod kdf;
mod memory;
mod store;
mod vault;

pub use file::FileSecretStore;
pub use kdf::KdfParams;
pub use memory::InMemorySecretStore;
pub use store::{PasswordSource, SecretStore};
pub use vault::{default_vault_path, CredentialVault, VaultConfig, VAULT_FILE_NAME, VAULT_NAME};

pub use fwgate_core::{Error, Result};
