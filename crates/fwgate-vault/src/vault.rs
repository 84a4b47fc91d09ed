//! Credential vault with a lazily prompted, process-wide password

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use fwgate_core::{CredentialPrompt, Credentials, Error, Result, VaultEntry};

use crate::file::FileSecretStore;
use crate::kdf::KdfParams;
use crate::store::{PasswordSource, SecretStore};

/// Entry name the portal credentials are stored under
pub const VAULT_NAME: &str = "fwgate-dev-portal";

/// File name of the vault inside the fwgate home directory
pub const VAULT_FILE_NAME: &str = "fwgate-vault";

const ENTRY_LABEL: &str = "fwgate";
const ENTRY_DESCRIPTION: &str = "application password";

/// `~/.fwgate/fwgate-vault`
pub fn default_vault_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fwgate")
        .join(VAULT_FILE_NAME)
}

/// Vault location and unlocking options
#[derive(Clone)]
pub struct VaultConfig {
    pub path: PathBuf,
    /// Known password; skips the interactive prompt entirely
    pub password: Option<Zeroizing<String>>,
    pub kdf: KdfParams,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: default_vault_path(),
            password: None,
            kdf: KdfParams::default(),
        }
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("path", &self.path)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("kdf", &self.kdf)
            .finish()
    }
}

impl VaultConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }
}

/// Stores and retrieves the developer-portal credentials
///
/// The password is requested from the prompt only when a decrypt or encrypt
/// actually happens, and then cached for the lifetime of the vault. The
/// cache lock is held across the prompt so concurrent callers wait for the
/// first answer instead of prompting again.
pub struct CredentialVault {
    store: Arc<dyn SecretStore>,
    prompt: Option<Arc<dyn CredentialPrompt>>,
    password: Mutex<Option<Zeroizing<String>>>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("store", &self.store.location())
            .field("unlocked", &self.password.lock().is_some())
            .finish()
    }
}

impl CredentialVault {
    /// Open the file vault described by `config`
    ///
    /// Neither prompts nor touches the file; that happens on first use.
    pub fn open(config: VaultConfig, prompt: Option<Arc<dyn CredentialPrompt>>) -> Result<Self> {
        if config.path.as_os_str().is_empty() {
            return Err(Error::Config("vault path is empty".into()));
        }
        let store = FileSecretStore::with_kdf(config.path, config.kdf);
        Ok(Self::with_store(Arc::new(store), prompt, config.password))
    }

    /// Vault over an arbitrary secret store
    pub fn with_store(
        store: Arc<dyn SecretStore>,
        prompt: Option<Arc<dyn CredentialPrompt>>,
        password: Option<Zeroizing<String>>,
    ) -> Self {
        Self {
            store,
            prompt,
            password: Mutex::new(password),
        }
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Fetch one entry
    #[instrument(skip(self))]
    pub fn get(&self, name: &str) -> Result<VaultEntry> {
        let result = self.store.get(name, &VaultPassword(self));
        self.forget_on_decrypt_failure(result)
    }

    /// Insert or replace one entry
    #[instrument(skip(self, entry), fields(key = %entry.key))]
    pub fn set(&self, entry: &VaultEntry) -> Result<()> {
        let result = self.store.set(entry, &VaultPassword(self));
        self.forget_on_decrypt_failure(result)
    }

    /// Credentials stored under [`VAULT_NAME`]
    pub fn load_credentials(&self) -> Result<Credentials> {
        let entry = self.get(VAULT_NAME)?;
        Credentials::from_bytes(&entry.data)
    }

    /// Save credentials; failures are logged and otherwise ignored
    pub fn store_credentials(&self, credentials: &Credentials) {
        let stored = credentials.to_bytes().and_then(|data| {
            let entry = VaultEntry::new(VAULT_NAME, data)
                .with_label(ENTRY_LABEL)
                .with_description(ENTRY_DESCRIPTION);
            self.set(&entry)
        });

        match stored {
            Ok(()) => debug!(vault = %self.store.location(), "Credentials saved"),
            Err(e) => warn!(vault = %self.store.location(), "Failed to save credentials to vault: {}", e),
        }
    }

    fn forget_on_decrypt_failure<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(Error::Decrypt(_)) = &result {
            *self.password.lock() = None;
        }
        result
    }

    fn acquire_password(&self) -> Result<Zeroizing<String>> {
        let mut cached = self.password.lock();
        if let Some(password) = cached.as_ref() {
            return Ok(password.clone());
        }

        let prompt = self
            .prompt
            .as_ref()
            .ok_or_else(|| Error::Config("vault password required but no prompt is available".into()))?;

        let message = if self.store.exists() {
            format!(
                "Enter a password to decrypt your credentials vault: {}",
                self.store.location()
            )
        } else {
            format!(
                "Enter a password to encrypt your credentials to vault: {}",
                self.store.location()
            )
        };

        let password = Zeroizing::new(prompt.password(&message)?.into_result()?);
        *cached = Some(password.clone());
        Ok(password)
    }
}

struct VaultPassword<'a>(&'a CredentialVault);

impl PasswordSource for VaultPassword<'_> {
    fn vault_password(&self) -> Result<Zeroizing<String>> {
        self.0.acquire_password()
    }
}
