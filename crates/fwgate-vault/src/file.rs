//! Password-encrypted single-file secret store
//!
//! On disk the vault is a JSON envelope:
//!
//! ```json
//! {"version": 1, "kdf": {"m_cost": 65536, "t_cost": 3, "p_cost": 4},
//!  "salt": "<hex>", "nonce": "<hex>", "ciphertext": "<hex>"}
//! ```
//!
//! The plaintext is a JSON object mapping entry names to [`VaultEntry`]
//! values. Every write re-encrypts the whole map with a fresh salt and nonce.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use fwgate_core::{Error, Result, VaultEntry};

use crate::kdf::KdfParams;
use crate::store::{PasswordSource, SecretStore};

const ENVELOPE_VERSION: u32 = 1;
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 24;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    kdf: KdfParams,
    salt: String,
    nonce: String,
    ciphertext: String,
}

type EntryMap = BTreeMap<String, VaultEntry>;

/// Vault file encrypted with Argon2id + XChaCha20-Poly1305
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
    kdf: KdfParams,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_kdf(path, KdfParams::default())
    }

    /// Store with explicit key-derivation cost for newly written files
    ///
    /// Existing files are always opened with the parameters recorded in them.
    pub fn with_kdf(path: impl Into<PathBuf>, kdf: KdfParams) -> Self {
        Self {
            path: path.into(),
            kdf,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_envelope(&self) -> Result<Envelope> {
        let raw = std::fs::read(&self.path)?;
        serde_json::from_slice(&raw)
            .map_err(|e| Error::Decrypt(format!("corrupt vault file {}: {}", self.path.display(), e)))
    }

    fn decrypt(&self, envelope: &Envelope, password: &str) -> Result<EntryMap> {
        if envelope.version != ENVELOPE_VERSION {
            return Err(Error::Decrypt(format!(
                "unsupported vault version {}",
                envelope.version
            )));
        }

        let salt = decode_hex("salt", &envelope.salt)?;
        let nonce = decode_hex("nonce", &envelope.nonce)?;
        let ciphertext = decode_hex("ciphertext", &envelope.ciphertext)?;
        if nonce.len() != NONCE_LEN {
            return Err(Error::Decrypt("invalid nonce length".into()));
        }

        let key = envelope.kdf.derive_key(password, &salt)?;
        let cipher = XChaCha20Poly1305::new_from_slice(&key[..])
            .map_err(|_| Error::Decrypt("invalid key length".into()))?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(XNonce::from_slice(&nonce), ciphertext.as_slice())
                .map_err(|_| Error::Decrypt("wrong password or corrupt vault".into()))?,
        );

        serde_json::from_slice(&plaintext)
            .map_err(|e| Error::Decrypt(format!("corrupt vault contents: {}", e)))
    }

    fn encrypt(&self, entries: &EntryMap, password: &str) -> Result<Envelope> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce);

        let plaintext = Zeroizing::new(serde_json::to_vec(entries)?);
        let key = self.kdf.derive_key(password, &salt)?;
        let cipher = XChaCha20Poly1305::new_from_slice(&key[..])
            .map_err(|_| Error::Config("invalid key length".into()))?;
        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| Error::Config("vault encryption failed".into()))?;

        Ok(Envelope {
            version: ENVELOPE_VERSION,
            kdf: self.kdf,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce),
            ciphertext: hex::encode(ciphertext),
        })
    }

    fn write_envelope(&self, envelope: &Envelope) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, envelope)?;
        tmp.flush()?;

        // NamedTempFile is created 0600 on unix
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_err(|e| Error::Decrypt(format!("invalid {} encoding: {}", field, e)))
}

impl SecretStore for FileSecretStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    #[instrument(skip(self, password), fields(path = %self.path.display()))]
    fn get(&self, name: &str, password: &dyn PasswordSource) -> Result<VaultEntry> {
        if !self.exists() {
            return Err(Error::NotFound(format!(
                "vault {} does not exist",
                self.path.display()
            )));
        }

        let envelope = self.read_envelope()?;
        let password = password.vault_password()?;
        let mut entries = self.decrypt(&envelope, &password)?;

        debug!(entries = entries.len(), "Vault decrypted");
        entries
            .remove(name)
            .ok_or_else(|| Error::NotFound(format!("vault entry {}", name)))
    }

    #[instrument(skip(self, entry, password), fields(path = %self.path.display(), key = %entry.key))]
    fn set(&self, entry: &VaultEntry, password: &dyn PasswordSource) -> Result<()> {
        let existing = if self.exists() {
            Some(self.read_envelope()?)
        } else {
            None
        };
        let password = password.vault_password()?;

        let mut entries = match existing {
            Some(envelope) => self.decrypt(&envelope, &password)?,
            None => EntryMap::new(),
        };
        entries.insert(entry.key.clone(), entry.clone());

        let envelope = self.encrypt(&entries, &password)?;
        self.write_envelope(&envelope)?;

        debug!(entries = entries.len(), "Vault written");
        Ok(())
    }
}
