use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::models::UserIdentity;

/// Keychain service name
const SERVICE_NAME: &str = "paylater";

/// Fixed storage key: keychain account name and session file stem
const STORAGE_KEY: &str = "session";

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// Bearer token plus the identity it was issued for.
///
/// The token is opaque; only the service can interpret it.
#[derive(Clone)]
pub struct Credential {
    token: SecretString,
    pub identity: UserIdentity,
}

impl Credential {
    pub fn new(token: impl Into<String>, identity: UserIdentity) -> Self {
        Self {
            token: SecretString::from(token.into()),
            identity,
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// Same token, new identity snapshot
    pub fn with_identity(&self, identity: UserIdentity) -> Self {
        Self {
            token: self.token.clone(),
            identity,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[redacted]")
            .field("identity", &self.identity)
            .finish()
    }
}

/// On-disk / in-keychain representation
#[derive(Serialize, Deserialize)]
struct StoredCredential {
    token: String,
    identity: UserIdentity,
    saved_at: DateTime<Utc>,
}

impl StoredCredential {
    fn encode(credential: &Credential) -> Result<String> {
        let stored = StoredCredential {
            token: credential.token.expose_secret().to_string(),
            identity: credential.identity.clone(),
            saved_at: Utc::now(),
        };
        serde_json::to_string_pretty(&stored).context("Failed to encode credential")
    }

    fn decode(contents: &str) -> Result<Credential> {
        let stored: StoredCredential =
            serde_json::from_str(contents).context("Failed to parse stored credential")?;
        Ok(Credential::new(stored.token, stored.identity))
    }
}

/// Persistence for the single credential of this client.
///
/// Implementations may block (file or keychain I/O); [`super::Session`] calls
/// them from the blocking thread pool.
pub trait CredentialStore: Send + Sync {
    /// Write the credential, replacing any previous one
    fn save(&self, credential: &Credential) -> Result<()>;

    /// Read the credential, `None` if never saved or cleared
    fn load(&self) -> Result<Option<Credential>>;

    /// Remove the credential; clearing an empty store is not an error
    fn clear(&self) -> Result<()>;
}

/// Credential kept in a JSON file readable only by the current user.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, credential: &Credential) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let contents = StoredCredential::encode(credential)?;

        // The temp file is created 0600 and renamed over the old one, so the
        // token is never readable by others and never half-written. On error
        // it is removed when dropped.
        let mut file =
            NamedTempFile::new_in(&self.dir).context("Failed to create session file")?;
        file.write_all(contents.as_bytes())
            .context("Failed to write session file")?;
        file.as_file()
            .sync_all()
            .context("Failed to flush session file")?;
        file.persist(self.path())
            .context("Failed to replace session file")?;
        Ok(())
    }

    fn load(&self) -> Result<Option<Credential>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        StoredCredential::decode(&contents).map(Some)
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Credential kept in the OS keychain.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, STORAGE_KEY).context("Failed to create keyring entry")
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save(&self, credential: &Credential) -> Result<()> {
        let contents = StoredCredential::encode(credential)?;
        self.entry()?
            .set_password(&contents)
            .context("Failed to store credential in keychain")
    }

    fn load(&self) -> Result<Option<Credential>> {
        match self.entry()?.get_password() {
            Ok(contents) => StoredCredential::decode(&contents).map(Some),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve credential from keychain"),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

/// Credential kept only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, credential: &Credential) -> Result<()> {
        *self.slot() = Some(credential.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Credential>> {
        Ok(self.slot().clone())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}
