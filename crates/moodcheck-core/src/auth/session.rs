use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use super::storage::{FileStorage, KeyringStorage, MemoryStorage, StorageKind, TokenStorage, TOKEN_KEY};

/// Bearer token proving identity to the backend. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, rejecting empty or whitespace-only strings.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(<{} chars>)", self.0.len())
    }
}

/// The single persisted credential slot.
///
/// Clone is cheap; clones share the same backend.
#[derive(Clone)]
pub struct SessionStore {
    storage: Option<Arc<dyn TokenStorage>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// Open the configured backend. File storage needs a data directory;
    /// without one the store is unavailable.
    pub fn open(kind: StorageKind, data_dir: Option<PathBuf>) -> Self {
        match kind {
            StorageKind::Keyring => Self::new(Arc::new(KeyringStorage)),
            StorageKind::File => match data_dir {
                Some(dir) => Self::new(Arc::new(FileStorage::new(&dir))),
                None => {
                    warn!("No data directory available, session will not be persisted");
                    Self::unavailable()
                }
            },
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::default()))
    }

    /// A store with no backing storage: reads find nothing, saves fail.
    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    /// Store the credential, replacing any previous one.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| anyhow!("Session storage is unavailable"))?;
        storage.set(TOKEN_KEY, credential.as_str())?;
        debug!("Credential saved");
        Ok(())
    }

    /// The stored credential, if any. Storage errors read as "no credential".
    pub fn read(&self) -> Option<Credential> {
        let storage = self.storage.as_ref()?;
        match storage.get(TOKEN_KEY) {
            Ok(token) => token.and_then(Credential::new),
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        }
    }

    /// Remove the stored credential. Clearing an empty slot is a no-op.
    pub fn clear(&self) -> Result<()> {
        if let Some(ref storage) = self.storage {
            storage.remove(TOKEN_KEY)?;
            debug!("Credential cleared");
        }
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }
}
