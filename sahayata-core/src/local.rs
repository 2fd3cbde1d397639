//! Client-local key-value state
//!
//! Everything the client keeps between page loads (the cached identity and
//! one draft per form) goes through [`LocalState`]. Values are wrapped in a
//! small version envelope; anything with a different version or that fails
//! to decode reads as absent.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::forms::{FormKind, FormValues};
use crate::identity::CachedIdentity;

/// Current envelope version
pub const STATE_VERSION: u32 = 1;

/// Key of the cached identity record
pub const IDENTITY_KEY: &str = "e-sahayata-user";

/// Raw string storage, the equivalent of browser local storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        (**self).remove(key)
    }
}

/// Store held in process memory
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries
            .write()
            .map_err(|e| Error::Storage(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries
            .write()
            .map_err(|e| Error::Storage(e.to_string()))?
            .remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object on disk
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| Error::Storage(e.to_string()))?;
            serde_json::from_str(&contents)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents).map_err(|e| Error::Storage(e.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Storage(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Storage(e.to_string()))?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Typed access to the client-local state
#[derive(Clone)]
pub struct LocalState {
    store: Arc<dyn KeyValueStore>,
}

impl LocalState {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) if envelope.version == STATE_VERSION => Ok(Some(envelope.data)),
            Ok(envelope) => {
                tracing::warn!(key, version = envelope.version, "Ignoring stored value with unknown version");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring undecodable stored value");
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, data: &T) -> Result<(), Error> {
        let raw = serde_json::to_string(&Envelope {
            version: STATE_VERSION,
            data,
        })?;
        self.store.set(key, &raw)
    }

    pub fn identity(&self) -> Result<Option<CachedIdentity>, Error> {
        self.read(IDENTITY_KEY)
    }

    pub fn set_identity(&self, identity: &CachedIdentity) -> Result<(), Error> {
        self.write(IDENTITY_KEY, identity)
    }

    pub fn clear_identity(&self) -> Result<(), Error> {
        self.store.remove(IDENTITY_KEY)
    }

    /// Stored draft for a form, as raw JSON (decoded by the form's spec)
    pub fn draft(&self, form: FormKind) -> Result<Option<Value>, Error> {
        self.read(&form.draft_key())
    }

    /// Overwrite the draft for a form
    pub fn save_draft(&self, form: FormKind, values: &FormValues) -> Result<(), Error> {
        self.write(&form.draft_key(), values)
    }

    pub fn clear_draft(&self, form: FormKind) -> Result<(), Error> {
        self.store.remove(&form.draft_key())
    }
}
