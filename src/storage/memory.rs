//! In-process key-value slots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{KeyValueStore, StorageError};

/// Key-value store living in process memory. Clones share the same slots.
#[derive(Clone, Debug, Default)]
pub struct MemoryKv {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under `key`, bypassing the `KeyValueStore` error surface.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.lock().ok()?.get(key).cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().map_or(true, |slots| slots.is_empty())
    }
}

fn poisoned() -> StorageError {
    StorageError::Io(std::io::Error::other("memory store lock poisoned"))
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().map_err(|_| poisoned())?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| poisoned())?;
        slots.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| poisoned())?;
        slots.remove(key);
        Ok(())
    }
}
