//! In-memory [`KeyValueStore`].

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{KeyringError, Result};
use crate::storage::KeyValueStore;

/// A `BTreeMap` behind a lock. Durable writes are plain writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> KeyringError {
    KeyringError::StorageError("memory store lock poisoned".into())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn set_durable(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.entries.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }

    fn delete_durable(&self, key: &[u8]) -> Result<()> {
        self.delete(key)
    }

    fn iterate(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
