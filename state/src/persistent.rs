//! Persistent state store using sled database

use adrail_core::{AdrailError, AdrailResult, StateChange, StateMutator, StateProvider, StateVersion};
use async_trait::async_trait;
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;

use crate::memory::MemoryStateStore;
use crate::store::StateStore;

const STATE_TREE: &str = "state";
const META_TREE: &str = "meta";
const VERSION_KEY: &[u8] = b"version";

fn storage_err(e: impl std::fmt::Display) -> AdrailError {
    AdrailError::StorageError(e.to_string())
}

/// Persistent state store backed by sled database
pub struct PersistentStateStore {
    db: Db,
    state: Tree,
    meta: Tree,
    version: RwLock<StateVersion>,
}

impl PersistentStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> AdrailResult<Self> {
        let db = sled::open(path).map_err(storage_err)?;

        let state = db.open_tree(STATE_TREE).map_err(storage_err)?;
        let meta = db.open_tree(META_TREE).map_err(storage_err)?;

        // Load version from disk or start at 0
        let version = match meta.get(VERSION_KEY).map_err(storage_err)? {
            Some(bytes) => {
                let v = u64::from_le_bytes(bytes.as_ref().try_into().unwrap_or([0; 8]));
                StateVersion::new(v)
            }
            None => StateVersion::new(0),
        };

        Ok(Self {
            db,
            state,
            meta,
            version: RwLock::new(version),
        })
    }

    /// Copy all entries into a memory store (consistent point-in-time view)
    fn copy_to_memory(&self) -> AdrailResult<MemoryStateStore> {
        let mut data = Vec::new();
        for result in self.state.iter() {
            let (key, value) = result.map_err(storage_err)?;
            data.push((key.to_vec(), value.to_vec()));
        }
        Ok(MemoryStateStore::with_data(data))
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

#[async_trait]
impl StateProvider for PersistentStateStore {
    async fn version(&self) -> StateVersion {
        *self.version.read()
    }

    async fn get(&self, key: &[u8]) -> AdrailResult<Option<Vec<u8>>> {
        self.state
            .get(key)
            .map(|opt| opt.map(|v| v.to_vec()))
            .map_err(storage_err)
    }

    async fn exists(&self, key: &[u8]) -> AdrailResult<bool> {
        self.state.contains_key(key).map_err(storage_err)
    }
}

#[async_trait]
impl StateMutator for PersistentStateStore {
    async fn set(&self, key: &[u8], value: &[u8]) -> AdrailResult<()> {
        self.state.insert(key, value).map_err(storage_err)?;
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> AdrailResult<()> {
        self.state.remove(key).map_err(storage_err)?;
        Ok(())
    }

    async fn apply_batch(&self, changes: Vec<StateChange>) -> AdrailResult<StateVersion> {
        let mut version = self.version.write();
        let new_version = version.next();

        // Atomic write of the whole batch
        let mut batch = sled::Batch::default();
        for change in changes {
            match change {
                StateChange::Set { key, value } => {
                    batch.insert(key.as_slice(), value.as_slice());
                }
                StateChange::Delete { key } => {
                    batch.remove(key.as_slice());
                }
            }
        }
        self.state.apply_batch(batch).map_err(storage_err)?;

        self.meta
            .insert(VERSION_KEY, &new_version.0.to_le_bytes())
            .map_err(storage_err)?;

        self.db.flush().map_err(storage_err)?;

        *version = new_version;
        Ok(new_version)
    }
}

#[async_trait]
impl StateStore for PersistentStateStore {
    async fn snapshot(&self) -> AdrailResult<Box<dyn StateStore>> {
        Ok(Box::new(self.copy_to_memory()?))
    }
}

/// Thread-safe persistent store wrapper
pub type SharedPersistentStateStore = Arc<PersistentStateStore>;

/// Create a shared persistent state store
pub fn create_persistent_store<P: AsRef<Path>>(
    path: P,
) -> AdrailResult<SharedPersistentStateStore> {
    Ok(Arc::new(PersistentStateStore::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persistent_store_basic() {
        let tmp = TempDir::new().unwrap();
        let store = PersistentStateStore::open(tmp.path()).unwrap();

        store.set(b"key1", b"value1").await.unwrap();
        let value = store.get(b"key1").await.unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));

        store.delete(b"key1").await.unwrap();
        let value = store.get(b"key1").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_persistent_store_reopen() {
        let tmp = TempDir::new().unwrap();

        // Write data
        {
            let store = PersistentStateStore::open(tmp.path()).unwrap();
            let changes = vec![StateChange::set(b"k1".to_vec(), b"v1".to_vec())];
            store.apply_batch(changes).await.unwrap();
        }

        // Reopen and verify
        {
            let store = PersistentStateStore::open(tmp.path()).unwrap();
            assert_eq!(store.get(b"k1").await.unwrap(), Some(b"v1".to_vec()));
            assert_eq!(store.version().await.0, 1);
        }
    }

    #[tokio::test]
    async fn test_persistent_store_snapshot() {
        let tmp = TempDir::new().unwrap();
        let store = PersistentStateStore::open(tmp.path()).unwrap();

        store.set(b"k", b"v1").await.unwrap();
        let snap = store.snapshot().await.unwrap();
        store.set(b"k", b"v2").await.unwrap();

        assert_eq!(snap.get(b"k").await.unwrap(), Some(b"v1".to_vec()));
    }
}
