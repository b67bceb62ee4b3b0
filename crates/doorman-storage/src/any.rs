//! Enum wrapper for key-value store dispatch.
//!
//! [`KvStore`] methods return opaque futures, so the trait is not object-safe.
//! [`AnyKvStore`] lets the node pick a backend from configuration at runtime
//! while keeping concrete dispatch.

use crate::error::StorageResult;
use crate::kv::{KvStore, MemoryStore};
use crate::sqlite::SqliteStore;

/// Backend selected at startup.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyKvStore {
    /// Volatile store; contents are lost on exit.
    Memory(MemoryStore),

    /// SQLite file store.
    Sqlite(SqliteStore),
}

impl KvStore for AnyKvStore {
    async fn get_bytes(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match self {
            Self::Memory(store) => store.get_bytes(namespace, key).await,
            Self::Sqlite(store) => store.get_bytes(namespace, key).await,
        }
    }

    async fn put_bytes(&self, namespace: &str, key: &str, value: &[u8]) -> StorageResult<()> {
        match self {
            Self::Memory(store) => store.put_bytes(namespace, key, value).await,
            Self::Sqlite(store) => store.put_bytes(namespace, key, value).await,
        }
    }
}

impl From<MemoryStore> for AnyKvStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<SqliteStore> for AnyKvStore {
    fn from(store: SqliteStore) -> Self {
        Self::Sqlite(store)
    }
}
