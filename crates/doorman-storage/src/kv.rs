use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};

/// Namespaced key-value store with single-key write atomicity.
///
/// This trait defines the contract of the durable store behind the
/// persistence writer. A `put` either replaces the whole value of one key or
/// leaves it untouched; nothing is promised across keys.
///
/// # Implementation Note
///
/// Methods return `Send` futures so generic callers (the persistence writer,
/// the access coordinator) can run inside spawned Tokio tasks.
pub trait KvStore: Send + Sync {
    /// Read the raw bytes stored under `key`.
    fn get_bytes(
        &self,
        namespace: &str,
        key: &str,
    ) -> impl Future<Output = StorageResult<Option<Vec<u8>>>> + Send;

    /// Replace the bytes stored under `key`.
    fn put_bytes(
        &self,
        namespace: &str,
        key: &str,
        value: &[u8],
    ) -> impl Future<Output = StorageResult<()>> + Send;

    /// Read a single-byte counter, or `default` if the key is absent.
    fn get_u8(
        &self,
        namespace: &str,
        key: &str,
        default: u8,
    ) -> impl Future<Output = StorageResult<u8>> + Send {
        async move {
            match self.get_bytes(namespace, key).await? {
                None => Ok(default),
                Some(bytes) => match bytes.as_slice() {
                    [value] => Ok(*value),
                    other => Err(StorageError::corrupt(
                        key,
                        format!("expected 1 byte counter, got {} bytes", other.len()),
                    )),
                },
            }
        }
    }

    /// Write a single-byte counter.
    fn put_u8(
        &self,
        namespace: &str,
        key: &str,
        value: u8,
    ) -> impl Future<Output = StorageResult<()>> + Send {
        async move { self.put_bytes(namespace, key, &[value]).await }
    }
}

type Entries = HashMap<(String, String), Vec<u8>>;

/// In-memory key-value store
///
/// Clones share the same entries, so a test can keep a handle while the
/// persistence writer owns another. Writes can be made to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<Entries>>,
    failing_puts: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail with [`StorageError::Injected`].
    pub fn fail_next_puts(&self, count: usize) {
        self.failing_puts.store(count, Ordering::SeqCst);
    }

    /// Delete a key, simulating a record lost to a partial write.
    pub async fn remove(&self, namespace: &str, key: &str) -> Option<Vec<u8>> {
        self.entries
            .write()
            .await
            .remove(&(namespace.to_string(), key.to_string()))
    }

    /// Number of keys stored in `namespace`.
    pub async fn len(&self, namespace: &str) -> usize {
        self.entries
            .read()
            .await
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .count()
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_puts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl KvStore for MemoryStore {
    async fn get_bytes(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn put_bytes(&self, namespace: &str, key: &str, value: &[u8]) -> StorageResult<()> {
        if self.take_injected_failure() {
            return Err(StorageError::Injected(format!("put {namespace}/{key}")));
        }

        self.entries
            .write()
            .await
            .insert((namespace.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }
}
