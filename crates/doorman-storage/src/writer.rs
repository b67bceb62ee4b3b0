//! Single-consumer persistence pipeline.
//!
//! Every durable write goes through one [`PersistenceWriter`], so the
//! `"users"` and `"events"` counters can never be raced by two writers.
//! Producers hold a cloneable [`PersistenceQueue`].
//!
//! ```text
//! console ──┐  enqueue (try_send, cap 10)          ┌──────────────────┐
//!           ├──────────────────────────────────────►│ PersistenceWriter │──► KvStore
//! network ──┘  signal  (Notify, single permit) ────►│  wait, then drain │
//!                                                   └──────────────────┘
//! ```
//!
//! # Wake semantics
//!
//! The wake signal is binary: any number of `signal()` calls made before the
//! writer waits collapse into one wake-up. Each wake drains the queue until it
//! is empty, so no intent is left behind by a collapsed signal.
//!
//! # Shutdown
//!
//! When the last queue handle is dropped the writer is woken one final time,
//! drains whatever is left and returns from [`PersistenceWriter::run`].

use std::sync::Arc;

use doorman_core::constants::{MAX_EVENTS, MAX_USERS, WRITE_QUEUE_CAPACITY};
use doorman_core::{Error, Result};
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, error, info};

use crate::error::{StorageError, StorageResult};
use crate::intent::WriteIntent;
use crate::kv::KvStore;
use crate::schema::{
    EVENT_COUNT_KEY, EVENTS_NAMESPACE, USER_COUNT_KEY, USERS_NAMESPACE, encode_event, encode_user,
    event_key, user_key,
};

/// Wakes the writer when the last queue handle goes away.
#[derive(Debug)]
struct WakeOnDrop(Arc<Notify>);

impl Drop for WakeOnDrop {
    fn drop(&mut self) {
        self.0.notify_one();
    }
}

/// Producer handle of the persistence pipeline.
///
/// Cheap to clone; every clone feeds the same writer.
#[derive(Debug, Clone)]
pub struct PersistenceQueue {
    intents_tx: mpsc::Sender<WriteIntent>,
    wake: Arc<Notify>,
    // Declared last so the sender is already gone when the final wake fires.
    _closer: Arc<WakeOnDrop>,
}

impl PersistenceQueue {
    /// Append an intent without waiting for space.
    ///
    /// # Errors
    ///
    /// - `Error::QueueFull` if the queue already holds its capacity of intents
    /// - `Error::StorageIo` if the writer has stopped
    pub fn enqueue(&self, intent: WriteIntent) -> Result<()> {
        self.intents_tx.try_send(intent).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull {
                capacity: WRITE_QUEUE_CAPACITY,
            },
            TrySendError::Closed(_) => {
                Error::StorageIo("persistence writer has stopped".to_string())
            }
        })
    }

    /// Wake the writer so it drains the queue.
    pub fn signal(&self) {
        self.wake.notify_one();
    }

    /// Enqueue an intent and wake the writer.
    ///
    /// # Errors
    ///
    /// Same as [`enqueue`](Self::enqueue); the writer is not woken on failure.
    pub fn submit(&self, intent: impl Into<WriteIntent>) -> Result<()> {
        self.enqueue(intent.into())?;
        self.signal();
        Ok(())
    }

    /// Number of intents waiting to be drained.
    pub fn pending(&self) -> usize {
        self.intents_tx.max_capacity() - self.intents_tx.capacity()
    }
}

/// Result of one drain cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Intents written to the store.
    pub persisted: usize,

    /// Intents dropped after a storage failure.
    pub failed: usize,

    /// Every queue handle is gone; no more intents can arrive.
    pub closed: bool,
}

/// The sole writer to the `"users"` and `"events"` namespaces.
#[derive(Debug)]
pub struct PersistenceWriter<S> {
    store: S,
    intents_rx: mpsc::Receiver<WriteIntent>,
    wake: Arc<Notify>,
}

impl<S: KvStore> PersistenceWriter<S> {
    /// Create a writer over `store` and the queue that feeds it.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorman_core::User;
    /// use doorman_storage::{MemoryStore, PersistenceWriter, WriteIntent};
    ///
    /// #[tokio::main]
    /// async fn main() -> doorman_core::Result<()> {
    ///     let (mut writer, queue) = PersistenceWriter::new(MemoryStore::new());
    ///
    ///     queue.enqueue(WriteIntent::User(User::new("alice", "pw1", false)?))?;
    ///     let report = writer.drain().await;
    ///     assert_eq!(report.persisted, 1);
    ///     Ok(())
    /// }
    /// ```
    pub fn new(store: S) -> (Self, PersistenceQueue) {
        let (intents_tx, intents_rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let wake = Arc::new(Notify::new());

        let writer = Self {
            store,
            intents_rx,
            wake: wake.clone(),
        };

        let queue = PersistenceQueue {
            intents_tx,
            wake: wake.clone(),
            _closer: Arc::new(WakeOnDrop(wake)),
        };

        (writer, queue)
    }

    /// Drain loop: wait for a wake signal, then empty the queue.
    ///
    /// Returns once every [`PersistenceQueue`] has been dropped and the final
    /// drain is done. Storage failures never end the loop.
    pub async fn run(mut self) {
        info!("Persistence writer started");

        loop {
            self.wake.notified().await;

            let report = self.drain().await;
            debug!(
                "Drain cycle finished: {} persisted, {} failed",
                report.persisted, report.failed
            );

            if report.closed {
                info!("Persistence writer stopped");
                return;
            }
        }
    }

    /// Pop and persist every queued intent without waiting.
    pub async fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();

        loop {
            let intent = match self.intents_rx.try_recv() {
                Ok(intent) => intent,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    report.closed = true;
                    break;
                }
            };

            match persist(&self.store, &intent).await {
                Ok(index) => {
                    debug!("Persisted {} record #{}", intent.kind(), index);
                    report.persisted += 1;
                }
                Err(e) => {
                    error!("Dropping {} intent after storage failure: {}", intent.kind(), e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

/// Write one record, then advance its counter.
///
/// The counter is written only after the record write succeeded, so a crash
/// in between leaves "record written, counter stale", which recovery adopts.
async fn persist<S: KvStore>(store: &S, intent: &WriteIntent) -> StorageResult<usize> {
    match intent {
        WriteIntent::User(user) => {
            let count = store.get_u8(USERS_NAMESPACE, USER_COUNT_KEY, 0).await?;
            let index = usize::from(count);
            if index >= MAX_USERS {
                return Err(StorageError::Full {
                    namespace: USERS_NAMESPACE,
                    capacity: MAX_USERS,
                });
            }

            store
                .put_bytes(USERS_NAMESPACE, &user_key(index), &encode_user(user))
                .await?;
            store
                .put_u8(USERS_NAMESPACE, USER_COUNT_KEY, count + 1)
                .await?;
            Ok(index)
        }
        WriteIntent::Event(event) => {
            let count = store.get_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, 0).await?;
            let index = usize::from(count);
            if index >= MAX_EVENTS {
                return Err(StorageError::Full {
                    namespace: EVENTS_NAMESPACE,
                    capacity: MAX_EVENTS,
                });
            }

            store
                .put_bytes(EVENTS_NAMESPACE, &event_key(index), &encode_event(event))
                .await?;
            store
                .put_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, count + 1)
                .await?;
            Ok(index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::schema::decode_user;
    use doorman_core::{DoorId, Event, User, UserName};

    fn user(name: &str) -> WriteIntent {
        WriteIntent::User(User::new(name, "pw", false).unwrap())
    }

    fn event(name: &str, door: DoorId) -> WriteIntent {
        WriteIntent::Event(Event::new(UserName::new(name).unwrap(), door))
    }

    #[tokio::test]
    async fn test_queue_full_after_capacity() {
        let (mut writer, queue) = PersistenceWriter::new(MemoryStore::new());

        for i in 0..WRITE_QUEUE_CAPACITY {
            queue.enqueue(event(&format!("u{i}"), DoorId::ONE)).unwrap();
        }
        assert_eq!(queue.pending(), WRITE_QUEUE_CAPACITY);
        assert!(matches!(
            queue.enqueue(event("extra", DoorId::ONE)),
            Err(Error::QueueFull { capacity: 10 })
        ));

        let report = writer.drain().await;
        assert_eq!(report.persisted, WRITE_QUEUE_CAPACITY);
        assert_eq!(queue.pending(), 0);
        assert!(queue.enqueue(event("again", DoorId::ONE)).is_ok());
    }

    #[tokio::test]
    async fn test_user_record_then_counter() {
        let store = MemoryStore::new();
        let (mut writer, queue) = PersistenceWriter::new(store.clone());

        queue.enqueue(user("alice")).unwrap();
        queue.enqueue(user("bob")).unwrap();
        writer.drain().await;

        assert_eq!(store.get_u8(USERS_NAMESPACE, USER_COUNT_KEY, 0).await.unwrap(), 2);
        let bytes = store
            .get_bytes(USERS_NAMESPACE, "user_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decode_user("user_1", &bytes).unwrap().name.as_str(), "bob");
    }

    #[tokio::test]
    async fn test_failed_record_write_keeps_counter() {
        let store = MemoryStore::new();
        let (mut writer, queue) = PersistenceWriter::new(store.clone());

        store.fail_next_puts(1);
        queue.enqueue(user("lost")).unwrap();
        queue.enqueue(user("kept")).unwrap();

        let report = writer.drain().await;
        assert_eq!(report.persisted, 1);
        assert_eq!(report.failed, 1);

        // The surviving user takes slot 0; the failed one left no trace.
        assert_eq!(store.get_u8(USERS_NAMESPACE, USER_COUNT_KEY, 0).await.unwrap(), 1);
        let bytes = store.get_bytes(USERS_NAMESPACE, "user_0").await.unwrap().unwrap();
        assert_eq!(decode_user("user_0", &bytes).unwrap().name.as_str(), "kept");
    }

    #[tokio::test]
    async fn test_user_namespace_ceiling() {
        let store = MemoryStore::new();
        store
            .put_u8(USERS_NAMESPACE, USER_COUNT_KEY, MAX_USERS as u8)
            .await
            .unwrap();
        let (mut writer, queue) = PersistenceWriter::new(store.clone());

        queue.enqueue(user("eleventh")).unwrap();
        let report = writer.drain().await;

        assert_eq!(report.failed, 1);
        assert_eq!(store.len(USERS_NAMESPACE).await, 1);
    }

    #[tokio::test]
    async fn test_event_counter_does_not_wrap() {
        let store = MemoryStore::new();
        store
            .put_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, u8::MAX)
            .await
            .unwrap();
        let (mut writer, queue) = PersistenceWriter::new(store.clone());

        queue.enqueue(event("late", DoorId::TWO)).unwrap();
        assert_eq!(writer.drain().await.failed, 1);
        assert_eq!(
            store.get_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, 0).await.unwrap(),
            u8::MAX
        );
    }

    #[tokio::test]
    async fn test_signals_collapse_into_one_wake() {
        let store = MemoryStore::new();
        let (writer, queue) = PersistenceWriter::new(store.clone());

        for name in ["a", "b", "c"] {
            queue.enqueue(event(name, DoorId::ONE)).unwrap();
            queue.signal();
        }

        let task = tokio::spawn(writer.run());
        drop(queue);
        task.await.unwrap();

        assert_eq!(
            store.get_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, 0).await.unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn test_enqueue_after_writer_stopped() {
        let (writer, queue) = PersistenceWriter::new(MemoryStore::new());
        drop(writer);

        assert!(matches!(
            queue.enqueue(user("nobody")),
            Err(Error::StorageIo(_))
        ));
    }
}
