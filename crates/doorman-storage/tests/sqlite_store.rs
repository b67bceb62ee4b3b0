//! Integration tests for the SQLite key-value store
//!
//! These tests run the write pipeline and the recovery scan against real
//! SQLite databases, in memory and on disk.
//!
//! Run with: cargo test --package doorman-storage --test sqlite_store

use doorman_core::{DoorId, Event, User, UserName};
use doorman_storage::schema::{USER_COUNT_KEY, USERS_NAMESPACE, read_events};
use doorman_storage::{
    AnyKvStore, KvStore, PersistenceWriter, SqliteConfig, SqliteStore, WriteIntent, recover,
};

#[tokio::test]
async fn test_in_memory_store() {
    let store = SqliteStore::in_memory().await.unwrap();
    store.health_check().await.unwrap();

    assert_eq!(store.get_bytes("users", "missing").await.unwrap(), None);
    store.put_bytes("users", "k", b"v1").await.unwrap();
    store.put_bytes("users", "k", b"v2").await.unwrap();
    assert_eq!(store.get_bytes("users", "k").await.unwrap(), Some(b"v2".to_vec()));

    store.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let store = SqliteStore::in_memory().await.unwrap();

    store.migrate().await.unwrap();
    store.migrate().await.unwrap();
    store.put_u8("events", "event_count", 1).await.unwrap();

    assert_eq!(store.get_u8("events", "event_count", 0).await.unwrap(), 1);
}

#[tokio::test]
async fn test_pipeline_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("doorman.db");
    let config = SqliteConfig::new(path.to_string_lossy());

    {
        let store = SqliteStore::open(config.clone()).await.unwrap();
        let (writer, queue) = PersistenceWriter::new(AnyKvStore::from(store.clone()));
        let task = tokio::spawn(writer.run());

        queue
            .submit(WriteIntent::User(User::new("alice", "pw1", true).unwrap()))
            .unwrap();
        for door in [DoorId::ONE, DoorId::TWO] {
            queue
                .submit(WriteIntent::Event(Event::new(
                    UserName::new("alice").unwrap(),
                    door,
                )))
                .unwrap();
        }

        drop(queue);
        task.await.unwrap();
        store.close().await;
    }

    let store = SqliteStore::open(config).await.unwrap();
    let report = recover(&store).await.unwrap();

    assert_eq!(report.users.len(), 1);
    assert!(report.users[0].is_admin);
    assert_eq!(report.event_count, 2);
    assert!(!report.repaired);

    let doors: Vec<u8> = read_events(&store)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.door_id)
        .collect();
    assert_eq!(doors, vec![1, 2]);
}

#[tokio::test]
async fn test_recovery_repairs_sqlite_counter() {
    let store = SqliteStore::in_memory().await.unwrap();
    store.put_u8(USERS_NAMESPACE, USER_COUNT_KEY, 3).await.unwrap();

    let report = recover(&store).await.unwrap();

    assert!(report.users.is_empty());
    assert!(report.repaired);
    assert_eq!(
        store.get_u8(USERS_NAMESPACE, USER_COUNT_KEY, 9).await.unwrap(),
        0
    );
}
