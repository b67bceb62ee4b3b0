//! Startup consistency scan.
//!
//! The writer advances a counter only after its record is stored, but a store
//! without multi-key commits can still be left inconsistent by a crash or by a
//! damaged record. Before the writer starts, each namespace is checked:
//!
//! - A counter that references a missing or undecodable record is truncated to
//!   the index of the first such record. Every stored slot from there up to
//!   capacity is overwritten with a tombstone, so a later scan cannot adopt
//!   records the operator no longer sees.
//! - Readable records directly past the counter ("record written, counter
//!   stale") are adopted, up to the namespace capacity.
//!
//! The corrected counter is written back so the writer appends after it.

use doorman_core::User;
use doorman_core::constants::{MAX_EVENTS, MAX_USERS};
use tracing::{info, warn};

use crate::error::StorageResult;
use crate::kv::KvStore;
use crate::schema::{
    EVENT_COUNT_KEY, EVENTS_NAMESPACE, TOMBSTONE, USER_COUNT_KEY, USERS_NAMESPACE, decode_event,
    decode_user, event_key, user_key,
};

/// Outcome of the startup scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Users to load into the in-memory mirror, in storage order.
    pub users: Vec<User>,

    /// Number of readable events.
    pub event_count: usize,

    /// At least one counter was rewritten.
    pub repaired: bool,
}

/// One namespace to scan.
struct Layout<T> {
    namespace: &'static str,
    counter_key: &'static str,
    capacity: usize,
    key: fn(usize) -> String,
    decode: fn(&str, &[u8]) -> StorageResult<T>,
}

/// Verify both namespaces and load the user table.
///
/// # Errors
///
/// Returns an error if the store cannot be read or a repaired counter cannot
/// be written. Undecodable records are not errors; they end the scan.
pub async fn recover<S: KvStore>(store: &S) -> StorageResult<RecoveryReport> {
    let (users, users_repaired) = scan(
        store,
        &Layout {
            namespace: USERS_NAMESPACE,
            counter_key: USER_COUNT_KEY,
            capacity: MAX_USERS,
            key: user_key,
            decode: decode_user,
        },
    )
    .await?;

    let (events, events_repaired) = scan(
        store,
        &Layout {
            namespace: EVENTS_NAMESPACE,
            counter_key: EVENT_COUNT_KEY,
            capacity: MAX_EVENTS,
            key: event_key,
            decode: decode_event,
        },
    )
    .await?;

    info!(
        "Recovered {} users and {} events from storage",
        users.len(),
        events.len()
    );

    Ok(RecoveryReport {
        users,
        event_count: events.len(),
        repaired: users_repaired || events_repaired,
    })
}

async fn read_record<S: KvStore, T>(
    store: &S,
    layout: &Layout<T>,
    index: usize,
) -> StorageResult<Option<T>> {
    let key = (layout.key)(index);
    let Some(bytes) = store.get_bytes(layout.namespace, &key).await? else {
        return Ok(None);
    };
    if bytes == TOMBSTONE {
        return Ok(None);
    }

    match (layout.decode)(&key, &bytes) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            warn!("Unreadable record in {}: {}", layout.namespace, e);
            Ok(None)
        }
    }
}

async fn scan<S: KvStore, T>(store: &S, layout: &Layout<T>) -> StorageResult<(Vec<T>, bool)> {
    let stored = usize::from(store.get_u8(layout.namespace, layout.counter_key, 0).await?);
    let mut records = Vec::new();
    let mut truncated = false;

    for index in 0..stored.min(layout.capacity) {
        match read_record(store, layout, index).await? {
            Some(record) => records.push(record),
            None => {
                warn!(
                    "{} counter is {} but record {} is unreadable; truncating to {}",
                    layout.namespace, stored, index, index
                );
                truncated = true;
                break;
            }
        }
    }

    if records.len() == stored {
        while records.len() < layout.capacity {
            let index = records.len();
            match read_record(store, layout, index).await? {
                Some(record) => {
                    warn!(
                        "Adopting {} record {} written after its counter",
                        layout.namespace, index
                    );
                    records.push(record);
                }
                None => break,
            }
        }
    }

    if truncated {
        bury_slots(store, layout, records.len()).await?;
    }

    let repaired = records.len() != stored;
    if repaired {
        let count = u8::try_from(records.len()).unwrap_or(u8::MAX);
        store
            .put_u8(layout.namespace, layout.counter_key, count)
            .await?;
        warn!(
            "Rewrote {} counter from {} to {}",
            layout.namespace, stored, count
        );
    }

    Ok((records, repaired))
}

/// Tombstone every stored slot from `from` up to capacity.
async fn bury_slots<S: KvStore, T>(
    store: &S,
    layout: &Layout<T>,
    from: usize,
) -> StorageResult<()> {
    let mut buried = 0;
    for index in from..layout.capacity {
        let key = (layout.key)(index);
        match store.get_bytes(layout.namespace, &key).await? {
            Some(bytes) if bytes != TOMBSTONE => {
                store.put_bytes(layout.namespace, &key, TOMBSTONE).await?;
                buried += 1;
            }
            _ => {}
        }
    }

    if buried > 0 {
        warn!(
            "Discarded {} {} records past index {}",
            buried, layout.namespace, from
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use crate::schema::{encode_event, encode_user};
    use doorman_core::{DoorId, Event, UserName};

    async fn put_user(store: &MemoryStore, index: usize, name: &str) {
        let user = User::new(name, "pw", false).unwrap();
        store
            .put_bytes(USERS_NAMESPACE, &user_key(index), &encode_user(&user))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemoryStore::new();
        let report = recover(&store).await.unwrap();

        assert!(report.users.is_empty());
        assert_eq!(report.event_count, 0);
        assert!(!report.repaired);
    }

    #[tokio::test]
    async fn test_consistent_store_is_untouched() {
        let store = MemoryStore::new();
        put_user(&store, 0, "alice").await;
        put_user(&store, 1, "bob").await;
        store.put_u8(USERS_NAMESPACE, USER_COUNT_KEY, 2).await.unwrap();

        let report = recover(&store).await.unwrap();
        let names: Vec<_> = report.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
        assert!(!report.repaired);
    }

    #[tokio::test]
    async fn test_counter_past_missing_record_is_truncated() {
        let store = MemoryStore::new();
        put_user(&store, 0, "alice").await;
        store.put_u8(USERS_NAMESPACE, USER_COUNT_KEY, 2).await.unwrap();

        let report = recover(&store).await.unwrap();
        assert_eq!(report.users.len(), 1);
        assert!(report.repaired);
        assert_eq!(store.get_u8(USERS_NAMESPACE, USER_COUNT_KEY, 0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_truncates() {
        let store = MemoryStore::new();
        put_user(&store, 0, "alice").await;
        store
            .put_bytes(USERS_NAMESPACE, &user_key(1), b"garbage")
            .await
            .unwrap();
        put_user(&store, 2, "carol").await;
        store.put_u8(USERS_NAMESPACE, USER_COUNT_KEY, 3).await.unwrap();

        let report = recover(&store).await.unwrap();
        assert_eq!(report.users.len(), 1);
        assert_eq!(store.get_u8(USERS_NAMESPACE, USER_COUNT_KEY, 0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_truncated_records_stay_dropped_after_restart() {
        let store = MemoryStore::new();
        put_user(&store, 0, "alice").await;
        put_user(&store, 2, "carol").await;
        store.put_u8(USERS_NAMESPACE, USER_COUNT_KEY, 3).await.unwrap();

        let first = recover(&store).await.unwrap();
        let names: Vec<_> = first.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["alice"]);

        // The writer appends the next user into slot 1.
        put_user(&store, 1, "dave").await;
        store.put_u8(USERS_NAMESPACE, USER_COUNT_KEY, 2).await.unwrap();

        let second = recover(&store).await.unwrap();
        let names: Vec<_> = second.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["alice", "dave"]);
        assert!(!second.repaired);
    }

    #[tokio::test]
    async fn test_truncated_events_stay_dropped_after_restart() {
        let store = MemoryStore::new();
        let event = Event::new(UserName::new("alice").unwrap(), DoorId::ONE);
        for index in [0, 1, 3] {
            store
                .put_bytes(EVENTS_NAMESPACE, &event_key(index), &encode_event(&event))
                .await
                .unwrap();
        }
        store.put_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, 4).await.unwrap();

        assert_eq!(recover(&store).await.unwrap().event_count, 2);

        store
            .put_bytes(EVENTS_NAMESPACE, &event_key(2), &encode_event(&event))
            .await
            .unwrap();
        store.put_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, 3).await.unwrap();

        let report = recover(&store).await.unwrap();
        assert_eq!(report.event_count, 3);
        assert!(!report.repaired);
    }

    #[tokio::test]
    async fn test_stale_counter_adopts_orphan() {
        let store = MemoryStore::new();
        let event = Event::new(UserName::new("alice").unwrap(), DoorId::ONE);
        for index in 0..2 {
            store
                .put_bytes(EVENTS_NAMESPACE, &event_key(index), &encode_event(&event))
                .await
                .unwrap();
        }
        store.put_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, 1).await.unwrap();

        let report = recover(&store).await.unwrap();
        assert_eq!(report.event_count, 2);
        assert!(report.repaired);
        assert_eq!(
            store.get_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, 0).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_user_adoption_stops_at_capacity() {
        let store = MemoryStore::new();
        for index in 0..MAX_USERS + 2 {
            put_user(&store, index, &format!("user{index}")).await;
        }

        let report = recover(&store).await.unwrap();
        assert_eq!(report.users.len(), MAX_USERS);
    }
}
