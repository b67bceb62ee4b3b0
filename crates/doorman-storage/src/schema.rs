//! Persisted layout of users and events.
//!
//! ```text
//! namespace "users"                 namespace "events"
//! ├── count        : u8             ├── event_count : u8
//! ├── user_0       : [u8; 41]       ├── event_0     : [u8; 21]
//! ├── ...                           ├── ...
//! └── user_{n-1}                    └── event_{n-1}
//!
//! user record:  name[20] | password[20] | is_admin (0/1)
//! event record: user_name[20] | door_id
//! ```
//!
//! String fields are NUL-padded to 20 bytes, so every value holds at most 19
//! bytes followed by at least one NUL. There is no schema version field.

use bytes::{Buf, BufMut, BytesMut};
use doorman_core::constants::{EVENT_RECORD_LEN, FIELD_WIDTH, USER_RECORD_LEN};
use doorman_core::{Event, Password, User, UserName};
use tracing::warn;

use crate::error::{StorageError, StorageResult};
use crate::kv::KvStore;

pub const USERS_NAMESPACE: &str = "users";
pub const USER_COUNT_KEY: &str = "count";
pub const EVENTS_NAMESPACE: &str = "events";
pub const EVENT_COUNT_KEY: &str = "event_count";

/// Value written over a slot dropped by the startup scan. No record decodes
/// from it, and the scan treats it as an empty slot.
pub const TOMBSTONE: &[u8] = &[0];

#[must_use]
pub fn user_key(index: usize) -> String {
    format!("user_{index}")
}

#[must_use]
pub fn event_key(index: usize) -> String {
    format!("event_{index}")
}

fn put_field(buf: &mut BytesMut, value: &str) {
    buf.put_slice(value.as_bytes());
    buf.put_bytes(0, FIELD_WIDTH - value.len());
}

fn get_field(buf: &mut &[u8], key: &str) -> StorageResult<String> {
    let (raw, rest) = buf.split_at(FIELD_WIDTH);
    *buf = rest;

    let end = raw
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| StorageError::corrupt(key, "string field is not NUL-terminated"))?;

    String::from_utf8(raw[..end].to_vec())
        .map_err(|_| StorageError::corrupt(key, "string field is not UTF-8"))
}

fn check_len(key: &str, bytes: &[u8], expected: usize) -> StorageResult<()> {
    if bytes.len() != expected {
        return Err(StorageError::corrupt(
            key,
            format!("expected {expected} bytes, got {}", bytes.len()),
        ));
    }
    Ok(())
}

#[must_use]
pub fn encode_user(user: &User) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(USER_RECORD_LEN);
    put_field(&mut buf, user.name.as_str());
    put_field(&mut buf, user.password.as_str());
    buf.put_u8(u8::from(user.is_admin));
    buf.to_vec()
}

/// Decode a user record stored under `key`.
///
/// # Errors
///
/// Returns `StorageError::CorruptRecord` for a wrong length, an unterminated
/// or non-UTF-8 field, an invalid name or password, or an admin flag other
/// than 0 or 1.
pub fn decode_user(key: &str, bytes: &[u8]) -> StorageResult<User> {
    check_len(key, bytes, USER_RECORD_LEN)?;
    let mut buf = bytes;

    let name = get_field(&mut buf, key)?;
    let password = get_field(&mut buf, key)?;
    let is_admin = match buf.get_u8() {
        0 => false,
        1 => true,
        other => {
            return Err(StorageError::corrupt(key, format!("admin flag {other}")));
        }
    };

    Ok(User {
        name: UserName::new(&name).map_err(|e| StorageError::corrupt(key, e.to_string()))?,
        password: Password::new(&password)
            .map_err(|e| StorageError::corrupt(key, e.to_string()))?,
        is_admin,
    })
}

#[must_use]
pub fn encode_event(event: &Event) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(EVENT_RECORD_LEN);
    put_field(&mut buf, event.user_name.as_str());
    buf.put_u8(event.door_id);
    buf.to_vec()
}

/// Decode an event record stored under `key`.
///
/// # Errors
///
/// Returns `StorageError::CorruptRecord` if the bytes are not a valid event.
pub fn decode_event(key: &str, bytes: &[u8]) -> StorageResult<Event> {
    check_len(key, bytes, EVENT_RECORD_LEN)?;
    let mut buf = bytes;

    let user_name = get_field(&mut buf, key)?;
    let door_id = buf.get_u8();

    Ok(Event {
        user_name: UserName::new(&user_name)
            .map_err(|e| StorageError::corrupt(key, e.to_string()))?,
        door_id,
    })
}

/// Read the persisted event log in sequence order.
///
/// Records that are missing or fail to decode are skipped with a warning.
///
/// # Errors
///
/// Returns an error only if the store itself fails.
pub async fn read_events<S: KvStore>(store: &S) -> StorageResult<Vec<Event>> {
    let count = store.get_u8(EVENTS_NAMESPACE, EVENT_COUNT_KEY, 0).await?;
    let mut events = Vec::with_capacity(usize::from(count));

    for index in 0..usize::from(count) {
        let key = event_key(index);
        match store.get_bytes(EVENTS_NAMESPACE, &key).await? {
            Some(bytes) => match decode_event(&key, &bytes) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Skipping unreadable event: {}", e),
            },
            None => warn!("Event counter references missing record {}", key),
        }
    }

    Ok(events)
}
