//! Core constants for the Doorman access-control node.
//!
//! These values fix the capacities and timings shared by every crate in the
//! workspace: the size of the credential table, the bound of the persistence
//! queue, the fixed-size record layout in the key-value store, and the default
//! door release timings.
//!
//! # Usage
//!
//! ```
//! use doorman_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(MAX_USERS, 10);
//! let open_time = Duration::from_millis(DEFAULT_DOOR_OPEN_TIME_MS);
//! assert_eq!(open_time.as_secs(), 5);
//! ```

// ============================================================================
// Capacities
// ============================================================================

/// Maximum number of registered users.
///
/// The credential table is fixed-size; registration past this limit fails
/// with [`Error::CapacityExceeded`](crate::Error::CapacityExceeded).
pub const MAX_USERS: usize = 10;

/// Capacity of the persistence write queue.
///
/// Enqueueing past this bound fails immediately with
/// [`Error::QueueFull`](crate::Error::QueueFull).
pub const WRITE_QUEUE_CAPACITY: usize = 10;

/// Maximum number of persisted events.
///
/// The event counter is stored as a single byte.
pub const MAX_EVENTS: usize = u8::MAX as usize;

// ============================================================================
// Record Layout
// ============================================================================

/// Maximum length in bytes of a user name or password.
pub const MAX_FIELD_LEN: usize = 19;

/// Width of a NUL-padded string field inside a stored record.
pub const FIELD_WIDTH: usize = MAX_FIELD_LEN + 1;

/// Size of a persisted user record: name, password, admin flag.
pub const USER_RECORD_LEN: usize = FIELD_WIDTH * 2 + 1;

/// Size of a persisted event record: user name, door number.
pub const EVENT_RECORD_LEN: usize = FIELD_WIDTH + 1;

// ============================================================================
// Doors
// ============================================================================

/// Lowest valid door number.
pub const MIN_DOOR_ID: u8 = 1;

/// Highest valid door number.
pub const MAX_DOOR_ID: u8 = 2;

/// Default time a released door stays open, in milliseconds.
pub const DEFAULT_DOOR_OPEN_TIME_MS: u64 = 5000;

/// Default interval between exit-button polls during a release, in milliseconds.
pub const DEFAULT_BUTTON_POLL_INTERVAL_MS: u64 = 50;
