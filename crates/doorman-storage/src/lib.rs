//! Persistence layer for the Doorman access-control node.
//!
//! This crate owns everything between the node's callers and durable storage:
//! the key-value store abstraction, the fixed-size record layout, the
//! single-consumer write pipeline and the startup recovery scan.
//!
//! # Architecture
//!
//! - [`KvStore`] - namespaced byte store with single-key atomic writes
//! - [`MemoryStore`], [`SqliteStore`], [`AnyKvStore`] - backends and runtime dispatch
//! - [`schema`] - `"users"`/`"events"` layout and record codec
//! - [`PersistenceWriter`] / [`PersistenceQueue`] - the only path that mutates storage
//! - [`recovery`] - counter/record consistency check run before the writer starts
//!
//! # Examples
//!
//! ```
//! use doorman_core::{DoorId, Event, UserName};
//! use doorman_storage::{MemoryStore, PersistenceWriter, WriteIntent, schema};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let (writer, queue) = PersistenceWriter::new(store.clone());
//! let writer_task = tokio::spawn(writer.run());
//!
//! let event = Event::new(UserName::new("alice")?, DoorId::ONE);
//! queue.submit(WriteIntent::Event(event))?;
//!
//! // Dropping the last queue handle lets the writer finish its final drain.
//! drop(queue);
//! writer_task.await?;
//!
//! assert_eq!(schema::read_events(&store).await?.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Crash Safety
//!
//! A record is always written before the counter that makes it visible. A
//! crash between the two leaves an orphan record that [`recovery::recover`]
//! adopts on the next start; a counter pointing at an unreadable record is
//! truncated instead.

pub mod any;
pub mod error;
pub mod intent;
pub mod kv;
pub mod recovery;
pub mod schema;
pub mod sqlite;
pub mod writer;

pub use any::AnyKvStore;
pub use error::{StorageError, StorageResult};
pub use intent::WriteIntent;
pub use kv::{KvStore, MemoryStore};
pub use recovery::{RecoveryReport, recover};
pub use sqlite::{SqliteConfig, SqliteStore};
pub use writer::{DrainReport, PersistenceQueue, PersistenceWriter};
