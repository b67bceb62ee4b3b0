//! Hardware capability layer for the Doorman access-control node.
//!
//! This crate provides trait-based abstractions for the peripherals the node
//! drives: one lock actuator and one exit button per door, and the
//! line-oriented console used by operators. Mock implementations make the whole
//! node runnable and testable without physical hardware.
//!
//! # Design Philosophy
//!
//! - **Thread-safe**: All traits require `Send` (and `Sync` for shared pins).
//! - **Error-aware**: Fallible operations return `Result<T>` with [`HardwareError`].
//! - **Non-blocking**: Line input is read asynchronously; pin access is immediate.
//!
//! # Door Peripherals
//!
//! ```
//! use doorman_hardware::mock::{MockActuator, MockButton};
//! use doorman_hardware::traits::{Button, DoorActuator};
//!
//! let lock = MockActuator::new("door 1 lock");
//! let button = MockButton::new();
//!
//! lock.set(true).unwrap();
//! button.tap();
//! if button.is_pressed() {
//!     lock.set(false).unwrap();
//! }
//! assert!(!lock.is_energized());
//! ```
//!
//! # Console Input
//!
//! [`LineSource`] is implemented by [`ChannelLineSource`], fed either by a
//! test through a [`LineSender`] or by standard input via [`line::stdin`].
//!
//! [`LineSource`]: traits::LineSource
//! [`ChannelLineSource`]: line::ChannelLineSource
//! [`LineSender`]: line::LineSender

pub mod error;
pub mod line;
pub mod mock;
pub mod traits;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use line::{ChannelLineSource, LineSender};
pub use traits::{Button, DoorActuator, LineSource};
