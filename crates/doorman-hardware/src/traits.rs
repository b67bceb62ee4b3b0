//! Hardware capability trait definitions.
//!
//! These traits are the contract between the node core and its peripherals:
//! the lock actuator and exit button of each door, and the line-oriented
//! console. Mock and real implementations are interchangeable behind them.
//!
//! `DoorActuator` and `Button` are synchronous: a GPIO write or read completes
//! immediately, and both are used through `Arc<dyn _>` so the door registry can
//! hold heterogeneous pins. `LineSource` is asynchronous because reading a line
//! suspends until the operator presses enter.

use std::future::Future;

use crate::error::Result;

/// Output pin driving a door lock.
///
/// `set(true)` energizes the lock release (door open); `set(false)` locks it.
///
/// # Examples
///
/// ```
/// use doorman_hardware::traits::DoorActuator;
/// use doorman_hardware::mock::MockActuator;
///
/// let lock = MockActuator::new("door 1 lock");
/// lock.set(true).unwrap();
/// assert!(lock.is_energized());
/// ```
pub trait DoorActuator: Send + Sync {
    /// Drive the output high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot be written.
    fn set(&self, energized: bool) -> Result<()>;
}

/// Input pin of a door's exit button.
pub trait Button: Send + Sync {
    /// Returns `true` while the button is pressed.
    fn is_pressed(&self) -> bool;
}

/// Line-oriented console input.
///
/// # Examples
///
/// ```
/// use doorman_hardware::line::ChannelLineSource;
/// use doorman_hardware::traits::LineSource;
///
/// #[tokio::main]
/// async fn main() -> doorman_hardware::Result<()> {
///     let (mut source, sender) = ChannelLineSource::channel(8);
///     sender.send("1").await?;
///
///     assert_eq!(source.read_line().await?, Some("1".to_string()));
///     Ok(())
/// }
/// ```
pub trait LineSource: Send {
    /// Wait for the next complete line, without its terminator.
    ///
    /// Returns `Ok(None)` once the input has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device fails.
    fn read_line(&mut self) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Take one pending character without waiting.
    ///
    /// Line terminators are reported as `'\n'`.
    fn poll(&mut self) -> Option<char>;

    /// Discard everything typed ahead of the next prompt.
    fn discard_pending(&mut self) {
        while self.poll().is_some() {}
    }
}
