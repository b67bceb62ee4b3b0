//! Mock door lock actuator.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::debug;

use crate::{HardwareError, Result, traits::DoorActuator};

/// Mock actuator that records every write.
///
/// The actuator keeps the current output level and the number of `set` calls
/// so tests can assert how often a lock was driven.
///
/// # Examples
///
/// ```
/// use doorman_hardware::mock::MockActuator;
/// use doorman_hardware::traits::DoorActuator;
///
/// let lock = MockActuator::new("door 2 lock");
/// lock.set(true).unwrap();
/// lock.set(false).unwrap();
///
/// assert_eq!(lock.set_calls(), 2);
/// assert!(!lock.is_energized());
/// ```
#[derive(Debug)]
pub struct MockActuator {
    /// Device name used in logs and errors
    name: String,

    /// Current output level
    energized: AtomicBool,

    /// Number of `set` calls, failed ones included
    set_calls: AtomicUsize,

    /// When true, writes fail without changing the level
    faulty: AtomicBool,
}

impl MockActuator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            energized: AtomicBool::new(false),
            set_calls: AtomicUsize::new(0),
            faulty: AtomicBool::new(false),
        }
    }

    /// Current output level.
    pub fn is_energized(&self) -> bool {
        self.energized.load(Ordering::SeqCst)
    }

    /// Number of times `set` was called.
    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.store(faulty, Ordering::SeqCst);
    }
}

impl DoorActuator for MockActuator {
    fn set(&self, energized: bool) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);

        if self.faulty.load(Ordering::SeqCst) {
            return Err(HardwareError::actuator(&self.name, "simulated fault"));
        }

        self.energized.store(energized, Ordering::SeqCst);
        debug!(
            "{} driven {}",
            self.name,
            if energized { "high" } else { "low" }
        );
        Ok(())
    }
}
