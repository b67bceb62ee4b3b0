//! Error types for hardware operations.
//!
//! This module defines error types specific to the door peripherals and the
//! console line source.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Writing an output pin failed.
    #[error("Actuator error on {device}: {message}")]
    Actuator { device: String, message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new actuator error.
    pub fn actuator(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Actuator {
            device: device.into(),
            message: message.into(),
        }
    }
}

impl From<HardwareError> for doorman_core::Error {
    fn from(error: HardwareError) -> Self {
        match error {
            HardwareError::Io(e) => doorman_core::Error::Io(e),
            other => doorman_core::Error::Hardware(other.to_string()),
        }
    }
}
