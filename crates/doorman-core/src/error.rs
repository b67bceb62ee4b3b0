use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Access errors
    #[error("Unauthorized: invalid credential")]
    Unauthorized,

    #[error("Forbidden: administrator privilege required")]
    Forbidden,

    // Capacity errors
    #[error("User capacity exceeded (max {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("Write queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    // Storage errors
    #[error("Storage I/O error: {0}")]
    StorageIo(String),

    // Door errors
    #[error("Unknown door: {0}")]
    UnknownDoor(u8),

    #[error("Hardware operation failed: {0}")]
    Hardware(String),

    // Validation errors
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
