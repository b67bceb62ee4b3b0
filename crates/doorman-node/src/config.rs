//! Node configuration.

use std::net::SocketAddr;
use std::time::Duration;

use doorman_core::constants::{DEFAULT_BUTTON_POLL_INTERVAL_MS, DEFAULT_DOOR_OPEN_TIME_MS};
use doorman_network::HttpServerConfig;
use doorman_storage::SqliteConfig;
use thiserror::Error;

use crate::door::ReleaseTiming;

/// Where users and events are stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Volatile store, lost on exit
    Memory,

    /// SQLite database file
    Sqlite { path: String },
}

/// Invalid configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Door open time must be greater than zero")]
    ZeroOpenTime,

    #[error("Button poll interval must be between 1 ms and the door open time")]
    InvalidPollInterval,

    #[error("HTTP server needs at least one request slot")]
    NoRequestSlots,
}

/// Runtime configuration of a Doorman node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// How long a released door stays open
    pub door_open_time: Duration,

    /// Exit button sampling period during a release
    pub button_poll_interval: Duration,

    /// Whether the HTTP door surface runs
    pub network_enabled: bool,

    /// Address of the HTTP door surface
    pub bind_addr: SocketAddr,

    /// Maximum HTTP requests handled at once
    pub max_requests: usize,

    /// Storage backend
    pub storage: StorageBackend,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let http = HttpServerConfig::default();
        Self {
            door_open_time: Duration::from_millis(DEFAULT_DOOR_OPEN_TIME_MS),
            button_poll_interval: Duration::from_millis(DEFAULT_BUTTON_POLL_INTERVAL_MS),
            network_enabled: true,
            bind_addr: http.bind_addr,
            max_requests: http.max_requests,
            storage: StorageBackend::Sqlite {
                path: SqliteConfig::default().database_path,
            },
        }
    }
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how long a released door stays open
    pub fn door_open_time(mut self, open_time: Duration) -> Self {
        self.door_open_time = open_time;
        self
    }

    /// Set the exit button sampling period
    pub fn button_poll_interval(mut self, interval: Duration) -> Self {
        self.button_poll_interval = interval;
        self
    }

    /// Enable or disable the HTTP door surface
    pub fn network_enabled(mut self, enabled: bool) -> Self {
        self.network_enabled = enabled;
        self
    }

    /// Set the HTTP bind address
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the maximum number of HTTP requests handled at once
    pub fn max_requests(mut self, max: usize) -> Self {
        self.max_requests = max;
        self
    }

    /// Set the storage backend
    pub fn storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.door_open_time.is_zero() {
            return Err(ConfigError::ZeroOpenTime);
        }
        if self.button_poll_interval.is_zero() || self.button_poll_interval > self.door_open_time {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.network_enabled && self.max_requests == 0 {
            return Err(ConfigError::NoRequestSlots);
        }
        Ok(())
    }

    pub fn release_timing(&self) -> ReleaseTiming {
        ReleaseTiming {
            open_time: self.door_open_time,
            poll_interval: self.button_poll_interval,
        }
    }

    pub fn http_config(&self) -> HttpServerConfig {
        HttpServerConfig {
            bind_addr: self.bind_addr,
            max_requests: self.max_requests,
        }
    }
}
