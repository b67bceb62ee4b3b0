//! Node assembly and task lifecycle.
//!
//! ```text
//!              ┌──────────────┐  wait   ┌──────────────┐
//! stdin ──────►│   console    │◄────────│ StartupGate  │◄── opened by network task
//!              └──────┬───────┘         └──────────────┘
//!                     │ AccessCoordinator
//!        ┌────────────┴────────────┐
//!        ▼                         ▼
//! ┌──────────────┐          ┌──────────────────┐
//! │DoorController│◄── HTTP  │PersistenceWriter │──► KvStore
//! └──────────────┘          └──────────────────┘
//! ```
//!
//! Startup runs the recovery scan before any task starts, so the user mirror
//! and the writer's counters agree. Shutdown stops the console and network
//! tasks, locks every door and lets the writer finish its final drain.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use doorman_core::DoorId;
use doorman_hardware::LineSource;
use doorman_network::{HttpDoorServer, HttpServerError};
use doorman_storage::{
    AnyKvStore, KvStore, MemoryStore, PersistenceWriter, SqliteConfig, SqliteStore, StorageError,
    recover,
};
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::access::AccessCoordinator;
use crate::config::{ConfigError, NodeConfig, StorageBackend};
use crate::console::Console;
use crate::door::{DoorController, DoorRegistry};
use crate::gate::StartupGate;
use crate::registry::UserRegistry;

/// Errors that stop a node
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(#[from] HttpServerError),

    #[error("Console error: {0}")]
    Console(#[from] doorman_core::Error),

    #[error("Task failed: {0}")]
    Task(#[from] JoinError),
}

/// Open the store selected by `backend`.
///
/// # Errors
///
/// Returns an error if the SQLite database cannot be opened or migrated.
pub async fn open_store(backend: &StorageBackend) -> Result<AnyKvStore, StorageError> {
    match backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on exit");
            Ok(MemoryStore::new().into())
        }
        StorageBackend::Sqlite { path } => {
            info!("Opening SQLite storage at {}", path);
            Ok(SqliteStore::open(SqliteConfig::new(path.clone())).await?.into())
        }
    }
}

/// A recovered node, ready to spawn its tasks.
pub struct Node<S> {
    config: NodeConfig,
    access: AccessCoordinator<S>,
    doors: DoorController,
    gate: StartupGate,
    writer: PersistenceWriter<S>,
}

impl<S: KvStore + Clone + 'static> Node<S> {
    /// Validate `config`, recover `store` and assemble the node.
    ///
    /// # Errors
    ///
    /// - `NodeError::Config` for out-of-range settings
    /// - `NodeError::Storage` if the recovery scan cannot read or repair the store
    pub async fn new(config: NodeConfig, store: S, doors: DoorRegistry) -> Result<Self, NodeError> {
        config.validate()?;

        let report = recover(&store).await?;
        if report.repaired {
            warn!("Storage was repaired during startup");
        }

        let users = Arc::new(UserRegistry::with_users(report.users));
        let doors = DoorController::new(doors, config.release_timing());
        let (writer, queue) = PersistenceWriter::new(store.clone());
        let access = AccessCoordinator::new(users, doors.clone(), queue, store);

        let gate = if config.network_enabled {
            StartupGate::new()
        } else {
            StartupGate::opened()
        };

        Ok(Self {
            config,
            access,
            doors,
            gate,
            writer,
        })
    }

    pub fn access(&self) -> &AccessCoordinator<S> {
        &self.access
    }

    pub fn gate(&self) -> &StartupGate {
        &self.gate
    }

    /// Start the writer, network and console tasks.
    ///
    /// The HTTP listener is bound before this returns; the network task then
    /// opens the startup gate and the console renders its first menu.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Network` if the HTTP listener cannot be bound. No
    /// task keeps running in that case.
    pub async fn spawn<L, W>(self, input: L, output: W) -> Result<RunningNode, NodeError>
    where
        L: LineSource + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Self {
            config,
            access,
            doors,
            gate,
            writer,
        } = self;

        let (network, http_addr) = if config.network_enabled {
            let server = HttpDoorServer::bind(config.http_config(), doors.clone()).await?;
            let addr = server.local_addr()?;
            let gate = gate.clone();

            let task = tokio::spawn(async move {
                gate.open();
                info!("Network ready, console unlocked");
                server.serve().await;
            });
            (Some(task), Some(addr))
        } else {
            info!("Network disabled");
            (None, None)
        };

        let writer = tokio::spawn(writer.run());
        let console = tokio::spawn(Console::new(input, output, access, gate).run());

        Ok(RunningNode {
            console,
            network,
            writer,
            doors,
            http_addr,
        })
    }
}

/// Handles of a node's running tasks.
#[derive(Debug)]
pub struct RunningNode {
    console: JoinHandle<doorman_core::Result<()>>,
    network: Option<JoinHandle<()>>,
    writer: JoinHandle<()>,
    doors: DoorController,
    http_addr: Option<SocketAddr>,
}

impl RunningNode {
    /// Address of the HTTP door surface, if networking is enabled.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_addr
    }

    pub fn doors(&self) -> &DoorController {
        &self.doors
    }

    /// Run until `shutdown` completes or the console input ends, then stop.
    ///
    /// # Errors
    ///
    /// Returns the console's error if it failed, or `NodeError::Task` if a
    /// task panicked.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), NodeError>
    where
        F: Future<Output = ()>,
    {
        let console_result = tokio::select! {
            () = shutdown => {
                info!("Shutdown requested");
                None
            }
            result = &mut self.console => Some(result),
        };

        self.stop(console_result).await
    }

    async fn stop(
        self,
        console_result: Option<Result<doorman_core::Result<()>, JoinError>>,
    ) -> Result<(), NodeError> {
        let console_result = match console_result {
            Some(result) => result,
            None => {
                self.console.abort();
                self.console.await
            }
        };

        if let Some(network) = self.network {
            network.abort();
            let _ = network.await;
        }

        for door in DoorId::all() {
            if let Err(e) = self.doors.force_set(door, false).await {
                warn!("Failed to lock door {} on shutdown: {}", door, e);
            }
        }

        // The console owned the last queue handle; the writer drains and exits.
        self.writer.await?;
        info!("Node stopped");

        match console_result {
            Ok(result) => Ok(result?),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => {
                error!("Console task failed: {}", e);
                Err(e.into())
            }
        }
    }
}
