//! Doorman access-control node.
//!
//! This crate wires the node together: the user mirror, the per-door state
//! machines, the access coordinator that ties them to the persistence
//! pipeline, the operator console and the startup gate that holds the console
//! back until networking is up.
//!
//! # Tasks
//!
//! - **console**: menu loop over a [`LineSource`](doorman_hardware::LineSource)
//! - **writer**: the single [`PersistenceWriter`](doorman_storage::PersistenceWriter)
//! - **network**: the [`HttpDoorServer`](doorman_network::HttpDoorServer)
//!
//! # Example
//!
//! ```no_run
//! use doorman_hardware::line;
//! use doorman_node::{DoorRegistry, Node, NodeConfig, StorageBackend, open_store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NodeConfig::new().storage(StorageBackend::Memory);
//! let store = open_store(&config.storage).await?;
//! let (doors, _mocks) = DoorRegistry::mock();
//!
//! let node = Node::new(config, store, doors).await?;
//! let running = node.spawn(line::stdin(), tokio::io::stdout()).await?;
//! running.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod config;
pub mod console;
pub mod door;
pub mod gate;
pub mod messages;
pub mod node;
pub mod registry;

pub use access::AccessCoordinator;
pub use config::{ConfigError, NodeConfig, StorageBackend};
pub use console::Console;
pub use door::{
    CloseReason, DoorController, DoorRegistry, ReleaseOutcome, ReleaseTiming, ReleaseWindow,
};
pub use gate::StartupGate;
pub use node::{Node, NodeError, RunningNode, open_store};
pub use registry::UserRegistry;
