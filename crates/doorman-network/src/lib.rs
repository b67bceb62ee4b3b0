//! Network surface of the Doorman node
//!
//! This crate exposes door control over plain HTTP, routed with axum. It owns
//! the transport and routing; the door operations themselves come from a
//! [`DoorService`] implementation supplied by the node.
//!
//! # Routes
//!
//! | Path | Response |
//! |------|----------|
//! | `GET /` | remote control page |
//! | `GET /door1/on`, `GET /door2/on` | `Porta N aberta` |
//! | `GET /door1/off`, `GET /door2/off` | `Porta N fechada` |
//! | `GET /status` | JSON door states |
//!
//! # Example
//!
//! ```no_run
//! use doorman_network::{DoorService, HttpDoorServer, HttpServerConfig};
//!
//! # async fn example<D: DoorService>(service: D) -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpServerConfig {
//!     bind_addr: "0.0.0.0:8080".parse()?,
//!     ..Default::default()
//! };
//!
//! let server = HttpDoorServer::bind(config, service).await?;
//! server.serve().await;
//! # Ok(())
//! # }
//! ```

mod page;
mod server;
mod service;

pub use server::{HttpDoorServer, HttpServerConfig, HttpServerError, router};
pub use service::{DoorService, DoorStatus};
