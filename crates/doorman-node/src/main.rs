use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use doorman_core::constants::{DEFAULT_BUTTON_POLL_INTERVAL_MS, DEFAULT_DOOR_OPEN_TIME_MS};
use doorman_hardware::line;
use doorman_node::{DoorRegistry, Node, NodeConfig, StorageBackend, open_store};

/// Access-control node with two doors, an operator console and an HTTP door surface.
#[derive(Parser, Debug)]
#[command(name = "doorman", author, version, about, long_about = None)]
struct Cli {
    /// How long a released door stays open, in milliseconds
    #[arg(long, env = "DOORMAN_DOOR_OPEN_MS", default_value_t = DEFAULT_DOOR_OPEN_TIME_MS)]
    door_open_ms: u64,

    /// Exit button sampling period, in milliseconds
    #[arg(long, env = "DOORMAN_BUTTON_POLL_MS", default_value_t = DEFAULT_BUTTON_POLL_INTERVAL_MS)]
    button_poll_ms: u64,

    /// Address of the HTTP door surface
    #[arg(long, env = "DOORMAN_BIND", default_value = "0.0.0.0:80")]
    bind: SocketAddr,

    /// Maximum HTTP requests handled at once
    #[arg(long, env = "DOORMAN_MAX_REQUESTS", default_value_t = 16)]
    max_requests: usize,

    /// Run without the HTTP door surface
    #[arg(long, env = "DOORMAN_NO_NETWORK")]
    no_network: bool,

    /// Storage backend
    #[arg(long, env = "DOORMAN_STORAGE", value_enum, default_value_t = Backend::Sqlite)]
    storage: Backend,

    /// SQLite database file
    #[arg(long, env = "DOORMAN_DATABASE", default_value = "doorman.db")]
    database: String,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, env = "DOORMAN_LOG", default_value = "doorman=info")]
    log_filter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Memory,
    Sqlite,
}

impl Cli {
    fn config(&self) -> NodeConfig {
        let storage = match self.storage {
            Backend::Memory => StorageBackend::Memory,
            Backend::Sqlite => StorageBackend::Sqlite {
                path: self.database.clone(),
            },
        };

        NodeConfig::new()
            .door_open_time(Duration::from_millis(self.door_open_ms))
            .button_poll_interval(Duration::from_millis(self.button_poll_ms))
            .network_enabled(!self.no_network)
            .bind_addr(self.bind)
            .max_requests(self.max_requests)
            .storage(storage)
    }
}

/// Logs go to stderr so the console menu on stdout stays readable.
fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    if let Err(e) = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("doorman: logging disabled: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter);

    let config = cli.config();
    info!("Starting doorman {}", doorman_core::VERSION);

    let store = open_store(&config.storage)
        .await
        .context("failed to open storage")?;

    // No GPIO backend yet; doors run on mock peripherals.
    let (doors, _mocks) = DoorRegistry::mock();

    let node = Node::new(config, store, doors)
        .await
        .context("failed to start node")?;
    let running = node
        .spawn(line::stdin(), tokio::io::stdout())
        .await
        .context("failed to start tasks")?;

    if let Some(addr) = running.http_addr() {
        info!("HTTP door surface on http://{}", addr);
    }

    running
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorman_node::ReleaseTiming;

    #[test]
    fn test_default_timing_matches_constants() {
        let cli = Cli::try_parse_from(["doorman"]).unwrap();

        assert_eq!(cli.door_open_ms, DEFAULT_DOOR_OPEN_TIME_MS);
        assert_eq!(cli.button_poll_ms, DEFAULT_BUTTON_POLL_INTERVAL_MS);
        assert_eq!(cli.config().release_timing(), ReleaseTiming::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "doorman",
            "--door-open-ms",
            "250",
            "--no-network",
            "--storage",
            "memory",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.release_timing().open_time, Duration::from_millis(250));
        assert!(!config.network_enabled);
        assert_eq!(config.storage, StorageBackend::Memory);
    }
}
