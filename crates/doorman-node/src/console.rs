//! Operator console.
//!
//! A menu loop over a [`LineSource`] and any `AsyncWrite` sink. The console
//! stays silent until the [`StartupGate`] opens, then renders the menu before
//! every command:
//!
//! | Option | Action |
//! |--------|--------|
//! | `1` | register a user |
//! | `2` | list users (passwords masked) |
//! | `3` | list events (administrators only) |
//! | `4` / `5` | release door 1 / door 2 |
//!
//! The loop ends when the line source reaches end of input.

use std::ops::ControlFlow;

use doorman_core::{DoorId, Error, Result};
use doorman_hardware::LineSource;
use doorman_storage::KvStore;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::access::AccessCoordinator;
use crate::door::ReleaseOutcome;
use crate::gate::StartupGate;
use crate::messages::ConsoleMessages;

/// Interactive menu task.
pub struct Console<L, W, S> {
    input: L,
    output: W,
    access: AccessCoordinator<S>,
    gate: StartupGate,
}

impl<L, W, S> Console<L, W, S>
where
    L: LineSource,
    W: AsyncWrite + Unpin + Send,
    S: KvStore,
{
    pub fn new(input: L, output: W, access: AccessCoordinator<S>, gate: StartupGate) -> Self {
        Self {
            input,
            output,
            access,
            gate,
        }
    }

    /// Serve commands until the input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the input device fails or the output cannot be
    /// written. Operator mistakes and denied access are reported on the
    /// console and never end the loop.
    pub async fn run(mut self) -> Result<()> {
        self.gate.wait().await;
        info!("Console ready");

        loop {
            self.write(ConsoleMessages::MENU).await?;

            let Some(line) = self.input.read_line().await? else {
                break;
            };

            let flow = match line.trim().chars().next() {
                None => ControlFlow::Continue(()),
                Some('1') => self.register_user().await?,
                Some('2') => self.list_users().await?,
                Some('3') => self.list_events().await?,
                Some('4') => self.release_door(DoorId::ONE).await?,
                Some('5') => self.release_door(DoorId::TWO).await?,
                Some(other) => {
                    debug!("Invalid console option {:?}", other);
                    self.writeln(ConsoleMessages::INVALID_OPTION).await?;
                    ControlFlow::Continue(())
                }
            };

            if flow.is_break() {
                break;
            }
        }

        info!("Console input closed");
        Ok(())
    }

    async fn register_user(&mut self) -> Result<ControlFlow<()>> {
        if self.access.users_full().await {
            self.writeln(ConsoleMessages::USER_LIMIT_REACHED).await?;
            return Ok(ControlFlow::Continue(()));
        }

        self.input.discard_pending();
        self.writeln(ConsoleMessages::REGISTER_HEADER).await?;

        let Some(name) = self.prompt(ConsoleMessages::PROMPT_NAME).await? else {
            return Ok(ControlFlow::Break(()));
        };
        let Some(password) = self.prompt(ConsoleMessages::PROMPT_PASSWORD).await? else {
            return Ok(ControlFlow::Break(()));
        };
        let Some(admin) = self.prompt(ConsoleMessages::PROMPT_ADMIN).await? else {
            return Ok(ControlFlow::Break(()));
        };

        let is_admin = admin.trim() == "1";
        match self.access.register(&name, &password, is_admin).await {
            Ok(_) => self.writeln(ConsoleMessages::USER_REGISTERED).await?,
            Err(Error::CapacityExceeded { .. }) => {
                self.writeln(ConsoleMessages::USER_LIMIT_REACHED).await?;
            }
            Err(e) => {
                warn!("Registration failed: {}", e);
                self.writeln(&format!("{} ({e})", ConsoleMessages::USER_NOT_SAVED))
                    .await?;
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    async fn list_users(&mut self) -> Result<ControlFlow<()>> {
        let users = self.access.users().await;
        if users.is_empty() {
            self.writeln(ConsoleMessages::NO_USERS).await?;
            return Ok(ControlFlow::Continue(()));
        }

        let mut listing = format!("{}\n", ConsoleMessages::USERS_HEADER);
        for (i, user) in users.iter().enumerate() {
            listing.push_str(&format!(
                "{}. Nome: {} | Senha: **** | Admin: {}\n",
                i + 1,
                user.name,
                if user.is_admin { "Sim" } else { "Não" }
            ));
        }
        self.write(&listing).await?;

        Ok(ControlFlow::Continue(()))
    }

    async fn list_events(&mut self) -> Result<ControlFlow<()>> {
        let Some(password) = self.prompt_password().await? else {
            return Ok(ControlFlow::Break(()));
        };

        match self.access.authorize_admin_listing(&password).await {
            Ok(_) => {}
            Err(Error::Forbidden) => {
                self.writeln(ConsoleMessages::ADMIN_ONLY).await?;
                return Ok(ControlFlow::Continue(()));
            }
            Err(_) => {
                self.writeln(ConsoleMessages::INVALID_PASSWORD).await?;
                return Ok(ControlFlow::Continue(()));
            }
        }

        let events = match self.access.events().await {
            Ok(events) => events,
            Err(e) => {
                warn!("Failed to read event log: {}", e);
                self.writeln(&format!("Erro: {e}")).await?;
                return Ok(ControlFlow::Continue(()));
            }
        };

        if events.is_empty() {
            self.writeln(ConsoleMessages::NO_EVENTS).await?;
            return Ok(ControlFlow::Continue(()));
        }

        let users = self.access.users().await;
        let mut listing = format!("{}\n", ConsoleMessages::EVENTS_HEADER);
        for (i, event) in events.iter().enumerate() {
            let label = match users.iter().find(|user| user.name == event.user_name) {
                Some(user) => format!("({})", user.role()),
                None => ConsoleMessages::NOT_REGISTERED.to_string(),
            };
            listing.push_str(&format!(
                "{}. Usuário: {} {} | Porta: {}\n",
                i + 1,
                event.user_name,
                label,
                event.door_id
            ));
        }
        self.write(&listing).await?;

        Ok(ControlFlow::Continue(()))
    }

    async fn release_door(&mut self, door: DoorId) -> Result<ControlFlow<()>> {
        let Some(password) = self.prompt_password().await? else {
            return Ok(ControlFlow::Break(()));
        };

        let window = match self.access.begin_release(door, &password).await {
            Ok(Some((_, window))) => window,
            Ok(None) => {
                self.writeln(ConsoleMessages::DOOR_ALREADY_OPEN).await?;
                return Ok(ControlFlow::Continue(()));
            }
            Err(Error::Unauthorized) => {
                self.writeln(ConsoleMessages::INVALID_PASSWORD).await?;
                return Ok(ControlFlow::Continue(()));
            }
            Err(e) => {
                warn!("Release of door {} failed: {}", door, e);
                self.writeln(ConsoleMessages::DOOR_FAILURE).await?;
                return Ok(ControlFlow::Continue(()));
            }
        };

        self.writeln(ConsoleMessages::ACCESS_GRANTED).await?;
        match window.wait().await {
            ReleaseOutcome::Closed(_) => self.writeln(ConsoleMessages::DOOR_CLOSED).await?,
            ReleaseOutcome::Superseded | ReleaseOutcome::AlreadyOpen => {
                self.writeln(ConsoleMessages::DOOR_OVERRIDDEN).await?;
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    /// Drop typed-ahead input, then ask for a password.
    async fn prompt_password(&mut self) -> Result<Option<String>> {
        self.input.discard_pending();
        self.prompt(ConsoleMessages::PROMPT_ACCESS_PASSWORD).await
    }

    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        self.write(text).await?;
        let line = self.input.read_line().await?;
        Ok(line.map(|line| line.trim().to_string()))
    }

    async fn writeln(&mut self, text: &str) -> Result<()> {
        self.write(&format!("{text}\n")).await
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}
