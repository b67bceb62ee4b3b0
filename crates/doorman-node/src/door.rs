//! Door state machine and timed release.
//!
//! Each door has its own `tokio::sync::Mutex` over its state, so door 1 and door 2
//! never wait on each other. The mutex is held only while the actuator is
//! driven and the state updated; the release window is spent outside it.
//!
//! # Release protocol
//!
//! ```text
//! Closed ──release──► Open ──button pressed / open_time elapsed──► Closed
//!   ▲                  │
//!   └──force_set(off)──┘   (network surface, no timed wait)
//! ```
//!
//! A release on a door that is already open does nothing and reports
//! [`ReleaseOutcome::AlreadyOpen`].
//!
//! Every transition bumps the door's generation. A release window only closes
//! the door it opened: if `force_set` drove the door while the window was
//! running, the window ends early and leaves the lock alone.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use doorman_core::constants::{DEFAULT_BUTTON_POLL_INTERVAL_MS, DEFAULT_DOOR_OPEN_TIME_MS};
use doorman_core::{DoorId, DoorState, Error, Result};
use doorman_hardware::mock::{MockActuator, MockButton};
use doorman_hardware::{Button, DoorActuator};
use doorman_network::{DoorService, DoorStatus};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

/// Why an open door was closed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The exit button was pressed during the release window
    ButtonPressed,

    /// The release window elapsed
    TimedOut,
}

/// Result of [`DoorController::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The door was already open; nothing was driven
    AlreadyOpen,

    /// The door was opened and closed again
    Closed(CloseReason),

    /// The door was driven by `force_set` during the window; its state was
    /// left as that call set it
    Superseded,
}

/// Timing of the release window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseTiming {
    /// How long a released door stays open without a button press
    pub open_time: Duration,

    /// How often the exit button is sampled while the door is open
    pub poll_interval: Duration,
}

impl Default for ReleaseTiming {
    fn default() -> Self {
        Self {
            open_time: Duration::from_millis(DEFAULT_DOOR_OPEN_TIME_MS),
            poll_interval: Duration::from_millis(DEFAULT_BUTTON_POLL_INTERVAL_MS),
        }
    }
}

/// State of one door plus the generation of its last transition.
#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    door: DoorState,
    generation: u64,
}

impl SlotState {
    fn set(&mut self, door: DoorState) -> u64 {
        self.door = door;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

/// Peripherals and state of one door.
struct DoorSlot {
    state: Mutex<SlotState>,
    actuator: Arc<dyn DoorActuator>,
    button: Arc<dyn Button>,
}

/// The doors served by a node, keyed by id.
#[derive(Default)]
pub struct DoorRegistry {
    doors: BTreeMap<DoorId, Arc<DoorSlot>>,
}

impl DoorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a door, replacing any previous peripherals for the same id.
    ///
    /// The door starts closed.
    pub fn with_door(
        mut self,
        door: DoorId,
        actuator: Arc<dyn DoorActuator>,
        button: Arc<dyn Button>,
    ) -> Self {
        self.doors.insert(
            door,
            Arc::new(DoorSlot {
                state: Mutex::new(SlotState::default()),
                actuator,
                button,
            }),
        );
        self
    }

    /// Both doors backed by mock peripherals.
    ///
    /// Returns the registry and the mocks, in door order, so callers can
    /// observe the locks and press the buttons.
    pub fn mock() -> (Self, Vec<(Arc<MockActuator>, Arc<MockButton>)>) {
        let mut registry = Self::new();
        let mut handles = Vec::new();

        for door in DoorId::all() {
            let actuator = Arc::new(MockActuator::new(format!("door {door} lock")));
            let button = Arc::new(MockButton::new());
            registry = registry.with_door(door, actuator.clone(), button.clone());
            handles.push((actuator, button));
        }

        (registry, handles)
    }

    fn slot(&self, door: DoorId) -> Result<&Arc<DoorSlot>> {
        self.doors
            .get(&door)
            .ok_or_else(|| Error::UnknownDoor(door.as_u8()))
    }

    pub fn contains(&self, door: DoorId) -> bool {
        self.doors.contains_key(&door)
    }
}

impl std::fmt::Debug for DoorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorRegistry")
            .field("doors", &self.doors.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Drives the doors of a [`DoorRegistry`].
///
/// Cheap to clone; clones share the doors.
#[derive(Debug, Clone)]
pub struct DoorController {
    registry: Arc<DoorRegistry>,
    timing: ReleaseTiming,
}

impl DoorController {
    pub fn new(registry: DoorRegistry, timing: ReleaseTiming) -> Self {
        Self {
            registry: Arc::new(registry),
            timing,
        }
    }

    /// Whether `door` is served by this controller.
    pub fn has_door(&self, door: DoorId) -> bool {
        self.registry.contains(door)
    }

    /// Open `door` for one release window, then close it.
    ///
    /// Returns once the door is closed again, either because its exit button
    /// was pressed or because `open_time` elapsed. Another release of the same
    /// door while it is open returns [`ReleaseOutcome::AlreadyOpen`] at once.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownDoor` if the door is not in the registry
    /// - `Error::Hardware` if the lock cannot be opened
    pub async fn release(&self, door: DoorId) -> Result<ReleaseOutcome> {
        match self.open_window(door).await? {
            Some(window) => Ok(window.wait().await),
            None => Ok(ReleaseOutcome::AlreadyOpen),
        }
    }

    /// Open `door` and start its release window.
    ///
    /// Returns `None` without driving the lock if the door is already open.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownDoor` if the door is not in the registry
    /// - `Error::Hardware` if the lock cannot be opened; the door stays closed
    pub async fn open_window(&self, door: DoorId) -> Result<Option<ReleaseWindow>> {
        let slot = self.registry.slot(door)?;
        let mut state = slot.state.lock().await;
        if state.door.is_open() {
            debug!("Door {} already open, release ignored", door);
            return Ok(None);
        }

        slot.actuator.set(true)?;
        let generation = state.set(DoorState::Open);
        info!("Door {} released", door);

        Ok(Some(ReleaseWindow {
            door,
            slot: slot.clone(),
            timing: self.timing,
            generation,
        }))
    }

    /// Drive `door` open or closed without a release window.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownDoor` if the door is not in the registry
    /// - `Error::Hardware` if the lock cannot be driven; the state is unchanged
    pub async fn force_set(&self, door: DoorId, open: bool) -> Result<DoorState> {
        let slot = self.registry.slot(door)?;
        let mut state = slot.state.lock().await;

        slot.actuator.set(open)?;
        state.set(if open {
            DoorState::Open
        } else {
            DoorState::Closed
        });

        Ok(state.door)
    }

    /// Current state of `door`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownDoor` if the door is not in the registry.
    pub async fn state(&self, door: DoorId) -> Result<DoorState> {
        let slot = self.registry.slot(door)?;
        Ok(slot.state.lock().await.door)
    }

    /// State of every door, in id order.
    pub async fn snapshot(&self) -> Vec<DoorStatus> {
        let mut statuses = Vec::with_capacity(self.registry.doors.len());
        for (door, slot) in &self.registry.doors {
            statuses.push(DoorStatus {
                door: *door,
                state: slot.state.lock().await.door,
            });
        }
        statuses
    }
}

/// A door opened by [`DoorController::open_window`].
///
/// The door stays open until [`wait`](Self::wait) sees the exit button or the
/// deadline. If `force_set` drives the door in the meantime the window ends
/// with [`ReleaseOutcome::Superseded`] and the lock is not touched again.
#[must_use = "the door stays open until the window is waited on"]
pub struct ReleaseWindow {
    door: DoorId,
    slot: Arc<DoorSlot>,
    timing: ReleaseTiming,
    generation: u64,
}

impl ReleaseWindow {
    pub fn door(&self) -> DoorId {
        self.door
    }

    /// Hold the door open for the window, then lock it.
    ///
    /// A failure to lock after the window is logged; the door is still
    /// recorded as closed.
    pub async fn wait(self) -> ReleaseOutcome {
        let Some(reason) = self.wait_for_close().await else {
            info!("Door {} release window superseded", self.door);
            return ReleaseOutcome::Superseded;
        };

        {
            let mut state = self.slot.state.lock().await;
            if state.generation != self.generation {
                info!("Door {} release window superseded", self.door);
                return ReleaseOutcome::Superseded;
            }
            if let Err(e) = self.slot.actuator.set(false) {
                error!("Failed to lock door {} after release: {}", self.door, e);
            }
            state.set(DoorState::Closed);
        }
        info!("Door {} closed ({:?})", self.door, reason);

        ReleaseOutcome::Closed(reason)
    }

    /// `None` once the door has moved past this window's generation.
    async fn wait_for_close(&self) -> Option<CloseReason> {
        let deadline = Instant::now() + self.timing.open_time;

        loop {
            if self.slot.state.lock().await.generation != self.generation {
                return None;
            }
            if self.slot.button.is_pressed() {
                return Some(CloseReason::ButtonPressed);
            }
            if Instant::now() >= deadline {
                return Some(CloseReason::TimedOut);
            }
            sleep(self.timing.poll_interval).await;
        }
    }
}

impl std::fmt::Debug for ReleaseWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseWindow")
            .field("door", &self.door)
            .field("generation", &self.generation)
            .finish()
    }
}

impl DoorService for DoorController {
    async fn open(&self, door: DoorId) -> Result<DoorState> {
        self.force_set(door, true).await
    }

    async fn close(&self, door: DoorId) -> Result<DoorState> {
        self.force_set(door, false).await
    }

    async fn status(&self) -> Vec<DoorStatus> {
        self.snapshot().await
    }
}
