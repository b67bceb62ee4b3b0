//! Authentication and access decisions.
//!
//! [`AccessCoordinator`] is the single entry point for operator actions: it
//! checks credentials against the [`UserRegistry`], queues the resulting
//! writes on the persistence pipeline and drives the [`DoorController`].

use std::sync::Arc;

use doorman_core::{DoorId, Error, Event, Result, User, UserIndex};
use doorman_storage::{KvStore, PersistenceQueue, WriteIntent, schema};
use tracing::{info, warn};

use crate::door::{DoorController, ReleaseOutcome, ReleaseWindow};
use crate::registry::UserRegistry;

/// Coordinates users, doors and the audit log.
///
/// `S` is the store the persisted event log is read back from; writes always
/// go through the [`PersistenceQueue`].
#[derive(Debug, Clone)]
pub struct AccessCoordinator<S> {
    users: Arc<UserRegistry>,
    doors: DoorController,
    queue: PersistenceQueue,
    store: S,
}

impl<S: KvStore> AccessCoordinator<S> {
    pub fn new(
        users: Arc<UserRegistry>,
        doors: DoorController,
        queue: PersistenceQueue,
        store: S,
    ) -> Self {
        Self {
            users,
            doors,
            queue,
            store,
        }
    }

    pub fn doors(&self) -> &DoorController {
        &self.doors
    }

    /// Index of the first user whose password is `candidate`.
    ///
    /// Users registered earlier shadow later users with the same password.
    pub async fn authenticate(&self, candidate: &str) -> Option<UserIndex> {
        self.users
            .find_by_password(candidate)
            .await
            .map(|(index, _)| index)
    }

    /// Register a user and queue it for persistence.
    ///
    /// Success means the user is in the mirror and queued; it becomes durable
    /// once the writer drains.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the name or password is out of bounds
    /// - `Error::CapacityExceeded` if the node already has its maximum of users
    /// - `Error::QueueFull` if the write queue is full; the user is not added
    pub async fn register(&self, name: &str, password: &str, is_admin: bool) -> Result<UserIndex> {
        let user = User::new(name, password, is_admin)?;

        let index = self
            .users
            .append(user, |user| self.queue.submit(WriteIntent::User(user.clone())))
            .await?;

        info!("Registered user #{} ({})", index, name.trim());
        Ok(index)
    }

    /// Authenticate for `door` and queue the release event.
    ///
    /// The door itself is not driven. The event is best effort: a full queue
    /// is logged and the user is still authorized.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownDoor` if the door is not served by this node
    /// - `Error::Unauthorized` if no user has this password
    pub async fn authorize_release(&self, door: DoorId, password: &str) -> Result<User> {
        let (index, user) = self.authenticate_for(door, password).await?;
        self.record_release(index, &user, door);
        Ok(user)
    }

    /// Authenticate, then open `door` for one release window.
    ///
    /// The event is queued only when the door actually opens. Returns `None`
    /// when the door is already open; nothing is recorded in that case.
    ///
    /// # Errors
    ///
    /// Same as [`authorize_release`](Self::authorize_release) and
    /// [`DoorController::open_window`].
    pub async fn begin_release(
        &self,
        door: DoorId,
        password: &str,
    ) -> Result<Option<(User, ReleaseWindow)>> {
        let (index, user) = self.authenticate_for(door, password).await?;

        let Some(window) = self.doors.open_window(door).await? else {
            info!("User #{} ({}) found door {} already open", index, user.name, door);
            return Ok(None);
        };

        self.record_release(index, &user, door);
        Ok(Some((user, window)))
    }

    /// Authenticate and run one full release of `door`.
    ///
    /// # Errors
    ///
    /// Same as [`begin_release`](Self::begin_release).
    pub async fn authorize_and_release(&self, door: DoorId, password: &str) -> Result<ReleaseOutcome> {
        match self.begin_release(door, password).await? {
            Some((_, window)) => Ok(window.wait().await),
            None => Ok(ReleaseOutcome::AlreadyOpen),
        }
    }

    async fn authenticate_for(&self, door: DoorId, password: &str) -> Result<(UserIndex, User)> {
        if !self.doors.has_door(door) {
            return Err(Error::UnknownDoor(door.as_u8()));
        }

        self.users.find_by_password(password).await.ok_or_else(|| {
            warn!("Rejected release of door {}: invalid password", door);
            Error::Unauthorized
        })
    }

    fn record_release(&self, index: UserIndex, user: &User, door: DoorId) {
        let event = Event::new(user.name.clone(), door);
        if let Err(e) = self.queue.submit(WriteIntent::Event(event)) {
            warn!("Release event for door {} not recorded: {}", door, e);
        }

        info!("User #{} ({}) authorized for door {}", index, user.name, door);
    }

    /// Authenticate an administrator.
    ///
    /// # Errors
    ///
    /// - `Error::Unauthorized` if no user has this password
    /// - `Error::Forbidden` if the matching user is not an administrator
    pub async fn authorize_admin_listing(&self, password: &str) -> Result<UserIndex> {
        match self.users.find_by_password(password).await {
            Some((index, user)) if user.is_admin => Ok(index),
            Some((index, _)) => {
                warn!("User #{} denied event listing: not an administrator", index);
                Err(Error::Forbidden)
            }
            None => Err(Error::Unauthorized),
        }
    }

    /// Snapshot of the registered users.
    pub async fn users(&self) -> Vec<User> {
        self.users.snapshot().await
    }

    /// Whether another registration would exceed the user capacity.
    pub async fn users_full(&self) -> bool {
        self.users.len().await >= self.users.capacity()
    }

    /// Persisted events, oldest first.
    ///
    /// Events still waiting in the write queue are not included.
    ///
    /// # Errors
    ///
    /// Returns `Error::StorageIo` if the store cannot be read.
    pub async fn events(&self) -> Result<Vec<Event>> {
        Ok(schema::read_events(&self.store).await?)
    }
}
