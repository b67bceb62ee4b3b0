//! In-memory user mirror.
//!
//! The mirror is what authentication reads. Storage stays the source of truth
//! across restarts; the mirror is rebuilt from it by the recovery scan.

use doorman_core::constants::MAX_USERS;
use doorman_core::{Error, Result, User, UserIndex};
use tokio::sync::RwLock;

/// Fixed-capacity user table behind a read-write lock.
///
/// Entries are only ever appended. Indices are positions in this table.
/// They match the storage slots after a restart, but not while a record the
/// writer failed to store is still held here.
#[derive(Debug)]
pub struct UserRegistry {
    users: RwLock<Vec<User>>,
    capacity: usize,
}

impl UserRegistry {
    /// Empty registry with the node's fixed capacity.
    pub fn new() -> Self {
        Self::with_users(Vec::new())
    }

    /// Registry preloaded with recovered users.
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
            capacity: MAX_USERS,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// First user whose password equals `candidate`.
    ///
    /// Every entry is compared in constant time; the earliest match wins.
    pub async fn find_by_password(&self, candidate: &str) -> Option<(UserIndex, User)> {
        let users = self.users.read().await;
        users
            .iter()
            .enumerate()
            .find(|(_, user)| user.password.matches(candidate))
            .map(|(index, user)| (index, user.clone()))
    }

    /// Append `user` if `commit` accepts it.
    ///
    /// `commit` runs under the write lock before the append, so a rejected
    /// user never becomes visible and commits happen in index order.
    ///
    /// # Errors
    ///
    /// - `Error::CapacityExceeded` if the table is full; `commit` is not called
    /// - whatever `commit` returns
    pub async fn append<F>(&self, user: User, commit: F) -> Result<UserIndex>
    where
        F: FnOnce(&User) -> Result<()>,
    {
        let mut users = self.users.write().await;
        if users.len() >= self.capacity {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        commit(&user)?;
        users.push(user);
        Ok(users.len() - 1)
    }

    /// Copy of the table.
    pub async fn snapshot(&self) -> Vec<User> {
        self.users.read().await.clone()
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
