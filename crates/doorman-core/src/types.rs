use crate::{
    Result,
    constants::{MAX_DOOR_ID, MAX_FIELD_LEN, MIN_DOOR_ID},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Position of a user in the credential table.
pub type UserIndex = usize;

/// Door identifier (1 or 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DoorId(u8);

impl DoorId {
    /// First door.
    pub const ONE: DoorId = DoorId(1);

    /// Second door.
    pub const TWO: DoorId = DoorId(2);

    /// Create a new door ID with validation.
    ///
    /// # Errors
    /// Returns `Error::UnknownDoor` if the ID is outside the valid range (1-2).
    pub fn new(id: u8) -> Result<Self> {
        if !(MIN_DOOR_ID..=MAX_DOOR_ID).contains(&id) {
            return Err(Error::UnknownDoor(id));
        }
        Ok(DoorId(id))
    }

    /// Get the raw door number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// All doors served by this node, in ascending order.
    #[must_use]
    pub fn all() -> [DoorId; 2] {
        [DoorId::ONE, DoorId::TWO]
    }
}

impl fmt::Display for DoorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for DoorId {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        DoorId::new(value)
    }
}

impl From<DoorId> for u8 {
    fn from(id: DoorId) -> Self {
        id.0
    }
}

impl std::str::FromStr for DoorId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u8 = s.trim().parse().map_err(|_| Error::InvalidInput {
            field: "door",
            reason: format!("not a door number: {s}"),
        })?;
        DoorId::new(id)
    }
}

/// Physical state of a door lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    #[default]
    Closed,
    Open,
}

impl DoorState {
    /// Returns `true` if the door is open.
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, DoorState::Open)
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DoorState::Closed => write!(f, "Closed"),
            DoorState::Open => write!(f, "Open"),
        }
    }
}

/// Validate a bounded credential field.
///
/// The value is trimmed; it must be non-empty, NUL-free and at most
/// [`MAX_FIELD_LEN`] bytes so it fits a NUL-terminated record slot.
fn bounded(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::InvalidInput {
            field,
            reason: "must not be empty".to_string(),
        });
    }

    if value.contains('\0') {
        return Err(Error::InvalidInput {
            field,
            reason: "must not contain NUL".to_string(),
        });
    }

    let len = value.len();
    if len > MAX_FIELD_LEN {
        return Err(Error::InvalidInput {
            field,
            reason: format!("must be at most {MAX_FIELD_LEN} bytes, got {len}"),
        });
    }

    Ok(value.to_string())
}

/// User name (1-19 bytes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Create a new user name with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if the trimmed name is empty, longer than
    /// 19 bytes, or contains NUL.
    pub fn new(name: &str) -> Result<Self> {
        bounded("name", name).map(UserName)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        UserName::new(&value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

/// User password (1-19 bytes)
///
/// # Security
/// Equality is constant-time to keep authentication scans free of timing
/// side channels, and `Debug` never prints the secret.
#[derive(Clone, Eq)]
pub struct Password(String);

impl Password {
    /// Create a new password with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if the trimmed password is empty, longer
    /// than 19 bytes, or contains NUL.
    pub fn new(password: &str) -> Result<Self> {
        bounded("password", password).map(Password)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against an unvalidated candidate.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Password(****)")
    }
}

/// Registered operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: UserName,
    pub password: Password,
    pub is_admin: bool,
}

impl User {
    /// Build a user from raw console input.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if the name or password is out of bounds.
    pub fn new(name: &str, password: &str, is_admin: bool) -> Result<Self> {
        Ok(Self {
            name: UserName::new(name)?,
            password: Password::new(password)?,
            is_admin,
        })
    }

    /// Human-readable role label.
    #[must_use]
    pub fn role(&self) -> &'static str {
        if self.is_admin { "Admin" } else { "Usuário" }
    }
}

/// Door release audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub user_name: UserName,
    pub door_id: u8,
}

impl Event {
    #[must_use]
    pub fn new(user_name: UserName, door: DoorId) -> Self {
        Self {
            user_name,
            door_id: door.as_u8(),
        }
    }
}
