use doorman_core::{Event, User};

/// A pending write, consumed exactly once by the persistence writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteIntent {
    /// Append a user record to the `"users"` namespace.
    User(User),

    /// Append an event record to the `"events"` namespace.
    Event(Event),
}

impl WriteIntent {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            WriteIntent::User(_) => "user",
            WriteIntent::Event(_) => "event",
        }
    }
}

impl From<User> for WriteIntent {
    fn from(user: User) -> Self {
        WriteIntent::User(user)
    }
}

impl From<Event> for WriteIntent {
    fn from(event: Event) -> Self {
        WriteIntent::Event(event)
    }
}
