use std::future::Future;

use doorman_core::{DoorId, DoorState, Result};
use serde::Serialize;

/// Door control exposed to remote callers.
///
/// Implemented by the node's door controller. Calls are direct on/off
/// operations without the timed-release protocol and without authentication;
/// access policy on this surface belongs to whoever deploys the transport.
pub trait DoorService: Send + Sync + 'static {
    /// Open `door` and leave it open.
    fn open(&self, door: DoorId) -> impl Future<Output = Result<DoorState>> + Send;

    /// Close `door`.
    fn close(&self, door: DoorId) -> impl Future<Output = Result<DoorState>> + Send;

    /// Current state of every door.
    fn status(&self) -> impl Future<Output = Vec<DoorStatus>> + Send;
}

/// State of one door, as reported by `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DoorStatus {
    pub door: DoorId,
    pub state: DoorState,
}
