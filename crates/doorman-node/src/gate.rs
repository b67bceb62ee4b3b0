//! Startup gate.
//!
//! A one-shot readiness signal. The console waits on it before rendering its
//! first menu; the network task opens it once the HTTP listener is bound.

use std::sync::Arc;

use tokio::sync::watch;

/// One-shot signal, unset until [`open`](StartupGate::open) is called.
///
/// Clones share the same signal.
///
/// # Examples
///
/// ```
/// use doorman_node::StartupGate;
///
/// #[tokio::main]
/// async fn main() {
///     let gate = StartupGate::new();
///     let waiter = gate.clone();
///
///     let task = tokio::spawn(async move { waiter.wait().await });
///     assert!(gate.open());
///     task.await.unwrap();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct StartupGate {
    tx: Arc<watch::Sender<bool>>,
}

impl StartupGate {
    /// Create a closed gate.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Create a gate that is already open, for nodes without networking.
    pub fn opened() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    /// Open the gate, waking every waiter.
    ///
    /// Returns `false` if the gate was already open.
    pub fn open(&self) -> bool {
        self.tx.send_if_modified(|open| !std::mem::replace(open, true))
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the gate is open. Returns immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for StartupGate {
    fn default() -> Self {
        Self::new()
    }
}
