use crate::error::WatchError;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

/// Coarse lifecycle of a detector or capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Stopped,
    Running,
}

/// Validated lifecycle tracker shared between a component and its handle.
///
/// Duplicate starts and stops are state-machine misuse: a second start is
/// rejected, a second stop is a no-op. Observers can subscribe to
/// transitions without holding the lock.
pub struct LifecycleGate {
    state: Arc<RwLock<Lifecycle>>,
    tx: watch::Sender<Lifecycle>,
}

impl Default for LifecycleGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Lifecycle::Stopped);
        Self {
            state: Arc::new(RwLock::new(Lifecycle::Stopped)),
            tx,
        }
    }

    /// Transition `Stopped -> Running`, rejecting a duplicate start.
    pub fn begin(&self) -> Result<(), WatchError> {
        let mut state = self.state.write();
        if *state == Lifecycle::Running {
            return Err(WatchError::AlreadyWatching);
        }
        *state = Lifecycle::Running;
        let _ = self.tx.send(Lifecycle::Running);
        tracing::debug!("lifecycle: Stopped -> Running");
        Ok(())
    }

    /// Transition to `Stopped`. Idempotent: returns false if already stopped.
    pub fn end(&self) -> bool {
        let mut state = self.state.write();
        if *state == Lifecycle::Stopped {
            return false;
        }
        *state = Lifecycle::Stopped;
        let _ = self.tx.send(Lifecycle::Stopped);
        tracing::debug!("lifecycle: Running -> Stopped");
        true
    }

    pub fn current(&self) -> Lifecycle {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.current() == Lifecycle::Running
    }

    pub fn subscribe(&self) -> watch::Receiver<Lifecycle> {
        self.tx.subscribe()
    }
}
