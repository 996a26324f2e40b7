use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use vigil_foundation::error::WatchError;

/// One "something changed" observation from a change source.
///
/// `metadata` is source-specific: the root-relative path for the filesystem
/// source, the new fingerprint for the visual source. Emitted at most once
/// per underlying mutation and not persisted beyond in-flight processing.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub source_id: String,
    pub timestamp: Instant,
    pub metadata: String,
}

/// A producer of discrete change events about one monitored target.
///
/// The completion detector is written against this trait so filesystem
/// watching (push) and screen polling (pull) are interchangeable. Events are
/// delivered to the single registered sender in arrival order; `stop` is
/// idempotent and no event is delivered after it returns.
pub trait ChangeSource: Send {
    /// Identifier stamped onto every event, for hosts running several
    /// detectors at once.
    fn source_id(&self) -> &str;

    /// Begin producing events. Start-time failures (missing root, vanished
    /// window) are returned synchronously.
    fn start(&mut self, tx: UnboundedSender<ChangeEvent>) -> Result<(), WatchError>;

    /// Stop producing events. Safe to call in any state.
    fn stop(&mut self);
}
