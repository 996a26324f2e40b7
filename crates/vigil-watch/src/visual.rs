use crate::metrics::WatcherMetrics;
use crate::source::{ChangeEvent, ChangeSource};
use crate::window::{WindowResolver, WindowSelector};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use vigil_foundation::error::WatchError;

/// Default re-capture cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Content hash of a captured region. Any pixel-level difference counts as
/// activity; there is deliberately no "trivial diff" filtering, so a
/// blinking cursor in the captured region does register.
pub fn fingerprint(image_bytes: &[u8]) -> String {
    let digest = Sha256::digest(image_bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Polls a target window region and reports a change whenever its
/// fingerprint differs from the previous capture.
///
/// The window is re-resolved fresh on every tick so a moved window keeps
/// being tracked; a window that vanishes mid-poll is logged and the tick is
/// skipped. Polling is sequential, never re-entrant: a slow capture just
/// delays the next tick.
pub struct VisualChangeSource {
    id: String,
    resolver: Arc<WindowResolver>,
    app: String,
    selector: WindowSelector,
    poll_interval: Duration,
    metrics: WatcherMetrics,
    running: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl VisualChangeSource {
    pub fn new(
        id: impl Into<String>,
        resolver: Arc<WindowResolver>,
        app: impl Into<String>,
        selector: WindowSelector,
    ) -> Self {
        Self {
            id: id.into(),
            resolver,
            app: app.into(),
            selector,
            poll_interval: DEFAULT_POLL_INTERVAL,
            metrics: WatcherMetrics::new(),
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_metrics(mut self, metrics: WatcherMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> WatcherMetrics {
        self.metrics.clone()
    }
}

impl ChangeSource for VisualChangeSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn start(&mut self, tx: UnboundedSender<ChangeEvent>) -> Result<(), WatchError> {
        if self.task.is_some() {
            return Err(WatchError::AlreadyWatching);
        }

        // Start-time failures are fatal and synchronous: a target that is
        // not on screen when watching begins is a caller error.
        let concrete_app = self.resolver.resolve_application(&self.app)?;
        let window = self.resolver.resolve_window(&concrete_app, &self.selector)?;
        let bytes = self.resolver.capture(&window.bounds)?;
        self.metrics.record_capture();
        let baseline = fingerprint(&bytes);

        tracing::info!(
            app = %concrete_app,
            title = %window.title,
            interval_ms = self.poll_interval.as_millis() as u64,
            "visual change source watching"
        );

        self.running.store(true, Ordering::SeqCst);
        let worker = PollWorker {
            id: self.id.clone(),
            resolver: self.resolver.clone(),
            app: concrete_app,
            selector: self.selector.clone(),
            baseline,
            tx,
            metrics: self.metrics.clone(),
            running: self.running.clone(),
        };
        self.task = Some(tokio::spawn(worker.run(self.poll_interval)));
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!(source = %self.id, "visual change source stopped");
        }
    }
}

impl Drop for VisualChangeSource {
    fn drop(&mut self) {
        self.stop();
    }
}

impl WindowResolver {
    /// Capture the pixels behind `bounds`, mapping platform failures to the
    /// watch error taxonomy.
    fn capture(&self, bounds: &crate::automation::WindowBounds) -> Result<Vec<u8>, WatchError> {
        self.automation().capture_region(bounds)
    }
}

struct PollWorker {
    id: String,
    resolver: Arc<WindowResolver>,
    app: String,
    selector: WindowSelector,
    baseline: String,
    tx: UnboundedSender<ChangeEvent>,
    metrics: WatcherMetrics,
    running: Arc<AtomicBool>,
}

impl PollWorker {
    async fn run(mut self, poll_interval: Duration) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await; // immediate first tick; baseline already taken

        while self.running.load(Ordering::SeqCst) {
            interval.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.poll_once();
        }
        tracing::debug!(source = %self.id, "poll worker exiting");
    }

    fn poll_once(&mut self) {
        let captured = self
            .resolver
            .resolve_window(&self.app, &self.selector)
            .and_then(|window| self.resolver.capture(&window.bounds));

        let bytes = match captured {
            Ok(bytes) => bytes,
            Err(e) => {
                // Not fatal: the window may be mid-move or briefly gone.
                self.metrics.record_skipped_tick();
                tracing::warn!(source = %self.id, "poll tick skipped: {}", e);
                return;
            }
        };
        self.metrics.record_capture();

        let current = fingerprint(&bytes);
        if current != self.baseline {
            self.baseline = current.clone();
            if self.running.load(Ordering::SeqCst) {
                let _ = self.tx.send(ChangeEvent {
                    source_id: self.id.clone(),
                    timestamp: std::time::Instant::now(),
                    metadata: current,
                });
            }
        }
    }
}
