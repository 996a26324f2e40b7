//! End-to-end detector tests over a scripted change source, run on tokio's
//! paused clock so every timing assertion is exact.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use vigil_foundation::error::WatchError;
use vigil_watch::{ChangeEvent, ChangeSource, CompletionConfig, CompletionDetector};

/// Change source driven by the test: events are pushed through a handle.
struct PushSource {
    id: String,
    tx: Arc<Mutex<Option<UnboundedSender<ChangeEvent>>>>,
}

#[derive(Clone)]
struct PushHandle {
    id: String,
    tx: Arc<Mutex<Option<UnboundedSender<ChangeEvent>>>>,
}

impl PushSource {
    fn new(id: &str) -> (Box<Self>, PushHandle) {
        let tx = Arc::new(Mutex::new(None));
        let source = Box::new(Self {
            id: id.to_string(),
            tx: tx.clone(),
        });
        let handle = PushHandle {
            id: id.to_string(),
            tx,
        };
        (source, handle)
    }
}

impl PushHandle {
    fn push(&self, metadata: &str) {
        if let Some(tx) = self.tx.lock().as_ref() {
            let _ = tx.send(ChangeEvent {
                source_id: self.id.clone(),
                timestamp: std::time::Instant::now(),
                metadata: metadata.to_string(),
            });
        }
    }
}

impl ChangeSource for PushSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn start(&mut self, tx: UnboundedSender<ChangeEvent>) -> Result<(), WatchError> {
        *self.tx.lock() = Some(tx);
        Ok(())
    }

    fn stop(&mut self) {
        self.tx.lock().take();
    }
}

/// Source that refuses to start, for rollback coverage.
struct BrokenSource;

impl ChangeSource for BrokenSource {
    fn source_id(&self) -> &str {
        "broken"
    }
    fn start(&mut self, _tx: UnboundedSender<ChangeEvent>) -> Result<(), WatchError> {
        Err(WatchError::WatchFailed("cannot watch".into()))
    }
    fn stop(&mut self) {}
}

fn cfg(idle_ms: u64, confirm_ms: u64) -> CompletionConfig {
    CompletionConfig {
        idle_threshold: Duration::from_millis(idle_ms),
        confirm_delay: Duration::from_millis(confirm_ms),
    }
}

#[tokio::test(start_paused = true)]
async fn finished_fires_after_idle_plus_confirm_with_collected_changes() {
    let (source, handle) = PushSource::new("fs");
    let mut detector = CompletionDetector::new("fs", cfg(3000, 2000));
    let (finished_tx, mut finished_rx) = tokio::sync::mpsc::unbounded_channel();

    let started_at = tokio::time::Instant::now();
    detector.start(source, finished_tx).unwrap();
    assert!(detector.is_watching());

    handle.push("a.txt");
    tokio::time::sleep(Duration::from_millis(1000)).await;
    handle.push("b.txt");
    tokio::time::sleep(Duration::from_millis(800)).await;
    handle.push("c.txt");

    let finished = finished_rx.recv().await.unwrap();
    // Last change at 1800ms, so 1800 + 3000 idle + 2000 confirm.
    assert_eq!(started_at.elapsed(), Duration::from_millis(6800));
    assert_eq!(finished.changed_metadata, vec!["a.txt", "b.txt", "c.txt"]);
    assert_eq!(finished.idle_duration_ms, 5000);

    let snapshot = detector.metrics().snapshot();
    assert_eq!(snapshot.events_seen, 3);
    assert_eq!(snapshot.finished_emitted, 1);
}

#[tokio::test(start_paused = true)]
async fn change_during_confirm_window_postpones_the_event() {
    let (source, handle) = PushSource::new("fs");
    let mut detector = CompletionDetector::new("fs", cfg(3000, 2000));
    let (finished_tx, mut finished_rx) = tokio::sync::mpsc::unbounded_channel();

    let started_at = tokio::time::Instant::now();
    detector.start(source, finished_tx).unwrap();

    handle.push("x");
    // Confirm window opens at 3000; land a change inside it.
    tokio::time::sleep(Duration::from_millis(4000)).await;
    handle.push("y");

    let finished = finished_rx.recv().await.unwrap();
    assert_eq!(started_at.elapsed(), Duration::from_millis(9000)); // 4000 + 3000 + 2000
    assert_eq!(finished.changed_metadata, vec!["x", "y"]);
}

#[tokio::test(start_paused = true)]
async fn second_cycle_requires_fresh_activity() {
    let (source, handle) = PushSource::new("fs");
    let mut detector = CompletionDetector::new("fs", cfg(1000, 500));
    let (finished_tx, mut finished_rx) = tokio::sync::mpsc::unbounded_channel();
    detector.start(source, finished_tx).unwrap();

    handle.push("first");
    let first = finished_rx.recv().await.unwrap();
    assert_eq!(first.changed_metadata, vec!["first"]);

    // Quiet target: nothing else fires on its own.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(finished_rx.try_recv().is_err());

    handle.push("second");
    let second = finished_rx.recv().await.unwrap();
    assert_eq!(second.changed_metadata, vec!["second"]);
}

#[tokio::test(start_paused = true)]
async fn stop_suppresses_pending_completion() {
    let (source, handle) = PushSource::new("fs");
    let mut detector = CompletionDetector::new("fs", cfg(1000, 500));
    let (finished_tx, mut finished_rx) = tokio::sync::mpsc::unbounded_channel();
    detector.start(source, finished_tx).unwrap();

    handle.push("x");
    tokio::time::sleep(Duration::from_millis(200)).await;
    detector.stop();
    assert!(!detector.is_watching());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(finished_rx.try_recv().is_err());
    assert_eq!(detector.metrics().snapshot().finished_emitted, 0);

    // Stop again is a no-op.
    detector.stop();
}

#[tokio::test(start_paused = true)]
async fn duplicate_start_is_rejected() {
    let (source, _handle) = PushSource::new("fs");
    let (second_source, _second_handle) = PushSource::new("fs");
    let mut detector = CompletionDetector::new("fs", CompletionConfig::default());
    let (finished_tx, _finished_rx) = tokio::sync::mpsc::unbounded_channel();

    detector.start(source, finished_tx.clone()).unwrap();
    assert!(matches!(
        detector.start(second_source, finished_tx),
        Err(WatchError::AlreadyWatching)
    ));
    detector.stop();
}

#[tokio::test(start_paused = true)]
async fn failed_source_start_leaves_detector_stopped() {
    let mut detector = CompletionDetector::new("fs", CompletionConfig::default());
    let (finished_tx, _finished_rx) = tokio::sync::mpsc::unbounded_channel();

    assert!(matches!(
        detector.start(Box::new(BrokenSource), finished_tx.clone()),
        Err(WatchError::WatchFailed(_))
    ));
    assert!(!detector.is_watching());

    // Recoverable: a working source can still be started afterwards.
    let (source, _handle) = PushSource::new("fs");
    detector.start(source, finished_tx).unwrap();
    assert!(detector.is_watching());
    detector.stop();
}
