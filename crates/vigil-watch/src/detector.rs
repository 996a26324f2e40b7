use crate::completion::{CompletionConfig, CompletionFsm, FinishedEvent};
use crate::metrics::WatcherMetrics;
use crate::source::{ChangeEvent, ChangeSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use vigil_foundation::error::WatchError;
use vigil_foundation::lifecycle::LifecycleGate;

/// Watches one change source and emits `finished` once the target has been
/// quiet for the idle threshold plus the confirm delay.
///
/// `Stopped -> Watching -> Stopped`. The detector owns the source while
/// watching; `stop` cancels outstanding timers, releases the source, and
/// guarantees no event is emitted after it returns.
pub struct CompletionDetector {
    id: String,
    config: CompletionConfig,
    lifecycle: LifecycleGate,
    metrics: WatcherMetrics,
    watching: Option<Watching>,
}

struct Watching {
    source: Box<dyn ChangeSource>,
    task: JoinHandle<()>,
    emitting: Arc<AtomicBool>,
}

impl CompletionDetector {
    pub fn new(id: impl Into<String>, config: CompletionConfig) -> Self {
        Self {
            id: id.into(),
            config,
            lifecycle: LifecycleGate::new(),
            metrics: WatcherMetrics::new(),
            watching: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn metrics(&self) -> WatcherMetrics {
        self.metrics.clone()
    }

    pub fn is_watching(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Start watching. Rejects a duplicate start; a source that fails to
    /// start leaves the detector stopped.
    pub fn start(
        &mut self,
        mut source: Box<dyn ChangeSource>,
        finished_tx: UnboundedSender<FinishedEvent>,
    ) -> Result<(), WatchError> {
        self.lifecycle.begin()?;

        let (change_tx, change_rx) = mpsc::unbounded_channel();
        if let Err(e) = source.start(change_tx) {
            self.lifecycle.end();
            return Err(e);
        }

        let emitting = Arc::new(AtomicBool::new(true));
        let worker = DetectorWorker {
            id: self.id.clone(),
            fsm: CompletionFsm::new(self.config, Instant::now()),
            change_rx,
            finished_tx,
            emitting: emitting.clone(),
            metrics: self.metrics.clone(),
        };
        let task = tokio::spawn(worker.run());

        tracing::info!(
            detector = %self.id,
            idle_ms = self.config.idle_threshold.as_millis() as u64,
            confirm_ms = self.config.confirm_delay.as_millis() as u64,
            "completion detector watching"
        );
        self.watching = Some(Watching {
            source,
            task,
            emitting,
        });
        Ok(())
    }

    /// Stop watching: cancel timers, release the source. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut watching) = self.watching.take() {
            // Gate emissions before tearing anything down so nothing fires
            // between source shutdown and task abort.
            watching.emitting.store(false, Ordering::SeqCst);
            watching.source.stop();
            watching.task.abort();
            tracing::info!(detector = %self.id, "completion detector stopped");
        }
        self.lifecycle.end();
    }
}

impl Drop for CompletionDetector {
    fn drop(&mut self) {
        self.stop();
    }
}

struct DetectorWorker {
    id: String,
    fsm: CompletionFsm,
    change_rx: UnboundedReceiver<ChangeEvent>,
    finished_tx: UnboundedSender<FinishedEvent>,
    emitting: Arc<AtomicBool>,
    metrics: WatcherMetrics,
}

impl DetectorWorker {
    async fn run(mut self) {
        loop {
            match self.fsm.next_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        event = self.change_rx.recv() => {
                            match event {
                                Some(event) => self.accept(event),
                                None => break, // source gone
                            }
                        }
                        _ = tokio::time::sleep_until(deadline) => {
                            let now = Instant::now();
                            if let Some(summary) = self.fsm.on_deadline(now) {
                                self.emit(summary);
                            }
                        }
                    }
                }
                // Quiet: only a change can wake the machine.
                None => match self.change_rx.recv().await {
                    Some(event) => self.accept(event),
                    None => break,
                },
            }
        }
        tracing::debug!(detector = %self.id, "detector worker exiting");
    }

    fn accept(&mut self, event: ChangeEvent) {
        tracing::trace!(detector = %self.id, metadata = %event.metadata, "change");
        self.metrics.record_event();
        self.fsm.on_change(Instant::now(), &event.metadata);
    }

    fn emit(&mut self, summary: crate::completion::FinishedSummary) {
        if !self.emitting.load(Ordering::SeqCst) {
            return;
        }
        tracing::info!(
            detector = %self.id,
            changes = summary.changed_metadata.len(),
            idle_ms = summary.idle_duration_ms,
            "activity finished"
        );
        self.metrics.record_finished();
        let _ = self.finished_tx.send(FinishedEvent {
            source_id: self.id.clone(),
            changed_metadata: summary.changed_metadata,
            idle_duration_ms: summary.idle_duration_ms,
        });
    }
}
