use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Timing for the two-stage quiescence check.
///
/// A single idle threshold fires false completions during ordinary pauses in
/// an agent's work, so a candidate idle period is re-validated by a second
/// confirm delay before `finished` is emitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Minimum quiet duration before a completion candidate is considered.
    pub idle_threshold: Duration,
    /// Additional quiet duration required after the idle threshold.
    pub confirm_delay: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(30),
            confirm_delay: Duration::from_secs(10),
        }
    }
}

/// Emitted once per completed idle+confirm cycle.
#[derive(Debug, Clone)]
pub struct FinishedEvent {
    pub source_id: String,
    /// Deduplicated, order-preserving metadata of every change in the cycle.
    pub changed_metadata: Vec<String>,
    /// Elapsed quiet time when the event fired.
    pub idle_duration_ms: u64,
}

/// Sub-state while watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing to report; waiting for the first change of the next cycle.
    Quiet,
    /// Activity observed; the idle timer is counting down.
    IdleCandidate,
    /// Idle threshold met; waiting out the confirm delay.
    ConfirmPending { deadline: Instant },
}

/// Debounce-with-confirmation state machine.
///
/// Pure timing logic: the caller supplies `now` and drives it from a timer
/// loop, which keeps every property here mechanically checkable without
/// real sleeps. At most one finished summary is produced per confirm
/// window, and a change landing inside the confirm window always cancels
/// the pending emission.
pub struct CompletionFsm {
    config: CompletionConfig,
    phase: Phase,
    last_activity: Instant,
    metadata: Vec<String>,
}

/// Snapshot handed back when a cycle completes.
#[derive(Debug, Clone)]
pub struct FinishedSummary {
    pub changed_metadata: Vec<String>,
    pub idle_duration_ms: u64,
}

impl CompletionFsm {
    /// The detector starts armed: a target that never produces a change
    /// still completes one idle+confirm cycle from the start instant.
    pub fn new(config: CompletionConfig, now: Instant) -> Self {
        Self {
            config,
            phase: Phase::IdleCandidate,
            last_activity: now,
            metadata: Vec::new(),
        }
    }

    /// Record a change: reset the idle clock, cancel any pending confirm.
    pub fn on_change(&mut self, now: Instant, metadata: &str) {
        if !self.metadata.iter().any(|m| m == metadata) {
            self.metadata.push(metadata.to_string());
        }
        self.last_activity = now;
        if matches!(self.phase, Phase::ConfirmPending { .. }) {
            tracing::debug!("change during confirm window; completion cancelled");
        }
        self.phase = Phase::IdleCandidate;
    }

    /// When the caller should next call [`on_deadline`], if ever.
    ///
    /// `None` means the machine is quiet and only a change can wake it.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Quiet => None,
            Phase::IdleCandidate => Some(self.last_activity + self.config.idle_threshold),
            Phase::ConfirmPending { deadline } => Some(deadline),
        }
    }

    /// Advance past a deadline. Returns a summary when a cycle completes.
    pub fn on_deadline(&mut self, now: Instant) -> Option<FinishedSummary> {
        match self.phase {
            Phase::Quiet => None,
            Phase::IdleCandidate => {
                if now < self.last_activity + self.config.idle_threshold {
                    return None;
                }
                self.phase = Phase::ConfirmPending {
                    deadline: now + self.config.confirm_delay,
                };
                tracing::debug!("idle threshold met; confirm window opened");
                None
            }
            Phase::ConfirmPending { deadline } => {
                if now < deadline {
                    return None;
                }
                let summary = FinishedSummary {
                    changed_metadata: std::mem::take(&mut self.metadata),
                    idle_duration_ms: now.duration_since(self.last_activity).as_millis() as u64,
                };
                // Back to quiet until the next change; continuing to watch,
                // but a second emission needs fresh activity first.
                self.phase = Phase::Quiet;
                Some(summary)
            }
        }
    }

    pub fn pending_change_count(&self) -> usize {
        self.metadata.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(idle_ms: u64, confirm_ms: u64) -> CompletionConfig {
        CompletionConfig {
            idle_threshold: Duration::from_millis(idle_ms),
            confirm_delay: Duration::from_millis(confirm_ms),
        }
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    /// Drive the machine with its own deadlines until it either fires or
    /// runs past `until`.
    fn run_until(fsm: &mut CompletionFsm, until: Instant) -> Option<(Instant, FinishedSummary)> {
        while let Some(deadline) = fsm.next_deadline() {
            if deadline > until {
                return None;
            }
            if let Some(summary) = fsm.on_deadline(deadline) {
                return Some((deadline, summary));
            }
        }
        None
    }

    #[test]
    fn fires_idle_plus_confirm_after_last_change() {
        let base = Instant::now();
        let mut fsm = CompletionFsm::new(cfg(3000, 2000), base);

        fsm.on_change(at(base, 0), "a.txt");
        fsm.on_change(at(base, 1000), "b.txt");
        fsm.on_change(at(base, 1800), "c.txt");

        let (fired_at, summary) = run_until(&mut fsm, at(base, 10_000)).expect("should fire");
        assert_eq!(fired_at, at(base, 6800));
        assert_eq!(summary.changed_metadata, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(summary.idle_duration_ms, 5000); // 3000 idle + 2000 confirm
    }

    #[test]
    fn change_before_idle_threshold_resets_the_clock() {
        let base = Instant::now();
        let mut fsm = CompletionFsm::new(cfg(3000, 2000), base);

        fsm.on_change(at(base, 0), "x");
        // Just under the threshold: resets the idle clock.
        fsm.on_change(at(base, 2900), "y");

        assert!(run_until(&mut fsm, at(base, 7800)).is_none());
        let (fired_at, _) = run_until(&mut fsm, at(base, 7900)).unwrap();
        assert_eq!(fired_at, at(base, 7900)); // 2900 + 3000 + 2000
    }

    #[test]
    fn change_during_confirm_window_cancels_pending_completion() {
        let base = Instant::now();
        let mut fsm = CompletionFsm::new(cfg(3000, 2000), base);

        fsm.on_change(at(base, 0), "x");
        // Idle threshold passes; confirm window opens at t=3000.
        assert!(fsm.on_deadline(at(base, 3000)).is_none());
        assert_eq!(fsm.next_deadline(), Some(at(base, 5000)));

        // Change lands inside the confirm window.
        fsm.on_change(at(base, 4000), "y");
        // The old confirm deadline must no longer produce a completion.
        assert!(fsm.on_deadline(at(base, 5000)).is_none());

        let (fired_at, summary) = run_until(&mut fsm, at(base, 9000)).unwrap();
        assert_eq!(fired_at, at(base, 9000)); // 4000 + 3000 + 2000
        assert_eq!(summary.changed_metadata, vec!["x", "y"]);
    }

    #[test]
    fn at_most_one_finished_per_cycle() {
        let base = Instant::now();
        let mut fsm = CompletionFsm::new(cfg(1000, 500), base);
        fsm.on_change(at(base, 0), "x");

        let fired = run_until(&mut fsm, at(base, 60_000));
        assert!(fired.is_some());
        // Quiet now; no further deadline and no further emission without a
        // new change.
        assert_eq!(fsm.next_deadline(), None);
        assert!(fsm.on_deadline(at(base, 60_000)).is_none());

        fsm.on_change(at(base, 70_000), "z");
        let (fired_at, summary) = run_until(&mut fsm, at(base, 80_000)).unwrap();
        assert_eq!(fired_at, at(base, 71_500));
        assert_eq!(summary.changed_metadata, vec!["z"]);
    }

    #[test]
    fn metadata_deduplicates_preserving_first_seen_order() {
        let base = Instant::now();
        let mut fsm = CompletionFsm::new(cfg(1000, 500), base);
        fsm.on_change(at(base, 0), "src/main.rs");
        fsm.on_change(at(base, 10), "src/lib.rs");
        fsm.on_change(at(base, 20), "src/main.rs");
        assert_eq!(fsm.pending_change_count(), 2);

        let (_, summary) = run_until(&mut fsm, at(base, 10_000)).unwrap();
        assert_eq!(summary.changed_metadata, vec!["src/main.rs", "src/lib.rs"]);
    }

    #[test]
    fn starts_armed_and_completes_with_empty_metadata() {
        let base = Instant::now();
        let mut fsm = CompletionFsm::new(cfg(1000, 500), base);
        let (fired_at, summary) = run_until(&mut fsm, at(base, 5000)).unwrap();
        assert_eq!(fired_at, at(base, 1500));
        assert!(summary.changed_metadata.is_empty());
    }

    #[test]
    fn early_deadline_calls_are_ignored() {
        let base = Instant::now();
        let mut fsm = CompletionFsm::new(cfg(1000, 500), base);
        fsm.on_change(at(base, 0), "x");
        // A deadline callback arriving early must not advance the machine.
        assert!(fsm.on_deadline(at(base, 999)).is_none());
        assert_eq!(fsm.next_deadline(), Some(at(base, 1000)));
    }
}
