/// Availability report for an external engine, surfaced to the host instead
/// of a crash when the engine is missing.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub available: bool,
    pub detail: String,
}

impl EngineStatus {
    pub fn available() -> Self {
        Self {
            available: true,
            detail: String::new(),
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            available: false,
            detail: detail.into(),
        }
    }
}

/// A trait for external keyword-spotting engines.
///
/// The engine consumes fixed-length sample frames atomically and reports the
/// index of the keyword it matched, if any. Robustness (debouncing, per-frame
/// confidence) is the engine's concern, not the detector's.
pub trait KeywordEngine: Send {
    /// Process one frame of exactly `frame_length_samples()` samples.
    /// `Ok(Some(index))` reports a keyword match for this frame.
    fn process(&mut self, frame: &[i16]) -> Result<Option<usize>, String>;

    /// Frame length the engine requires, in samples.
    fn frame_length_samples(&self) -> usize;

    /// Sample rate the engine requires, in Hz.
    fn sample_rate_hz(&self) -> u32;

    /// Whether the engine is usable right now.
    fn status(&self) -> EngineStatus;
}
