use crate::types::Transcript;
use vigil_foundation::error::SttError;

/// Availability report for the external transcription engine.
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

/// External batch transcription engine.
///
/// Input is the full 16 kHz mono sample buffer for one recording; the
/// engine is invoked exactly once per stopped session.
pub trait TranscriptionEngine: Send {
    fn transcribe(&mut self, samples: &[i16], sample_rate_hz: u32) -> Result<Transcript, String>;

    fn status(&self) -> EngineStatus;
}

/// Builds engine handles from an access credential.
///
/// Engine startup is expensive, so the session keeps one handle alive and
/// only rebuilds through this factory when the credential changes.
pub trait TranscriberFactory: Send {
    fn build(&self, credential: &str) -> Result<Box<dyn TranscriptionEngine>, SttError>;
}
