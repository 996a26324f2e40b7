//! Short-form transcription for vigil.
//!
//! The transcription algorithm is an external engine behind
//! [`TranscriptionEngine`]; this crate owns the recording session state
//! machine, chunk buffering, live level metering, and microphone wiring.

pub mod engine;
pub mod recorder;
pub mod session;
pub mod types;

pub use engine::{EngineStatus, TranscriberFactory, TranscriptionEngine};
pub use recorder::DictationRecorder;
pub use session::{TranscriptionSession, CAPTURE_CHANNELS, CAPTURE_SAMPLE_RATE_HZ};
pub use types::{AudioLevel, Transcript, WordTiming};
