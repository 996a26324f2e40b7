//! Audio capture and buffering for vigil.
//!
//! Provides the fixed-frame assembly used by the wake word detector, the
//! streaming sample conversion used by the transcription recorder, RMS level
//! metering, the exclusive microphone claim, and the cpal capture thread.

pub mod capture;
pub mod frame_buffer;
pub mod level;
pub mod mic;

pub use capture::{ChunkHandler, CpalMicStream, MicStream, StreamSpec};
pub use frame_buffer::{FrameBuffer, SampleConverter};
pub use level::rms_level;
pub use mic::{MicClaim, MicCoordinator};
