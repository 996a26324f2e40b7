//! Wake word detection for vigil.
//!
//! The keyword-spotting algorithm itself is an external engine behind
//! [`KeywordEngine`]; this crate owns frame assembly, the listening state
//! machine, and microphone wiring.

pub mod detector;
pub mod engine;
pub mod listener;

pub use detector::{KeywordHit, WakeWordDetector};
pub use engine::{EngineStatus, KeywordEngine};
pub use listener::WakeWordListener;
