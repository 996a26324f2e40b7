//! Core types for the transcription surface.

/// Word-level timing information, when the engine provides it.
#[derive(Debug, Clone, PartialEq)]
pub struct WordTiming {
    /// Start offset in seconds.
    pub start: f32,
    /// End offset in seconds.
    pub end: f32,
    /// Word text.
    pub text: String,
}

/// Result of transcribing one full recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub words: Vec<WordTiming>,
}

/// Live amplitude reading emitted once per captured chunk, independent of
/// the eventual transcript.
#[derive(Debug, Clone, Copy)]
pub struct AudioLevel {
    /// Normalized 0..1 display level.
    pub level: f32,
}
