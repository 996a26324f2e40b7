use crate::engine::KeywordEngine;
use std::time::Instant;
use vigil_audio::FrameBuffer;

/// Emitted once per frame on which the engine reported a keyword match.
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub match_index: usize,
    pub timestamp: Instant,
}

/// Feeds raw capture bytes to a keyword-spotting engine frame by frame.
///
/// The detector owns the frame assembly and the engine handle; the capture
/// wiring lives in [`crate::listener::WakeWordListener`]. A processing error
/// on an individual frame is logged and swallowed so a transient engine
/// hiccup never tears down the session.
pub struct WakeWordDetector {
    engine: Box<dyn KeywordEngine>,
    buffer: FrameBuffer,
    frames_processed: u64,
    frame_errors: u64,
}

impl WakeWordDetector {
    pub fn new(engine: Box<dyn KeywordEngine>) -> Self {
        let buffer = FrameBuffer::new(engine.frame_length_samples());
        Self {
            engine,
            buffer,
            frames_processed: 0,
            frame_errors: 0,
        }
    }

    /// Feed a raw byte chunk; returns one hit per qualifying frame.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeywordHit> {
        let mut hits = Vec::new();
        for frame in self.buffer.push(bytes) {
            self.frames_processed += 1;
            match self.engine.process(&frame) {
                Ok(Some(match_index)) => {
                    tracing::info!(match_index, "keyword detected");
                    hits.push(KeywordHit {
                        match_index,
                        timestamp: Instant::now(),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    // Keep listening; the engine gets the next frame.
                    self.frame_errors += 1;
                    tracing::warn!("keyword engine error on frame: {}", e);
                }
            }
        }
        hits
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frame_errors(&self) -> u64 {
        self.frame_errors
    }

    /// Discard buffered audio, e.g. when listening stops.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
