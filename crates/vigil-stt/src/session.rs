use crate::engine::{TranscriberFactory, TranscriptionEngine};
use crate::types::{AudioLevel, Transcript};
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use vigil_audio::rms_level;
use vigil_foundation::error::SttError;

/// Capture format for dictation recordings.
pub const CAPTURE_SAMPLE_RATE_HZ: u32 = 16_000;
pub const CAPTURE_CHANNELS: u16 = 1;

/// Audio buffered for one recording. Chunks are appended by the capture
/// callback and never mutated after append; the whole structure is released
/// when `stop` returns.
struct RecordingSession {
    chunks: Vec<Vec<i16>>,
    started_at: Instant,
}

/// Buffering transcription session: `Idle -> Recording -> Idle`.
///
/// While recording, every chunk is appended to the session and produces one
/// `AudioLevel` event. On stop the chunks are concatenated and handed to the
/// external engine in a single call. Only one recording may be open at a
/// time.
pub struct TranscriptionSession {
    factory: Box<dyn TranscriberFactory>,
    engine: Option<Box<dyn TranscriptionEngine>>,
    credential: Option<String>,
    recording: Option<RecordingSession>,
    level_tx: Option<UnboundedSender<AudioLevel>>,
}

impl TranscriptionSession {
    pub fn new(factory: Box<dyn TranscriberFactory>) -> Self {
        Self {
            factory,
            engine: None,
            credential: None,
            recording: None,
            level_tx: None,
        }
    }

    /// Register a sink for per-chunk amplitude events.
    pub fn with_level_events(mut self, tx: UnboundedSender<AudioLevel>) -> Self {
        self.level_tx = Some(tx);
        self
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Open a recording. Fails with `AlreadyRecording` if one is open.
    pub fn start(&mut self, credential: &str) -> Result<(), SttError> {
        if self.recording.is_some() {
            return Err(SttError::AlreadyRecording);
        }
        self.ensure_engine(credential)?;
        self.recording = Some(RecordingSession {
            chunks: Vec::new(),
            started_at: Instant::now(),
        });
        tracing::info!("recording session opened");
        Ok(())
    }

    /// Append one captured chunk and report its display level. Chunks
    /// arriving while idle are discarded.
    pub fn push_chunk(&mut self, samples: &[i16]) -> Option<f32> {
        let recording = self.recording.as_mut()?;
        recording.chunks.push(samples.to_vec());
        let level = rms_level(samples);
        if let Some(tx) = &self.level_tx {
            let _ = tx.send(AudioLevel { level });
        }
        Some(level)
    }

    /// Close the recording and transcribe everything captured.
    ///
    /// Fails with `NotRecording` while idle and `NoAudioCaptured` when no
    /// chunk arrived; the engine is never invoked in either case. The
    /// session buffers are released on every path.
    pub fn stop(&mut self) -> Result<Transcript, SttError> {
        let recording = self.recording.take().ok_or(SttError::NotRecording)?;
        if recording.chunks.is_empty() {
            return Err(SttError::NoAudioCaptured);
        }

        let total: usize = recording.chunks.iter().map(Vec::len).sum();
        let mut samples = Vec::with_capacity(total);
        for chunk in &recording.chunks {
            samples.extend_from_slice(chunk);
        }

        let duration = recording.started_at.elapsed();
        tracing::info!(
            samples = samples.len(),
            recorded_ms = duration.as_millis() as u64,
            "transcribing recording"
        );

        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| SttError::EngineUnavailable("engine not initialized".into()))?;
        engine
            .transcribe(&samples, CAPTURE_SAMPLE_RATE_HZ)
            .map_err(SttError::Transcription)
    }

    /// Drop an open recording without transcribing, e.g. when the capture
    /// stream failed to open after the session started.
    pub fn cancel(&mut self) {
        if self.recording.take().is_some() {
            tracing::debug!("recording session cancelled");
        }
    }

    /// (Re)build the engine handle only when the credential changes, to
    /// avoid redundant engine startup across repeated recordings.
    fn ensure_engine(&mut self, credential: &str) -> Result<(), SttError> {
        if self.engine.is_some() && self.credential.as_deref() == Some(credential) {
            return Ok(());
        }
        let engine = self.factory.build(credential)?;
        let status = engine.status();
        if !status.available {
            return Err(SttError::EngineUnavailable(status.detail));
        }
        self.engine = Some(engine);
        self.credential = Some(credential.to_string());
        Ok(())
    }
}
