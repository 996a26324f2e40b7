use crate::session::{TranscriptionSession, CAPTURE_CHANNELS, CAPTURE_SAMPLE_RATE_HZ};
use crate::types::Transcript;
use parking_lot::Mutex;
use std::sync::Arc;
use vigil_audio::{MicClaim, MicCoordinator, MicStream, SampleConverter};
use vigil_foundation::error::{AudioError, SttError};

/// Ties a [`TranscriptionSession`] to a live microphone stream.
///
/// Claims the shared microphone for the duration of the recording so a wake
/// word listener cannot open the device concurrently.
pub struct DictationRecorder {
    coordinator: MicCoordinator,
    session: Arc<Mutex<TranscriptionSession>>,
    active: Option<ActiveRecording>,
}

struct ActiveRecording {
    mic: Box<dyn MicStream>,
    _claim: MicClaim,
}

impl DictationRecorder {
    pub fn new(coordinator: MicCoordinator, session: TranscriptionSession) -> Self {
        Self {
            coordinator,
            session: Arc::new(Mutex::new(session)),
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Open the session and the capture stream.
    pub fn start(&mut self, credential: &str, mut mic: Box<dyn MicStream>) -> Result<(), SttError> {
        if self.active.is_some() {
            return Err(SttError::AlreadyRecording);
        }

        self.session.lock().start(credential)?;

        let claim = match self.coordinator.claim("transcription") {
            Ok(claim) => claim,
            Err(e) => {
                self.session.lock().cancel();
                return Err(e.into());
            }
        };

        let session = self.session.clone();
        let mut converter = SampleConverter::new();
        let result = mic.start(Box::new(move |bytes| {
            let samples = converter.convert(bytes);
            if !samples.is_empty() {
                session.lock().push_chunk(&samples);
            }
        }));

        let spec = match result {
            Ok(spec) => spec,
            Err(e) => {
                self.session.lock().cancel();
                return Err(e.into());
            }
        };

        // The engine is handed a buffer tagged 16 kHz mono; a stream
        // negotiated at any other format would silently mislabel the audio.
        if spec.sample_rate_hz != CAPTURE_SAMPLE_RATE_HZ || spec.channels != CAPTURE_CHANNELS {
            mic.stop();
            self.session.lock().cancel();
            return Err(AudioError::FormatNotSupported {
                format: format!("{} Hz, {} channel(s)", spec.sample_rate_hz, spec.channels),
            }
            .into());
        }

        tracing::info!(
            sample_rate_hz = spec.sample_rate_hz,
            channels = spec.channels,
            "dictation recording started"
        );
        self.active = Some(ActiveRecording { mic, _claim: claim });
        Ok(())
    }

    /// Stop capture and transcribe the recording.
    pub fn stop(&mut self) -> Result<Transcript, SttError> {
        let mut active = self.active.take().ok_or(SttError::NotRecording)?;
        active.mic.stop();
        drop(active); // releases the microphone before the (slow) engine call
        self.session.lock().stop()
    }
}
