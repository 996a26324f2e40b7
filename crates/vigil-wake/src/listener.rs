use crate::detector::{KeywordHit, WakeWordDetector};
use crate::engine::KeywordEngine;
use tokio::sync::mpsc::UnboundedSender;
use vigil_audio::{MicClaim, MicCoordinator, MicStream, StreamSpec};
use vigil_foundation::error::WakeError;

/// Ties a [`WakeWordDetector`] to a live microphone stream.
///
/// `Idle -> Listening -> Idle`. Start fails if the engine is unavailable,
/// the microphone is claimed elsewhere, or the listener is already
/// listening. Stop is idempotent and emits nothing.
pub struct WakeWordListener {
    coordinator: MicCoordinator,
    session: Option<ListeningSession>,
}

struct ListeningSession {
    mic: Box<dyn MicStream>,
    // Held for its Drop; releases the microphone when the session ends.
    _claim: MicClaim,
}

impl WakeWordListener {
    pub fn new(coordinator: MicCoordinator) -> Self {
        Self {
            coordinator,
            session: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.session.is_some()
    }

    /// Claim the microphone, open the stream, and feed every frame to the
    /// engine. Keyword hits go out on `event_tx`.
    pub fn start(
        &mut self,
        engine: Box<dyn KeywordEngine>,
        mut mic: Box<dyn MicStream>,
        event_tx: UnboundedSender<KeywordHit>,
    ) -> Result<StreamSpec, WakeError> {
        if self.session.is_some() {
            return Err(WakeError::AlreadyListening);
        }

        let status = engine.status();
        if !status.available {
            return Err(WakeError::EngineUnavailable(status.detail));
        }

        let claim = self.coordinator.claim("wake-word")?;

        let mut detector = WakeWordDetector::new(engine);
        let spec = mic.start(Box::new(move |bytes| {
            for hit in detector.feed(bytes) {
                // Send failure just means the host dropped its receiver.
                let _ = event_tx.send(hit);
            }
        }))?;

        tracing::info!(
            sample_rate_hz = spec.sample_rate_hz,
            channels = spec.channels,
            "wake word listener started"
        );
        self.session = Some(ListeningSession { mic, _claim: claim });
        Ok(spec)
    }

    /// Release the stream and the engine handle. A no-op while idle.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.mic.stop();
            tracing::info!("wake word listener stopped");
        }
    }
}

impl Drop for WakeWordListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineStatus;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use vigil_audio::ChunkHandler;

    struct AlwaysMatchEngine;

    impl KeywordEngine for AlwaysMatchEngine {
        fn process(&mut self, _frame: &[i16]) -> Result<Option<usize>, String> {
            Ok(Some(2))
        }
        fn frame_length_samples(&self) -> usize {
            2
        }
        fn sample_rate_hz(&self) -> u32 {
            16_000
        }
        fn status(&self) -> EngineStatus {
            EngineStatus::available()
        }
    }

    struct MissingEngine;

    impl KeywordEngine for MissingEngine {
        fn process(&mut self, _frame: &[i16]) -> Result<Option<usize>, String> {
            Err("engine not loaded".into())
        }
        fn frame_length_samples(&self) -> usize {
            2
        }
        fn sample_rate_hz(&self) -> u32 {
            16_000
        }
        fn status(&self) -> EngineStatus {
            EngineStatus::unavailable("model file missing")
        }
    }

    /// Scripted stream: the test pushes bytes through the stored handler.
    #[derive(Clone, Default)]
    struct FakeMic {
        handler: Arc<Mutex<Option<ChunkHandler>>>,
    }

    impl FakeMic {
        fn push(&self, bytes: &[u8]) {
            if let Some(handler) = self.handler.lock().as_mut() {
                handler(bytes);
            }
        }
    }

    impl MicStream for FakeMic {
        fn start(&mut self, handler: ChunkHandler) -> Result<StreamSpec, vigil_foundation::AudioError> {
            *self.handler.lock() = Some(handler);
            Ok(StreamSpec {
                sample_rate_hz: 16_000,
                channels: 1,
            })
        }
        fn stop(&mut self) {
            *self.handler.lock() = None;
        }
    }

    #[tokio::test]
    async fn hits_flow_to_the_event_channel() {
        let mut listener = WakeWordListener::new(MicCoordinator::new());
        let mic = FakeMic::default();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        listener
            .start(Box::new(AlwaysMatchEngine), Box::new(mic.clone()), tx)
            .unwrap();
        mic.push(&[0, 0, 0, 0]); // one 2-sample frame
        let hit = rx.recv().await.unwrap();
        assert_eq!(hit.match_index, 2);
    }

    #[tokio::test]
    async fn duplicate_start_is_rejected() {
        let mut listener = WakeWordListener::new(MicCoordinator::new());
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        listener
            .start(
                Box::new(AlwaysMatchEngine),
                Box::new(FakeMic::default()),
                tx.clone(),
            )
            .unwrap();
        let err = listener
            .start(Box::new(AlwaysMatchEngine), Box::new(FakeMic::default()), tx)
            .unwrap_err();
        assert!(matches!(err, WakeError::AlreadyListening));
    }

    #[tokio::test]
    async fn unavailable_engine_fails_start() {
        let mut listener = WakeWordListener::new(MicCoordinator::new());
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let err = listener
            .start(Box::new(MissingEngine), Box::new(FakeMic::default()), tx)
            .unwrap_err();
        match err {
            WakeError::EngineUnavailable(detail) => assert!(detail.contains("model file")),
            other => panic!("expected EngineUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn microphone_conflict_fails_fast() {
        let coordinator = MicCoordinator::new();
        let _held = coordinator.claim("transcription").unwrap();
        let mut listener = WakeWordListener::new(coordinator);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let err = listener
            .start(Box::new(AlwaysMatchEngine), Box::new(FakeMic::default()), tx)
            .unwrap_err();
        assert!(matches!(
            err,
            WakeError::Audio(vigil_foundation::AudioError::DeviceBusy { .. })
        ));
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_silences_the_stream() {
        let mut listener = WakeWordListener::new(MicCoordinator::new());
        let mic = FakeMic::default();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        listener
            .start(Box::new(AlwaysMatchEngine), Box::new(mic.clone()), tx)
            .unwrap();
        listener.stop();
        listener.stop(); // no-op, not an error
        mic.push(&[0, 0, 0, 0]);
        assert!(rx.try_recv().is_err());
        assert!(!listener.is_listening());
    }

    #[tokio::test]
    async fn stop_releases_the_microphone() {
        let coordinator = MicCoordinator::new();
        let mut listener = WakeWordListener::new(coordinator.clone());
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        listener
            .start(Box::new(AlwaysMatchEngine), Box::new(FakeMic::default()), tx)
            .unwrap();
        assert!(coordinator.claim("transcription").is_err());
        listener.stop();
        assert!(coordinator.claim("transcription").is_ok());
    }
}
