use thiserror::Error;

/// Errors from the microphone capture path.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("capture device not found: {name:?}")]
    DeviceNotFound { name: Option<String> },

    #[error("failed to open capture stream: {0}")]
    CaptureFailed(String),

    #[error("capture device disconnected")]
    DeviceDisconnected,

    #[error("sample format not supported: {format}")]
    FormatNotSupported { format: String },

    #[error("microphone already claimed by {held_by}")]
    DeviceBusy { held_by: String },
}

/// Errors from the wake word detector.
#[derive(Error, Debug)]
pub enum WakeError {
    #[error("keyword engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("wake word detector is already listening")]
    AlreadyListening,

    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
}

/// Errors from the transcription session.
#[derive(Error, Debug)]
pub enum SttError {
    #[error("transcription engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("a recording session is already open")]
    AlreadyRecording,

    #[error("no recording session is open")]
    NotRecording,

    #[error("recording captured no audio")]
    NoAudioCaptured,

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
}

/// Errors from change sources, the completion detector, and window resolution.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("application not found: {0}")]
    ApplicationNotFound(String),

    #[error("window not found for {app}: {selector}")]
    WindowNotFound { app: String, selector: String },

    #[error("detector is already watching")]
    AlreadyWatching,

    #[error("detector is not watching")]
    NotWatching,

    #[error("filesystem watch failed: {0}")]
    WatchFailed(String),

    #[error("screen capture failed: {0}")]
    CaptureFailed(String),
}

/// Top-level error for callers that wire several subsystems together.
#[derive(Error, Debug)]
pub enum VigilError {
    #[error("audio subsystem error: {0}")]
    Audio(#[from] AudioError),

    #[error("wake word error: {0}")]
    Wake(#[from] WakeError),

    #[error("transcription error: {0}")]
    Stt(#[from] SttError),

    #[error("watcher error: {0}")]
    Watch(#[from] WatchError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl WatchError {
    /// Whether the failure should end the detector or just be logged and
    /// skipped. Start-time failures are fatal; a single bad poll tick is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WatchError::CaptureFailed(_) | WatchError::WindowNotFound { .. }
        )
    }
}
