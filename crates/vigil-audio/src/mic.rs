use parking_lot::Mutex;
use std::sync::Arc;
use vigil_foundation::error::AudioError;

/// Arbiter for the one physical microphone.
///
/// The wake word listener and the transcription recorder both want the raw
/// input stream; running them concurrently would corrupt one of the two.
/// Each capture consumer claims the device here before opening a stream and
/// the claim releases on drop, so a second open fails fast with a clear
/// conflict instead of silently splitting the stream.
#[derive(Clone, Default)]
pub struct MicCoordinator {
    holder: Arc<Mutex<Option<String>>>,
}

impl MicCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self, owner: &str) -> Result<MicClaim, AudioError> {
        let mut holder = self.holder.lock();
        if let Some(held_by) = holder.as_ref() {
            return Err(AudioError::DeviceBusy {
                held_by: held_by.clone(),
            });
        }
        *holder = Some(owner.to_string());
        tracing::debug!(owner, "microphone claimed");
        Ok(MicClaim {
            holder: self.holder.clone(),
            owner: owner.to_string(),
        })
    }

    pub fn current_holder(&self) -> Option<String> {
        self.holder.lock().clone()
    }
}

/// RAII claim on the microphone; dropping it releases the device.
pub struct MicClaim {
    holder: Arc<Mutex<Option<String>>>,
    owner: String,
}

impl Drop for MicClaim {
    fn drop(&mut self) {
        let mut holder = self.holder.lock();
        if holder.as_deref() == Some(self.owner.as_str()) {
            *holder = None;
            tracing::debug!(owner = %self.owner, "microphone released");
        }
    }
}
