use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use vigil_foundation::error::AudioError;

/// Negotiated stream parameters reported back to the consumer.
#[derive(Debug, Clone, Copy)]
pub struct StreamSpec {
    pub sample_rate_hz: u32,
    pub channels: u16,
}

/// Callback receiving raw little-endian 16-bit PCM bytes from the device.
pub type ChunkHandler = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Raw-audio capture boundary.
///
/// The wake listener and transcription recorder are written against this
/// trait so their state machines can be exercised in tests with a scripted
/// stream; [`CpalMicStream`] is the hardware implementation.
pub trait MicStream: Send {
    /// Open the stream and begin delivering chunks. Fails if the device
    /// cannot be opened. A second `start` without `stop` is rejected.
    fn start(&mut self, handler: ChunkHandler) -> Result<StreamSpec, AudioError>;

    /// Stop delivery and release the device. Idempotent; no chunk is
    /// delivered after this returns.
    fn stop(&mut self);
}

/// cpal-backed microphone stream running on a dedicated capture thread.
///
/// The cpal `Stream` is not `Send`, so it lives entirely on that thread;
/// start-up results are handed back over a channel, mirroring the preflight
/// handshake used for device negotiation.
pub struct CpalMicStream {
    device_name: Option<String>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalMicStream {
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            device_name,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

impl MicStream for CpalMicStream {
    fn start(&mut self, mut handler: ChunkHandler) -> Result<StreamSpec, AudioError> {
        if self.thread.is_some() {
            return Err(AudioError::CaptureFailed(
                "capture stream already open".into(),
            ));
        }

        let device_name = self.device_name.clone();
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let (spec_tx, spec_rx) = crossbeam_channel::bounded::<Result<StreamSpec, AudioError>>(1);

        let thread = thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || {
                let host = cpal::default_host();
                let device = match &device_name {
                    Some(name) => host
                        .input_devices()
                        .ok()
                        .and_then(|mut devs| {
                            devs.find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                        }),
                    None => host.default_input_device(),
                };
                let Some(device) = device else {
                    let _ = spec_tx.send(Err(AudioError::DeviceNotFound {
                        name: device_name.clone(),
                    }));
                    return;
                };

                let default_config = match device.default_input_config() {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = spec_tx.send(Err(AudioError::CaptureFailed(e.to_string())));
                        return;
                    }
                };
                let sample_format = default_config.sample_format();
                let config = StreamConfig {
                    channels: default_config.channels(),
                    sample_rate: default_config.sample_rate(),
                    buffer_size: cpal::BufferSize::Default,
                };
                let spec = StreamSpec {
                    sample_rate_hz: config.sample_rate.0,
                    channels: config.channels,
                };

                let cb_running = running.clone();
                let mut emit_i16 = move |samples: &[i16]| {
                    if !cb_running.load(Ordering::SeqCst) {
                        return;
                    }
                    let mut bytes = Vec::with_capacity(samples.len() * 2);
                    for s in samples {
                        bytes.extend_from_slice(&s.to_le_bytes());
                    }
                    handler(&bytes);
                };

                let err_fn = |err: cpal::StreamError| {
                    tracing::error!("capture stream error: {}", err);
                };

                let stream = match sample_format {
                    SampleFormat::I16 => device.build_input_stream(
                        &config,
                        move |data: &[i16], _: &_| emit_i16(data),
                        err_fn,
                        None,
                    ),
                    SampleFormat::F32 => device.build_input_stream(
                        &config,
                        move |data: &[f32], _: &_| {
                            let converted: Vec<i16> = data
                                .iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
                                .collect();
                            emit_i16(&converted);
                        },
                        err_fn,
                        None,
                    ),
                    SampleFormat::U16 => device.build_input_stream(
                        &config,
                        move |data: &[u16], _: &_| {
                            let converted: Vec<i16> =
                                data.iter().map(|&s| (s as i32 - 32768) as i16).collect();
                            emit_i16(&converted);
                        },
                        err_fn,
                        None,
                    ),
                    other => {
                        let _ = spec_tx.send(Err(AudioError::FormatNotSupported {
                            format: format!("{:?}", other),
                        }));
                        return;
                    }
                };

                let stream = match stream {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = spec_tx.send(Err(AudioError::CaptureFailed(e.to_string())));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = spec_tx.send(Err(AudioError::CaptureFailed(e.to_string())));
                    return;
                }

                let _ = spec_tx.send(Ok(spec));
                while running.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(50));
                }
                drop(stream);
            })
            .map_err(|e| AudioError::CaptureFailed(format!("failed to spawn thread: {}", e)))?;

        match spec_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(spec)) => {
                self.thread = Some(thread);
                Ok(spec)
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = thread.join();
                Err(AudioError::CaptureFailed(
                    "timed out waiting for capture stream".into(),
                ))
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CpalMicStream {
    fn drop(&mut self) {
        self.stop();
    }
}
