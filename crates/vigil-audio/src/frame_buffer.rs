/// Fixed-length frame assembly over a raw little-endian 16-bit PCM byte
/// stream.
///
/// Capture callbacks deliver chunks of arbitrary length; keyword engines
/// consume frames of an exact sample count. The buffer concatenates each
/// incoming chunk onto the residual left over from earlier calls, slices off
/// as many whole frames as fit, and retains the remainder. An odd trailing
/// byte is held over untouched so a sample is never split across calls.
///
/// Frames come out in byte-arrival order, with no loss or duplication across
/// calls, regardless of how the input is split.
pub struct FrameBuffer {
    frame_len_samples: usize,
    residual: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(frame_len_samples: usize) -> Self {
        assert!(frame_len_samples > 0, "frame length must be non-zero");
        Self {
            frame_len_samples,
            residual: Vec::with_capacity(frame_len_samples * 4),
        }
    }

    pub fn frame_len_samples(&self) -> usize {
        self.frame_len_samples
    }

    /// Bytes currently held over, waiting for enough input to fill a frame.
    pub fn residual_len_bytes(&self) -> usize {
        self.residual.len()
    }

    /// Append a chunk and return every complete frame now available.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<i16>> {
        self.residual.extend_from_slice(bytes);

        let frame_bytes = self.frame_len_samples * 2;
        let whole = self.residual.len() / frame_bytes;
        if whole == 0 {
            return Vec::new();
        }

        let mut frames = Vec::with_capacity(whole);
        for raw in self.residual.chunks_exact(frame_bytes).take(whole) {
            let frame: Vec<i16> = raw
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            frames.push(frame);
        }

        self.residual.drain(..whole * frame_bytes);
        frames
    }

    /// Drop any buffered remainder, e.g. when a listening session ends.
    pub fn clear(&mut self) {
        self.residual.clear();
    }
}

/// Stateful byte-to-sample converter for consumers that want every sample as
/// it arrives rather than fixed frames (the transcription recorder). Carries
/// an odd trailing byte across calls, mirroring [`FrameBuffer`].
#[derive(Default)]
pub struct SampleConverter {
    carry: Option<u8>,
}

impl SampleConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert(&mut self, bytes: &[u8]) -> Vec<i16> {
        let mut samples = Vec::with_capacity((bytes.len() + 1) / 2);
        let mut iter = bytes.iter().copied();

        if let Some(lo) = self.carry.take() {
            match iter.next() {
                Some(hi) => samples.push(i16::from_le_bytes([lo, hi])),
                None => {
                    self.carry = Some(lo);
                    return samples;
                }
            }
        }

        let mut pending: Option<u8> = None;
        for b in iter {
            match pending.take() {
                Some(lo) => samples.push(i16::from_le_bytes([lo, b])),
                None => pending = Some(b),
            }
        }
        self.carry = pending;
        samples
    }
}
