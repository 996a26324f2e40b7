//! Split-invariance property tests for the frame buffer.
//!
//! Feeding the same byte stream under any chunking must yield identical
//! frames in identical order, with the same residual left behind.

use rand::{rngs::StdRng, Rng, SeedableRng};
use vigil_audio::FrameBuffer;

fn le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[test]
fn random_splits_match_single_push() {
    let mut rng = StdRng::seed_from_u64(0x51C0FFEE);
    let samples: Vec<i16> = (0..5000).map(|_| rng.gen()).collect();
    let bytes = le_bytes(&samples);

    let mut reference = FrameBuffer::new(160);
    let expected = reference.push(&bytes);

    for trial in 0..20 {
        let mut fb = FrameBuffer::new(160);
        let mut got = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let take = rng.gen_range(1..=700).min(bytes.len() - offset);
            got.extend(fb.push(&bytes[offset..offset + take]));
            offset += take;
        }
        assert_eq!(got, expected, "trial {}", trial);
        assert_eq!(fb.residual_len_bytes(), reference.residual_len_bytes());
    }
}

#[test]
fn frame_content_round_trips_sample_values() {
    let samples: Vec<i16> = vec![i16::MIN, -1, 0, 1, i16::MAX, 12345, -12345, 42];
    let mut fb = FrameBuffer::new(8);
    let frames = fb.push(&le_bytes(&samples));
    assert_eq!(frames, vec![samples]);
}

#[test]
fn no_frame_is_ever_short() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut fb = FrameBuffer::new(64);
    let mut total_in = 0usize;
    let mut total_out = 0usize;
    for _ in 0..200 {
        let n = rng.gen_range(0..300);
        let chunk: Vec<u8> = (0..n).map(|_| rng.gen()).collect();
        total_in += n;
        for frame in fb.push(&chunk) {
            assert_eq!(frame.len(), 64);
            total_out += frame.len() * 2;
        }
    }
    assert_eq!(total_in, total_out + fb.residual_len_bytes());
}
