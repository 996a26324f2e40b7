/// Display gain applied to the normalized RMS before clamping. Raw speech
/// RMS rarely exceeds a quarter of full scale, so an unscaled meter looks
/// dead; the host expects a 0..1 value that visibly moves.
const LEVEL_DISPLAY_GAIN: f32 = 4.0;

/// Normalized RMS amplitude of a sample chunk, scaled for UI display and
/// clamped to `0.0..=1.0`. Empty input reports silence.
pub fn rms_level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    let rms = (sum / samples.len() as f64).sqrt();
    let normalized = (rms / i16::MAX as f64) as f32;
    (normalized * LEVEL_DISPLAY_GAIN).clamp(0.0, 1.0)
}
