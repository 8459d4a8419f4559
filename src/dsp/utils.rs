/// Soft-clip drive. Output is `tanh(DRIVE * x) / DRIVE`, bounded by `1 / DRIVE`.
pub const SOFT_CLIP_DRIVE: f32 = 0.9;

/// One-pole smoothing coefficient for a time constant in milliseconds.
///
/// `exp(-1 / (ms * 0.001 * sr))`. Returns 0.0 (no smoothing) when the time
/// constant or rate is not positive.
#[inline]
pub fn time_constant_coeff(ms: f32, sample_rate: f64) -> f32 {
    let samples = ms as f64 * 0.001 * sample_rate;
    if samples <= 0.0 || !samples.is_finite() {
        return 0.0;
    }
    (-1.0 / samples).exp() as f32
}

/// Output stage saturation.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    (x * SOFT_CLIP_DRIVE).tanh() / SOFT_CLIP_DRIVE
}

/// Linear magnitude to dB, floored at -240 dB.
#[inline]
pub fn lin_to_db(x: f32) -> f32 {
    20.0 * x.max(1e-12).log10()
}
