//! Shared signal generators and measurements for the integration tests.

#![allow(dead_code)]

use deliverb::dsp::{DeliVerbProcessor, ParamId};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const SAMPLE_RATE: f64 = 48_000.0;
pub const SAMPLE_RATE_USIZE: usize = 48_000;
pub const BLOCK_SIZE: usize = 512;

/// Soft-clip ceiling plus float slack.
pub const OUTPUT_BOUND: f32 = 1.112;

// ---------------------------------------------------------------------------
// Processor helpers
// ---------------------------------------------------------------------------

/// Processor prepared at 48 kHz with `params` applied on top of the defaults.
pub fn processor(params: &[(ParamId, f32)]) -> DeliVerbProcessor {
    let mut p = DeliVerbProcessor::new();
    p.set_sample_rate(SAMPLE_RATE);
    for &(id, value) in params {
        p.set_parameter(id, value);
    }
    p
}

/// Render a stereo signal in host-sized blocks.
pub fn render(p: &mut DeliVerbProcessor, left: &[f32], right: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let n = left.len().min(right.len());
    let mut out_l = vec![0.0; n];
    let mut out_r = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let end = (start + BLOCK_SIZE).min(n);
        p.process_stereo(
            &left[start..end],
            &right[start..end],
            &mut out_l[start..end],
            &mut out_r[start..end],
        );
        start = end;
    }
    (out_l, out_r)
}

/// Render a mono signal to stereo in host-sized blocks.
pub fn render_mono(p: &mut DeliVerbProcessor, input: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut out_l = vec![0.0; input.len()];
    let mut out_r = vec![0.0; input.len()];
    for ((chunk, l), r) in input
        .chunks(BLOCK_SIZE)
        .zip(out_l.chunks_mut(BLOCK_SIZE))
        .zip(out_r.chunks_mut(BLOCK_SIZE))
    {
        p.process_mono(chunk, l, r);
    }
    (out_l, out_r)
}

pub fn soft_clip(x: f32) -> f32 {
    (0.9 * x).tanh() / 0.9
}

// ---------------------------------------------------------------------------
// Signal generators
// ---------------------------------------------------------------------------

pub fn impulse(n: usize) -> Vec<f32> {
    let mut buf = vec![0.0; n];
    if n > 0 {
        buf[0] = 1.0;
    }
    buf
}

pub fn silence(n: usize) -> Vec<f32> {
    vec![0.0; n]
}

pub fn sine(freq_hz: f64, amplitude: f32, n: usize, sample_rate: f64) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            amplitude * (2.0 * std::f64::consts::PI * freq_hz * t).sin() as f32
        })
        .collect()
}

/// Sine burst of `n` samples under a Hann envelope.
pub fn hann_burst(freq_hz: f64, amplitude: f32, n: usize, sample_rate: f64) -> Vec<f32> {
    sine(freq_hz, amplitude, n, sample_rate)
        .into_iter()
        .enumerate()
        .map(|(i, x)| {
            let w = 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos();
            x * w as f32
        })
        .collect()
}

/// Uniform white noise in `[-1, 1)` from a fixed-seed LCG.
pub fn white_noise(n: usize, seed: u32) -> Vec<f32> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
        })
        .collect()
}

/// Pink noise (Kellet economy filter over `white_noise`) scaled to `rms_target`.
pub fn pink_noise(n: usize, seed: u32, rms_target: f32) -> Vec<f32> {
    let (mut b0, mut b1, mut b2) = (0.0f32, 0.0f32, 0.0f32);
    let pink: Vec<f32> = white_noise(n, seed)
        .into_iter()
        .map(|x| {
            b0 = 0.99765 * b0 + x * 0.099_046;
            b1 = 0.963 * b1 + x * 0.296_516_4;
            b2 = 0.57 * b2 + x * 1.052_691_3;
            b0 + b1 + b2 + x * 0.1848
        })
        .collect();
    let scale = rms_target / rms(&pink).max(1e-12);
    pink.into_iter().map(|x| x * scale).collect()
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

pub fn rms(buf: &[f32]) -> f32 {
    if buf.is_empty() {
        return 0.0;
    }
    (buf.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>() / buf.len() as f64).sqrt() as f32
}

pub fn peak(buf: &[f32]) -> f32 {
    buf.iter().fold(0.0f32, |m, x| m.max(x.abs()))
}

pub fn to_db(x: f32) -> f32 {
    20.0 * x.max(1e-30).log10()
}

/// RMS of consecutive, non-overlapping windows. A trailing partial window is dropped.
pub fn windowed_rms(buf: &[f32], window: usize) -> Vec<f32> {
    buf.chunks_exact(window).map(rms).collect()
}

/// Index of the largest `|x|` in `buf[range]`, as an absolute index.
pub fn argmax_abs(buf: &[f32], range: std::ops::Range<usize>) -> usize {
    let start = range.start;
    buf[range]
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |(bi, bv), (i, x)| {
            if x.abs() > bv {
                (i, x.abs())
            } else {
                (bi, bv)
            }
        })
        .0
        + start
}

/// Hann-windowed magnitude spectrum, bins `0..n/2`.
pub fn magnitude_spectrum(buf: &[f32]) -> Vec<f32> {
    let n = buf.len();
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    let mut data: Vec<Complex<f32>> = buf
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let w = 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos();
            Complex::new(x * w, 0.0)
        })
        .collect();
    fft.process(&mut data);
    data[..n / 2].iter().map(|c| c.norm()).collect()
}

/// Frequency that falls exactly on an FFT bin of size `n`.
pub fn bin_frequency(freq_hz: f64, n: usize, sample_rate: f64) -> f64 {
    let bin_width = sample_rate / n as f64;
    (freq_hz / bin_width).round() * bin_width
}

/// Peak magnitude within one bin of `freq_hz`.
pub fn magnitude_at(spectrum: &[f32], freq_hz: f64, n: usize, sample_rate: f64) -> f32 {
    let bin = (freq_hz * n as f64 / sample_rate).round() as usize;
    let lo = bin.saturating_sub(1);
    let hi = (bin + 1).min(spectrum.len() - 1);
    spectrum[lo..=hi].iter().fold(0.0f32, |m, &x| m.max(x))
}
