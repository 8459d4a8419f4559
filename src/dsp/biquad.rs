//! Biquad Filter Implementation (IIR 2nd Order)
//!
//! The filter primitive every other stage of DeliVerb is built from: the delay
//! EQ, the feedback band-limit, the reverb input bank and the comb damping all
//! reuse it.
//!
//! # Design Notes
//! - RBJ cookbook coefficients, normalized by a0
//! - Transposed Direct Form II state, kept in f64 (input/output are f32)
//! - The filter type is chosen once in `set_coefficients`; `process` never dispatches
//! - All operations are safe for the audio thread (no allocations)

use std::f64::consts::PI;

/// Denormal flush offset. Adding and removing it rounds subnormal state to
/// zero while leaving exact zeros untouched.
const DENORMAL_FLUSH: f64 = 1e-30;

/// Butterworth Q for a single 2nd-order stage.
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    Peak,
    LowShelf,
    HighShelf,
    AllPass,
}

/// Biquad filter implementation (IIR 2nd order)
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    sample_rate: f64,

    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    z1: f64,
    z2: f64,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

impl Biquad {
    /// Identity filter at 44.1 kHz.
    pub fn new() -> Self {
        Self {
            sample_rate: 44_100.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Stores the rate used by the next `set_coefficients` call.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Compute RBJ coefficients for `filter_type` at `freq` Hz.
    ///
    /// `gain_db` only matters for `Peak`, `LowShelf` and `HighShelf`.
    /// A non-positive sample rate leaves the previous coefficients in place.
    pub fn set_coefficients(&mut self, filter_type: FilterType, freq: f64, q: f64, gain_db: f64) {
        if self.sample_rate <= 0.0 {
            return;
        }

        let w0 = 2.0 * PI * freq / self.sample_rate;
        let sin_w0 = w0.sin();
        let cos_w0 = w0.cos();
        let alpha = sin_w0 / (2.0 * q);
        let a = 10.0_f64.powf(gain_db / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            FilterType::LowPass => (
                (1.0 - cos_w0) * 0.5,
                1.0 - cos_w0,
                (1.0 - cos_w0) * 0.5,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::HighPass => (
                (1.0 + cos_w0) * 0.5,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) * 0.5,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::BandPass => (
                alpha,
                0.0,
                -alpha,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::Notch => (
                1.0,
                -2.0 * cos_w0,
                1.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::Peak => (
                1.0 + alpha * a,
                -2.0 * cos_w0,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w0,
                1.0 - alpha / a,
            ),
            FilterType::LowShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterType::HighShelf => {
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w0 + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - two_sqrt_a_alpha,
                )
            }
            FilterType::AllPass => (
                1.0 - alpha,
                -2.0 * cos_w0,
                1.0 + alpha,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
        };

        let inv_a0 = 1.0 / a0;
        self.b0 = b0 * inv_a0;
        self.b1 = b1 * inv_a0;
        self.b2 = b2 * inv_a0;
        self.a1 = a1 * inv_a0;
        self.a2 = a2 * inv_a0;
    }

    /// Process a single sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let x = input as f64;
        let out = self.b0 * x + self.z1;

        self.z1 = self.b1 * x - self.a1 * out + self.z2;
        self.z2 = self.b2 * x - self.a2 * out;

        // Anti-denormal
        self.z1 += DENORMAL_FLUSH;
        self.z1 -= DENORMAL_FLUSH;
        self.z2 += DENORMAL_FLUSH;
        self.z2 -= DENORMAL_FLUSH;

        out as f32
    }

    #[inline]
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Clear the delay state. Coefficients are kept.
    #[inline]
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Take coefficients (not state) from another filter, e.g. the other
    /// channel of a stereo pair.
    pub fn copy_coefficients_from(&mut self, other: &Biquad) {
        self.b0 = other.b0;
        self.b1 = other.b1;
        self.b2 = other.b2;
        self.a1 = other.a1;
        self.a2 = other.a2;
    }

    /// Normalized coefficients as `[b0, b1, b2, a1, a2]`.
    pub fn coefficients(&self) -> [f64; 5] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }

    /// Magnitude response in dB at `freq`, evaluated on the unit circle.
    pub fn magnitude_db(&self, freq: f64) -> f64 {
        let w = 2.0 * PI * freq / self.sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        let num = num_re * num_re + num_im * num_im;
        let den = (den_re * den_re + den_im * den_im).max(1e-300);
        10.0 * (num / den).max(1e-300).log10()
    }
}

/// `STAGES` biquads in series (order `2 * STAGES`).
///
/// Used for Linkwitz-Riley crossovers: LR4 is two cascaded Butterworth stages.
#[derive(Debug, Clone, Copy)]
pub struct CascadedBiquad<const STAGES: usize> {
    stages: [Biquad; STAGES],
}

impl<const STAGES: usize> Default for CascadedBiquad<STAGES> {
    fn default() -> Self {
        Self {
            stages: [Biquad::new(); STAGES],
        }
    }
}

impl<const STAGES: usize> CascadedBiquad<STAGES> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        for stage in &mut self.stages {
            stage.set_sample_rate(sample_rate);
        }
    }

    pub fn set_linkwitz_riley_lowpass(&mut self, freq: f64) {
        for stage in &mut self.stages {
            stage.set_coefficients(FilterType::LowPass, freq, BUTTERWORTH_Q, 0.0);
        }
    }

    pub fn set_linkwitz_riley_highpass(&mut self, freq: f64) {
        for stage in &mut self.stages {
            stage.set_coefficients(FilterType::HighPass, freq, BUTTERWORTH_Q, 0.0);
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.stages
            .iter_mut()
            .fold(input, |acc, stage| stage.process(acc))
    }

    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for stage in &mut self.stages {
            stage.process_block(buffer);
        }
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    pub fn magnitude_db(&self, freq: f64) -> f64 {
        self.stages.iter().map(|s| s.magnitude_db(freq)).sum()
    }
}
