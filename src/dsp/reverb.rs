//! Stereo Schroeder Reverb
//!
//! Late-reflection tail for the DeliVerb reverb return.
//!
//! # Topology (per channel)
//! 1. Input bank: high-pass at `low_cut`, low-pass at `high_cut`, then a
//!    500 Hz peaking "scoop" of up to -12 dB.
//! 2. Pre-delay: `5 + 40 * size` ms, right channel 1.5 ms later.
//! 3. Four series allpass diffusers. Each stage owns ONE line shared by both
//!    channels: left reads at `d`, right at `d * 1.03`, and each channel
//!    writes back into it once per frame (left first).
//! 4. Eight parallel combs per channel, damped by a low-pass in the loop.
//!    Right reads stretch the comb delays by the stereo spread.
//! 5. Comb sum scaled by 0.25.
//!
//! # Style
//! Style raises allpass feedback, comb damping cutoff and stereo spread
//! together: 0 is a clearer "classic" room, 1 a darker wash.
//!
//! ## Audio Thread Safety
//! - All lines are sized in `set_sample_rate()`
//! - No allocations in `process()`

use crate::dsp::biquad::{Biquad, FilterType};
use crate::dsp::delay_line::DelayLine;

pub const NUM_ALLPASS: usize = 4;
pub const NUM_COMBS: usize = 8;

const ALLPASS_BASE_MS: [f32; NUM_ALLPASS] = [4.77, 5.93, 7.11, 8.17];
const COMB_BASE_MS: [f32; NUM_COMBS] = [25.31, 26.93, 28.97, 30.71, 32.83, 34.49, 36.37, 38.89];

const ALLPASS_MAX_MS: f32 = 100.0;
const COMB_MAX_MS: f32 = 200.0;
const PRE_DELAY_MAX_MS: f32 = 100.0;

/// Right-channel stretch of the allpass read taps.
const ALLPASS_RIGHT_RATIO: f32 = 1.03;
const PRE_DELAY_RIGHT_OFFSET_MS: f32 = 1.5;

/// Comb feedback ceiling; above this the damped loop can ring indefinitely.
const MAX_COMB_FEEDBACK: f32 = 0.98;

const FILTER_Q: f64 = 0.707;
const SCOOP_FREQ_HZ: f64 = 500.0;
const SCOOP_Q: f64 = 0.7;
const SCOOP_MAX_CUT_DB: f32 = -12.0;

const OUTPUT_SCALE: f32 = 0.25;

#[derive(Debug, Clone)]
pub struct Reverb {
    sample_rate: f64,

    size: f32,
    style: f32,
    low_cut_hz: f32,
    high_cut_hz: f32,
    scoop_amount: f32,

    // Derived
    allpass_delays_ms: [f32; NUM_ALLPASS],
    allpass_feedback: f32,
    comb_delays_ms: [f32; NUM_COMBS],
    comb_feedback: f32,
    damping_hz: f32,
    stereo_spread: f32,

    allpass: [DelayLine; NUM_ALLPASS],
    comb_l: [DelayLine; NUM_COMBS],
    comb_r: [DelayLine; NUM_COMBS],
    damping_l: [Biquad; NUM_COMBS],
    damping_r: [Biquad; NUM_COMBS],

    pre_delay_l: DelayLine,
    pre_delay_r: DelayLine,

    low_cut_l: Biquad,
    low_cut_r: Biquad,
    high_cut_l: Biquad,
    high_cut_r: Biquad,
    scoop_l: Biquad,
    scoop_r: Biquad,
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl Reverb {
    pub fn new() -> Self {
        let mut reverb = Self {
            sample_rate: 44_100.0,
            size: 0.5,
            style: 0.0,
            low_cut_hz: 100.0,
            high_cut_hz: 10_000.0,
            scoop_amount: 0.0,
            allpass_delays_ms: [0.0; NUM_ALLPASS],
            allpass_feedback: 0.5,
            comb_delays_ms: [0.0; NUM_COMBS],
            comb_feedback: 0.8,
            damping_hz: 4000.0,
            stereo_spread: 1.02,
            allpass: std::array::from_fn(|_| DelayLine::new()),
            comb_l: std::array::from_fn(|_| DelayLine::new()),
            comb_r: std::array::from_fn(|_| DelayLine::new()),
            damping_l: [Biquad::new(); NUM_COMBS],
            damping_r: [Biquad::new(); NUM_COMBS],
            pre_delay_l: DelayLine::new(),
            pre_delay_r: DelayLine::new(),
            low_cut_l: Biquad::new(),
            low_cut_r: Biquad::new(),
            high_cut_l: Biquad::new(),
            high_cut_r: Biquad::new(),
            scoop_l: Biquad::new(),
            scoop_r: Biquad::new(),
        };
        reverb.update_parameters();
        reverb
    }

    /// Size every line for `sample_rate` and recompute all coefficients.
    /// This is the only method that allocates.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;

        for line in &mut self.allpass {
            line.set_sample_rate(sample_rate);
            line.set_max_delay_ms(ALLPASS_MAX_MS);
        }

        for i in 0..NUM_COMBS {
            self.comb_l[i].set_sample_rate(sample_rate);
            self.comb_r[i].set_sample_rate(sample_rate);
            self.comb_l[i].set_max_delay_ms(COMB_MAX_MS);
            self.comb_r[i].set_max_delay_ms(COMB_MAX_MS);

            self.damping_l[i].set_sample_rate(sample_rate);
            self.damping_r[i].set_sample_rate(sample_rate);
        }

        for line in [&mut self.pre_delay_l, &mut self.pre_delay_r] {
            line.set_sample_rate(sample_rate);
            line.set_max_delay_ms(PRE_DELAY_MAX_MS);
        }

        for filter in [
            &mut self.low_cut_l,
            &mut self.low_cut_r,
            &mut self.high_cut_l,
            &mut self.high_cut_r,
            &mut self.scoop_l,
            &mut self.scoop_r,
        ] {
            filter.set_sample_rate(sample_rate);
        }

        self.update_parameters();
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size.clamp(0.0, 1.0);
        self.update_parameters();
    }

    pub fn set_style(&mut self, style: f32) {
        self.style = style.clamp(0.0, 1.0);
        self.update_parameters();
    }

    pub fn set_low_cut(&mut self, freq_hz: f32) {
        self.low_cut_hz = freq_hz.clamp(20.0, 2000.0);
        self.update_input_filters();
    }

    pub fn set_high_cut(&mut self, freq_hz: f32) {
        self.high_cut_hz = freq_hz.clamp(1000.0, 20_000.0);
        self.update_input_filters();
    }

    /// Depth of the 500 Hz input cut, 0..1 maps to 0..-12 dB.
    pub fn set_scoop_amount(&mut self, amount: f32) {
        self.scoop_amount = amount.clamp(0.0, 1.0);
        self.update_input_filters();
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn style(&self) -> f32 {
        self.style
    }

    pub fn low_cut(&self) -> f32 {
        self.low_cut_hz
    }

    pub fn high_cut(&self) -> f32 {
        self.high_cut_hz
    }

    pub fn scoop_amount(&self) -> f32 {
        self.scoop_amount
    }

    pub fn allpass_delays_ms(&self) -> &[f32; NUM_ALLPASS] {
        &self.allpass_delays_ms
    }

    pub fn allpass_feedback(&self) -> f32 {
        self.allpass_feedback
    }

    pub fn comb_delays_ms(&self) -> &[f32; NUM_COMBS] {
        &self.comb_delays_ms
    }

    pub fn comb_feedback(&self) -> f32 {
        self.comb_feedback
    }

    pub fn damping_hz(&self) -> f32 {
        self.damping_hz
    }

    pub fn stereo_spread(&self) -> f32 {
        self.stereo_spread
    }

    pub fn pre_delay_ms(&self) -> f32 {
        5.0 + self.size * 40.0
    }

    /// Process one stereo frame and return the wet pair.
    #[inline]
    pub fn process(&mut self, input_l: f32, input_r: f32) -> (f32, f32) {
        // 1. Input bank
        let filtered_l = self
            .scoop_l
            .process(self.high_cut_l.process(self.low_cut_l.process(input_l)));
        let filtered_r = self
            .scoop_r
            .process(self.high_cut_r.process(self.low_cut_r.process(input_r)));

        // 2. Pre-delay
        let pre_delay_ms = self.pre_delay_ms();
        self.pre_delay_l.write(filtered_l);
        self.pre_delay_r.write(filtered_r);
        let mut diff_l = self.pre_delay_l.read(pre_delay_ms);
        let mut diff_r = self
            .pre_delay_r
            .read(pre_delay_ms + PRE_DELAY_RIGHT_OFFSET_MS);

        // 3. Series diffusion, shared line per stage
        for (line, &delay_ms) in self.allpass.iter_mut().zip(&self.allpass_delays_ms) {
            diff_l = Self::process_allpass(line, diff_l, delay_ms, self.allpass_feedback);
            diff_r = Self::process_allpass(
                line,
                diff_r,
                delay_ms * ALLPASS_RIGHT_RATIO,
                self.allpass_feedback,
            );
        }

        // 4. Parallel damped combs
        let mut sum_l = 0.0f32;
        let mut sum_r = 0.0f32;
        for i in 0..NUM_COMBS {
            let delay_ms = self.comb_delays_ms[i];

            let out_l = self.damping_l[i].process(self.comb_l[i].read(delay_ms));
            self.comb_l[i].write(diff_l + out_l * self.comb_feedback);
            sum_l += out_l;

            let out_r = self.damping_r[i].process(self.comb_r[i].read(delay_ms * self.stereo_spread));
            self.comb_r[i].write(diff_r + out_r * self.comb_feedback);
            sum_r += out_r;
        }

        (sum_l * OUTPUT_SCALE, sum_r * OUTPUT_SCALE)
    }

    /// Zero every line and filter state. Parameters are kept.
    pub fn reset(&mut self) {
        for line in &mut self.allpass {
            line.reset();
        }
        for i in 0..NUM_COMBS {
            self.comb_l[i].reset();
            self.comb_r[i].reset();
            self.damping_l[i].reset();
            self.damping_r[i].reset();
        }
        self.pre_delay_l.reset();
        self.pre_delay_r.reset();
        for filter in [
            &mut self.low_cut_l,
            &mut self.low_cut_r,
            &mut self.high_cut_l,
            &mut self.high_cut_r,
            &mut self.scoop_l,
            &mut self.scoop_r,
        ] {
            filter.reset();
        }
    }

    #[inline]
    fn process_allpass(line: &mut DelayLine, input: f32, delay_ms: f32, feedback: f32) -> f32 {
        let delayed = line.read(delay_ms);
        line.write(input + delayed * feedback);
        delayed - input
    }

    fn update_parameters(&mut self) {
        let size_scale = 0.5 + self.size * 1.5;

        for (delay, base) in self.allpass_delays_ms.iter_mut().zip(ALLPASS_BASE_MS) {
            *delay = base * size_scale;
        }
        self.allpass_feedback = 0.5 + self.style * 0.25;

        for (delay, base) in self.comb_delays_ms.iter_mut().zip(COMB_BASE_MS) {
            *delay = base * size_scale;
        }
        self.comb_feedback = (0.7 + self.size * 0.25).min(MAX_COMB_FEEDBACK);

        self.damping_hz = 4000.0 + self.style * 8000.0;
        self.damping_l[0].set_coefficients(FilterType::LowPass, self.damping_hz as f64, FILTER_Q, 0.0);
        let shared = self.damping_l[0];
        for filter in self.damping_l.iter_mut().chain(self.damping_r.iter_mut()) {
            filter.copy_coefficients_from(&shared);
        }

        self.stereo_spread = 1.02 + self.style * 0.02;

        self.update_input_filters();
    }

    fn update_input_filters(&mut self) {
        let low_cut = self.low_cut_hz as f64;
        let high_cut = self.high_cut_hz as f64;
        let scoop_db = (self.scoop_amount * SCOOP_MAX_CUT_DB) as f64;

        self.low_cut_l
            .set_coefficients(FilterType::HighPass, low_cut, FILTER_Q, 0.0);
        self.high_cut_l
            .set_coefficients(FilterType::LowPass, high_cut, FILTER_Q, 0.0);
        self.scoop_l
            .set_coefficients(FilterType::Peak, SCOOP_FREQ_HZ, SCOOP_Q, scoop_db);

        self.low_cut_r.copy_coefficients_from(&self.low_cut_l);
        self.high_cut_r.copy_coefficients_from(&self.high_cut_l);
        self.scoop_r.copy_coefficients_from(&self.scoop_l);
    }
}
