//! DeliVerb processor
//!
//! Stereo delay feeding a Schroeder reverb, with input-driven ducking of both
//! returns and a soft-clipped output.
//!
//! # Signal flow (per frame)
//! ```text
//! dry ──┬──────────────────────────────────────────────┬─► mix ─► soft clip
//!       ├─► ducker ─► (delay gain, reverb gain)         │
//!       ├─► delay line ─► HP ─► LP ─┬─► × delay gain ───┤
//!       │        ▲                  └─► 12 kHz LP × repeat
//!       │        └──── dry + feedback
//!       └─► (+ delay wet when style > 0.3) ─► reverb ─► × reverb gain
//! ```
//!
//! The delay line stores the raw dry signal plus filtered feedback; the EQ is
//! applied on the read tap only.
//!
//! `set_sample_rate` is the only allocating call. The `process_*` methods never
//! allocate, lock, or recompute coefficients.

use crate::dsp::biquad::{Biquad, FilterType};
use crate::dsp::delay_line::DelayLine;
use crate::dsp::ducker::Ducker;
use crate::dsp::params::{ParamId, NUM_PARAMS};
use crate::dsp::reverb::Reverb;
use crate::dsp::utils::soft_clip;

/// Delay buffer length; covers the 2000 ms maximum plus the right-channel offset.
const MAX_DELAY_MS: f32 = 2100.0;
const RIGHT_DELAY_OFFSET_MS: f32 = 2.0;

const DELAY_FILTER_Q: f64 = 0.707;
const FEEDBACK_LIMIT_HZ: f64 = 12_000.0;

/// Style above which part of the delay return is sent into the reverb.
const STYLE_SEND_THRESHOLD: f32 = 0.3;
const STYLE_SEND_MAX: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct DeliVerbProcessor {
    sample_rate: f64,

    delay_time_ms: f32,
    delay_repeat: f32,
    delay_mix: f32,
    reverb_size: f32,
    reverb_style: f32,
    reverb_mix: f32,
    delay_low_cut_hz: f32,
    delay_high_cut_hz: f32,
    reverb_low_cut_hz: f32,
    reverb_high_cut_hz: f32,
    duck_delay_amount: f32,
    duck_reverb_amount: f32,
    duck_behaviour: f32,
    advanced: bool,

    delay_l: DelayLine,
    delay_r: DelayLine,
    delay_low_cut_l: Biquad,
    delay_low_cut_r: Biquad,
    delay_high_cut_l: Biquad,
    delay_high_cut_r: Biquad,
    feedback_filter_l: Biquad,
    feedback_filter_r: Biquad,

    reverb: Reverb,
    ducker: Ducker,
}

impl Default for DeliVerbProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliVerbProcessor {
    pub fn new() -> Self {
        let mut processor = Self {
            sample_rate: 44_100.0,

            delay_time_ms: ParamId::DelayTime.default_value(),
            delay_repeat: ParamId::DelayRepeat.default_value(),
            delay_mix: ParamId::DelayMix.default_value(),
            reverb_size: ParamId::ReverbSize.default_value(),
            reverb_style: ParamId::ReverbStyle.default_value(),
            reverb_mix: ParamId::ReverbMix.default_value(),
            delay_low_cut_hz: ParamId::DelayLowCut.default_value(),
            delay_high_cut_hz: ParamId::DelayHighCut.default_value(),
            reverb_low_cut_hz: ParamId::ReverbLowCut.default_value(),
            reverb_high_cut_hz: ParamId::ReverbHighCut.default_value(),
            duck_delay_amount: ParamId::DuckDelayAmount.default_value(),
            duck_reverb_amount: ParamId::DuckReverbAmount.default_value(),
            duck_behaviour: ParamId::DuckBehaviour.default_value(),
            advanced: false,

            delay_l: DelayLine::new(),
            delay_r: DelayLine::new(),
            delay_low_cut_l: Biquad::new(),
            delay_low_cut_r: Biquad::new(),
            delay_high_cut_l: Biquad::new(),
            delay_high_cut_r: Biquad::new(),
            feedback_filter_l: Biquad::new(),
            feedback_filter_r: Biquad::new(),

            reverb: Reverb::new(),
            ducker: Ducker::new(),
        };
        processor.update_parameters();
        processor
    }

    /// Prepare every component for `sample_rate`. Allocates all delay buffers.
    ///
    /// Non-positive or non-finite rates are rejected and leave the processor
    /// untouched.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if !(sample_rate > 0.0 && sample_rate.is_finite()) {
            log::warn!("ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;

        self.delay_l.set_sample_rate(sample_rate);
        self.delay_r.set_sample_rate(sample_rate);
        self.delay_l.set_max_delay_ms(MAX_DELAY_MS);
        self.delay_r.set_max_delay_ms(MAX_DELAY_MS);

        self.reverb.set_sample_rate(sample_rate);
        self.ducker.set_sample_rate(sample_rate);

        self.delay_low_cut_l.set_sample_rate(sample_rate);
        self.delay_low_cut_r.set_sample_rate(sample_rate);
        self.delay_high_cut_l.set_sample_rate(sample_rate);
        self.delay_high_cut_r.set_sample_rate(sample_rate);

        self.feedback_filter_l.set_sample_rate(sample_rate);
        self.feedback_filter_l.set_coefficients(
            FilterType::LowPass,
            FEEDBACK_LIMIT_HZ,
            DELAY_FILTER_Q,
            0.0,
        );
        self.feedback_filter_r
            .copy_coefficients_from(&self.feedback_filter_l);
        self.feedback_filter_r.set_sample_rate(sample_rate);

        self.update_parameters();

        log::debug!(
            "prepared at {sample_rate} Hz, delay capacity {} samples",
            self.delay_l.capacity()
        );
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Store `value` and recompute derived state.
    ///
    /// Values are stored as given; the reverb and ducker clamp their own
    /// inputs. `Advanced` is true for values above 0.5.
    pub fn set_parameter(&mut self, id: ParamId, value: f32) {
        match id {
            ParamId::DelayTime => self.delay_time_ms = value,
            ParamId::DelayRepeat => self.delay_repeat = value,
            ParamId::DelayMix => self.delay_mix = value,
            ParamId::ReverbSize => self.reverb_size = value,
            ParamId::ReverbStyle => self.reverb_style = value,
            ParamId::ReverbMix => self.reverb_mix = value,
            ParamId::DelayLowCut => self.delay_low_cut_hz = value,
            ParamId::DelayHighCut => self.delay_high_cut_hz = value,
            ParamId::ReverbLowCut => self.reverb_low_cut_hz = value,
            ParamId::ReverbHighCut => self.reverb_high_cut_hz = value,
            ParamId::DuckDelayAmount => self.duck_delay_amount = value,
            ParamId::DuckReverbAmount => self.duck_reverb_amount = value,
            ParamId::DuckBehaviour => self.duck_behaviour = value,
            ParamId::Advanced => self.advanced = value > 0.5,
        }
        self.update_parameters();
    }

    pub fn get_parameter(&self, id: ParamId) -> f32 {
        match id {
            ParamId::DelayTime => self.delay_time_ms,
            ParamId::DelayRepeat => self.delay_repeat,
            ParamId::DelayMix => self.delay_mix,
            ParamId::ReverbSize => self.reverb_size,
            ParamId::ReverbStyle => self.reverb_style,
            ParamId::ReverbMix => self.reverb_mix,
            ParamId::DelayLowCut => self.delay_low_cut_hz,
            ParamId::DelayHighCut => self.delay_high_cut_hz,
            ParamId::ReverbLowCut => self.reverb_low_cut_hz,
            ParamId::ReverbHighCut => self.reverb_high_cut_hz,
            ParamId::DuckDelayAmount => self.duck_delay_amount,
            ParamId::DuckReverbAmount => self.duck_reverb_amount,
            ParamId::DuckBehaviour => self.duck_behaviour,
            ParamId::Advanced => {
                if self.advanced {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Snapshot of all parameter values in index order.
    pub fn parameters(&self) -> [f32; NUM_PARAMS] {
        let mut values = [0.0; NUM_PARAMS];
        for id in ParamId::ALL {
            values[id.index()] = self.get_parameter(id);
        }
        values
    }

    /// Mid scoop on the reverb input. Not part of the host parameter set.
    pub fn set_reverb_scoop(&mut self, amount: f32) {
        self.reverb.set_scoop_amount(amount);
    }

    pub fn reverb(&self) -> &Reverb {
        &self.reverb
    }

    /// Render `min(len)` frames from separate input and output buffers.
    pub fn process_stereo(
        &mut self,
        input_l: &[f32],
        input_r: &[f32],
        output_l: &mut [f32],
        output_r: &mut [f32],
    ) {
        let frames = input_l
            .iter()
            .zip(input_r.iter())
            .zip(output_l.iter_mut().zip(output_r.iter_mut()));
        for ((&dry_l, &dry_r), (out_l, out_r)) in frames {
            let (l, r) = self.process_frame(dry_l, dry_r);
            *out_l = l;
            *out_r = r;
        }
    }

    /// Stereo render where the output overwrites the input.
    pub fn process_stereo_in_place(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = self.process_frame(*l, *r);
            *l = out_l;
            *r = out_r;
        }
    }

    /// Mono input, stereo output.
    pub fn process_mono(&mut self, input: &[f32], output_l: &mut [f32], output_r: &mut [f32]) {
        for (&dry, (out_l, out_r)) in input
            .iter()
            .zip(output_l.iter_mut().zip(output_r.iter_mut()))
        {
            let (l, r) = self.process_frame(dry, dry);
            *out_l = l;
            *out_r = r;
        }
    }

    /// Mono render where `left` holds the input and receives the left output.
    pub fn process_mono_in_place(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (out_l, out_r) = self.process_frame(*l, *l);
            *l = out_l;
            *r = out_r;
        }
    }

    /// Zero every delay line, filter state and the ducker envelope.
    pub fn reset(&mut self) {
        self.delay_l.reset();
        self.delay_r.reset();
        self.reverb.reset();
        self.ducker.reset();
        self.delay_low_cut_l.reset();
        self.delay_low_cut_r.reset();
        self.delay_high_cut_l.reset();
        self.delay_high_cut_r.reset();
        self.feedback_filter_l.reset();
        self.feedback_filter_r.reset();
    }

    #[inline]
    fn process_frame(&mut self, dry_l: f32, dry_r: f32) -> (f32, f32) {
        let gains = self.ducker.process(dry_l, dry_r);

        // Delay: read, EQ the tap, then write dry plus filtered feedback
        let mut delayed_l = self.delay_l.read(self.delay_time_ms);
        let mut delayed_r = self
            .delay_r
            .read(self.delay_time_ms + RIGHT_DELAY_OFFSET_MS);

        delayed_l = self.delay_low_cut_l.process(delayed_l);
        delayed_l = self.delay_high_cut_l.process(delayed_l);
        delayed_r = self.delay_low_cut_r.process(delayed_r);
        delayed_r = self.delay_high_cut_r.process(delayed_r);

        let delay_wet_l = delayed_l * gains.delay;
        let delay_wet_r = delayed_r * gains.delay;

        let feedback_l = self.feedback_filter_l.process(delayed_l) * self.delay_repeat;
        let feedback_r = self.feedback_filter_r.process(delayed_r) * self.delay_repeat;
        self.delay_l.write(dry_l + feedback_l);
        self.delay_r.write(dry_r + feedback_r);

        // Reverb, with part of the delay return on the atmospheric side
        let mut reverb_in_l = dry_l;
        let mut reverb_in_r = dry_r;
        if self.reverb_style > STYLE_SEND_THRESHOLD {
            let send = (self.reverb_style - STYLE_SEND_THRESHOLD) / (1.0 - STYLE_SEND_THRESHOLD)
                * STYLE_SEND_MAX;
            reverb_in_l += delay_wet_l * send;
            reverb_in_r += delay_wet_r * send;
        }

        let (reverb_l, reverb_r) = self.reverb.process(reverb_in_l, reverb_in_r);
        let reverb_wet_l = reverb_l * gains.reverb;
        let reverb_wet_r = reverb_r * gains.reverb;

        let with_delay_l = dry_l + delay_wet_l * self.delay_mix;
        let with_delay_r = dry_r + delay_wet_r * self.delay_mix;

        let out_l = with_delay_l * (1.0 - self.reverb_mix)
            + (with_delay_l + reverb_wet_l) * self.reverb_mix;
        let out_r = with_delay_r * (1.0 - self.reverb_mix)
            + (with_delay_r + reverb_wet_r) * self.reverb_mix;

        (soft_clip(out_l), soft_clip(out_r))
    }

    fn update_parameters(&mut self) {
        self.reverb.set_size(self.reverb_size);
        self.reverb.set_style(self.reverb_style);
        self.reverb.set_low_cut(self.reverb_low_cut_hz);
        self.reverb.set_high_cut(self.reverb_high_cut_hz);

        self.delay_low_cut_l.set_coefficients(
            FilterType::HighPass,
            self.delay_low_cut_hz as f64,
            DELAY_FILTER_Q,
            0.0,
        );
        self.delay_low_cut_r
            .copy_coefficients_from(&self.delay_low_cut_l);
        self.delay_high_cut_l.set_coefficients(
            FilterType::LowPass,
            self.delay_high_cut_hz as f64,
            DELAY_FILTER_Q,
            0.0,
        );
        self.delay_high_cut_r
            .copy_coefficients_from(&self.delay_high_cut_l);

        self.ducker.set_delay_amount(self.duck_delay_amount);
        self.ducker.set_reverb_amount(self.duck_reverb_amount);
        self.ducker.set_behaviour(self.duck_behaviour);
    }
}
