//! Sine LFO in the 0..1 range.
//!
//! Available for modulation experiments; nothing in the audible path reads it.

use std::f32::consts::TAU;

#[derive(Debug, Clone)]
pub struct Lfo {
    sample_rate: f64,
    rate_hz: f32,
    phase: f32,
    phase_offset: f32,
    phase_increment: f32,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Lfo {
    pub fn new() -> Self {
        let mut lfo = Self {
            sample_rate: 44_100.0,
            rate_hz: 1.0,
            phase: 0.0,
            phase_offset: 0.0,
            phase_increment: 0.0,
        };
        lfo.update_phase_increment();
        lfo
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_phase_increment();
    }

    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz;
        self.update_phase_increment();
    }

    /// Fixed offset added to the running phase, in cycles.
    pub fn set_phase_offset(&mut self, offset: f32) {
        self.phase_offset = offset;
    }

    /// Jump to `phase` (in cycles, wrapped into 0..1).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.rem_euclid(1.0);
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Current value without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        0.5 + 0.5 * (TAU * (self.phase + self.phase_offset)).sin()
    }

    /// Current value, then advance one sample.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let out = self.value();
        self.phase = (self.phase + self.phase_increment).rem_euclid(1.0);
        out
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn update_phase_increment(&mut self) {
        if self.sample_rate > 0.0 {
            self.phase_increment = (self.rate_hz as f64 / self.sample_rate) as f32;
        }
    }
}
