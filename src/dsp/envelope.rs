//! Peak Envelope Follower
//!
//! Asymmetric one-pole over `|x|` with separate attack and release time
//! constants. Drives the ducker.
//!
//! # Time Constants
//! - Attack 10 ms / release 100 ms by default.
//! - The `Ducker` retunes it to 5 ms / 150 ms when its rate is set.

use crate::dsp::utils::time_constant_coeff;

const DEFAULT_ATTACK_MS: f32 = 10.0;
const DEFAULT_RELEASE_MS: f32 = 100.0;

#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    sample_rate: f64,
    attack_ms: f32,
    release_ms: f32,

    attack_coeff: f32,
    release_coeff: f32,

    envelope: f32,
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeFollower {
    pub fn new() -> Self {
        let mut follower = Self {
            sample_rate: 44_100.0,
            attack_ms: DEFAULT_ATTACK_MS,
            release_ms: DEFAULT_RELEASE_MS,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: 0.0,
        };
        follower.update_coefficients();
        follower
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    pub fn set_attack_ms(&mut self, attack_ms: f32) {
        self.attack_ms = attack_ms;
        self.update_coefficients();
    }

    pub fn set_release_ms(&mut self, release_ms: f32) {
        self.release_ms = release_ms;
        self.update_coefficients();
    }

    pub fn attack_coeff(&self) -> f32 {
        self.attack_coeff
    }

    pub fn release_coeff(&self) -> f32 {
        self.release_coeff
    }

    /// Current envelope value without advancing.
    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let x_abs = input.abs();

        let coeff = if x_abs > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * x_abs;

        self.envelope
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn update_coefficients(&mut self) {
        if self.sample_rate <= 0.0 {
            return;
        }
        self.attack_coeff = time_constant_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_constant_coeff(self.release_ms, self.sample_rate);
    }
}
