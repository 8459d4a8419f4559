//! Wet-Signal Ducker
//!
//! Turns the stereo input level into a pair of gains for the delay and reverb
//! returns.
//!
//! # Behaviour control
//! - **0.0**: duck the delay while playing, swell the reverb as the input decays.
//! - **0.5**: duck both equally, with a proportional swell.
//! - **1.0**: duck the reverb while playing, swell the delay.
//!
//! With both amounts at zero the gains are exactly 1.0.

use crate::dsp::envelope::EnvelopeFollower;

const DUCK_ATTACK_MS: f32 = 5.0;
const DUCK_RELEASE_MS: f32 = 150.0;

/// Envelope scale that maps typical program level to full ducking.
const ENVELOPE_SCALE: f32 = 4.0;

/// Swell depth relative to the duck amount.
const SWELL_DEPTH: f32 = 0.3;

/// Gains for one frame, both in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuckGains {
    pub delay: f32,
    pub reverb: f32,
}

impl DuckGains {
    pub const UNITY: DuckGains = DuckGains {
        delay: 1.0,
        reverb: 1.0,
    };
}

#[derive(Debug, Clone)]
pub struct Ducker {
    follower: EnvelopeFollower,
    delay_amount: f32,
    reverb_amount: f32,
    behaviour: f32,
}

impl Default for Ducker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ducker {
    pub fn new() -> Self {
        Self {
            follower: EnvelopeFollower::new(),
            delay_amount: 0.0,
            reverb_amount: 0.0,
            behaviour: 0.5,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.follower.set_sample_rate(sample_rate);
        self.follower.set_attack_ms(DUCK_ATTACK_MS);
        self.follower.set_release_ms(DUCK_RELEASE_MS);
    }

    pub fn set_delay_amount(&mut self, amount: f32) {
        self.delay_amount = amount.clamp(0.0, 1.0);
    }

    pub fn set_reverb_amount(&mut self, amount: f32) {
        self.reverb_amount = amount.clamp(0.0, 1.0);
    }

    pub fn set_behaviour(&mut self, behaviour: f32) {
        self.behaviour = behaviour.clamp(0.0, 1.0);
    }

    pub fn delay_amount(&self) -> f32 {
        self.delay_amount
    }

    pub fn reverb_amount(&self) -> f32 {
        self.reverb_amount
    }

    pub fn behaviour(&self) -> f32 {
        self.behaviour
    }

    #[inline]
    pub fn process(&mut self, input_l: f32, input_r: f32) -> DuckGains {
        let env = self
            .follower
            .process((input_l.abs() + input_r.abs()) * 0.5);
        let norm_env = (env * ENVELOPE_SCALE).min(1.0);

        let delay_duck_factor = 1.0 - self.behaviour;
        let reverb_duck_factor = self.behaviour;

        let delay_duck = norm_env * delay_duck_factor * self.delay_amount;
        let reverb_duck = norm_env * reverb_duck_factor * self.reverb_amount;

        // Whatever is not ducked swells back as the input falls away
        let inv_env = 1.0 - norm_env;
        let delay_swell = inv_env * (1.0 - delay_duck_factor) * self.delay_amount * SWELL_DEPTH;
        let reverb_swell = inv_env * (1.0 - reverb_duck_factor) * self.reverb_amount * SWELL_DEPTH;

        DuckGains {
            delay: (1.0 - delay_duck + delay_swell).clamp(0.0, 1.0),
            reverb: (1.0 - reverb_duck + reverb_swell).clamp(0.0, 1.0),
        }
    }

    pub fn reset(&mut self) {
        self.follower.reset();
    }
}
