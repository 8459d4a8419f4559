use crate::dsp::{ParamId, ParamUnit};
use nih_plug::prelude::*;
use std::sync::Arc;

// -----------------------------------------------------------------------------
// PARAMETERS
// -----------------------------------------------------------------------------
#[derive(Params)]
pub struct DeliVerbParams {
    // Delay
    #[id = "delayTime"]
    pub delay_time: FloatParam,

    #[id = "delayRepeat"]
    pub delay_repeat: FloatParam,

    #[id = "delayMix"]
    pub delay_mix: FloatParam,

    // Reverb
    #[id = "reverbSize"]
    pub reverb_size: FloatParam,

    #[id = "reverbStyle"]
    pub reverb_style: FloatParam,

    #[id = "reverbMix"]
    pub reverb_mix: FloatParam,

    // -------------------------------------------------------------------------
    // ADVANCED
    // -------------------------------------------------------------------------
    #[id = "delayLowCut"]
    pub delay_low_cut: FloatParam,

    #[id = "delayHighCut"]
    pub delay_high_cut: FloatParam,

    #[id = "reverbLowCut"]
    pub reverb_low_cut: FloatParam,

    #[id = "reverbHighCut"]
    pub reverb_high_cut: FloatParam,

    #[id = "duckDelayAmount"]
    pub duck_delay_amount: FloatParam,

    #[id = "duckReverbAmount"]
    pub duck_reverb_amount: FloatParam,

    #[id = "duckBehaviour"]
    pub duck_behaviour: FloatParam,

    /// UI hint only.
    #[id = "advanced"]
    pub advanced: BoolParam,
}

// Helper to format values as "50%" for the DAW display
fn format_percent(v: f32) -> String {
    format!("{:.0}%", v * 100.0)
}

fn float_param(id: ParamId) -> FloatParam {
    let info = id.info();
    match info.unit {
        ParamUnit::Hertz => FloatParam::new(
            info.name,
            info.default,
            FloatRange::Skewed {
                min: info.min,
                max: info.max,
                factor: FloatRange::skew_factor(-2.0),
            },
        )
        .with_unit(info.unit.suffix()),
        ParamUnit::Milliseconds => FloatParam::new(
            info.name,
            info.default,
            FloatRange::Skewed {
                min: info.min,
                max: info.max,
                factor: FloatRange::skew_factor(-1.0),
            },
        )
        .with_unit(info.unit.suffix())
        .with_step_size(1.0),
        ParamUnit::Ratio | ParamUnit::Boolean => FloatParam::new(
            info.name,
            info.default,
            FloatRange::Linear {
                min: info.min,
                max: info.max,
            },
        )
        .with_value_to_string(Arc::new(format_percent)),
    }
}

impl Default for DeliVerbParams {
    fn default() -> Self {
        let advanced = ParamId::Advanced.info();
        Self {
            delay_time: float_param(ParamId::DelayTime),
            delay_repeat: float_param(ParamId::DelayRepeat),
            delay_mix: float_param(ParamId::DelayMix),
            reverb_size: float_param(ParamId::ReverbSize),
            reverb_style: float_param(ParamId::ReverbStyle),
            reverb_mix: float_param(ParamId::ReverbMix),
            delay_low_cut: float_param(ParamId::DelayLowCut),
            delay_high_cut: float_param(ParamId::DelayHighCut),
            reverb_low_cut: float_param(ParamId::ReverbLowCut),
            reverb_high_cut: float_param(ParamId::ReverbHighCut),
            duck_delay_amount: float_param(ParamId::DuckDelayAmount),
            duck_reverb_amount: float_param(ParamId::DuckReverbAmount),
            duck_behaviour: float_param(ParamId::DuckBehaviour),
            advanced: BoolParam::new(advanced.name, advanced.default > 0.5).non_automatable(),
        }
    }
}

impl DeliVerbParams {
    /// Current plain value of `id`, in the processor's units.
    pub fn value_of(&self, id: ParamId) -> f32 {
        match id {
            ParamId::DelayTime => self.delay_time.value(),
            ParamId::DelayRepeat => self.delay_repeat.value(),
            ParamId::DelayMix => self.delay_mix.value(),
            ParamId::ReverbSize => self.reverb_size.value(),
            ParamId::ReverbStyle => self.reverb_style.value(),
            ParamId::ReverbMix => self.reverb_mix.value(),
            ParamId::DelayLowCut => self.delay_low_cut.value(),
            ParamId::DelayHighCut => self.delay_high_cut.value(),
            ParamId::ReverbLowCut => self.reverb_low_cut.value(),
            ParamId::ReverbHighCut => self.reverb_high_cut.value(),
            ParamId::DuckDelayAmount => self.duck_delay_amount.value(),
            ParamId::DuckReverbAmount => self.duck_reverb_amount.value(),
            ParamId::DuckBehaviour => self.duck_behaviour.value(),
            ParamId::Advanced => {
                if self.advanced.value() {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}
