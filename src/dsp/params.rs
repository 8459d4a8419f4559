//! Parameter table
//!
//! The 14 host-visible controls, in their stable index order. The processor,
//! the plugin wrapper and the offline renderer all read ranges, defaults and
//! names from here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("unknown parameter id '{0}'")]
    UnknownId(String),
    #[error("parameter index {0} out of range")]
    IndexOutOfRange(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUnit {
    Milliseconds,
    Hertz,
    Ratio,
    Boolean,
}

impl ParamUnit {
    /// Display suffix for host-facing value strings.
    pub fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Ratio | ParamUnit::Boolean => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: ParamUnit,
    /// Hidden in the simple view.
    pub advanced: bool,
}

impl ParamInfo {
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(usize)]
pub enum ParamId {
    DelayTime = 0,
    DelayRepeat,
    DelayMix,
    ReverbSize,
    ReverbStyle,
    ReverbMix,
    DelayLowCut,
    DelayHighCut,
    ReverbLowCut,
    ReverbHighCut,
    DuckDelayAmount,
    DuckReverbAmount,
    DuckBehaviour,
    Advanced,
}

pub const NUM_PARAMS: usize = 14;

const PARAM_INFOS: [ParamInfo; NUM_PARAMS] = [
    ParamInfo {
        id: "delayTime",
        name: "Delay Time",
        min: 50.0,
        max: 2000.0,
        default: 300.0,
        unit: ParamUnit::Milliseconds,
        advanced: false,
    },
    ParamInfo {
        id: "delayRepeat",
        name: "Delay Repeat",
        min: 0.0,
        max: 0.95,
        default: 0.3,
        unit: ParamUnit::Ratio,
        advanced: false,
    },
    ParamInfo {
        id: "delayMix",
        name: "Delay Mix",
        min: 0.0,
        max: 1.0,
        default: 0.3,
        unit: ParamUnit::Ratio,
        advanced: false,
    },
    ParamInfo {
        id: "reverbSize",
        name: "Reverb Size",
        min: 0.0,
        max: 1.0,
        default: 0.5,
        unit: ParamUnit::Ratio,
        advanced: false,
    },
    ParamInfo {
        id: "reverbStyle",
        name: "Reverb Style",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        unit: ParamUnit::Ratio,
        advanced: false,
    },
    ParamInfo {
        id: "reverbMix",
        name: "Reverb Mix",
        min: 0.0,
        max: 1.0,
        default: 0.3,
        unit: ParamUnit::Ratio,
        advanced: false,
    },
    ParamInfo {
        id: "delayLowCut",
        name: "Delay Low Cut",
        min: 20.0,
        max: 2000.0,
        default: 80.0,
        unit: ParamUnit::Hertz,
        advanced: true,
    },
    ParamInfo {
        id: "delayHighCut",
        name: "Delay High Cut",
        min: 1000.0,
        max: 20_000.0,
        default: 8000.0,
        unit: ParamUnit::Hertz,
        advanced: true,
    },
    ParamInfo {
        id: "reverbLowCut",
        name: "Reverb Low Cut",
        min: 20.0,
        max: 2000.0,
        default: 100.0,
        unit: ParamUnit::Hertz,
        advanced: true,
    },
    ParamInfo {
        id: "reverbHighCut",
        name: "Reverb High Cut",
        min: 1000.0,
        max: 20_000.0,
        default: 10_000.0,
        unit: ParamUnit::Hertz,
        advanced: true,
    },
    ParamInfo {
        id: "duckDelayAmount",
        name: "Duck Delay",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        unit: ParamUnit::Ratio,
        advanced: true,
    },
    ParamInfo {
        id: "duckReverbAmount",
        name: "Duck Reverb",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        unit: ParamUnit::Ratio,
        advanced: true,
    },
    ParamInfo {
        id: "duckBehaviour",
        name: "Duck Behaviour",
        min: 0.0,
        max: 1.0,
        default: 0.5,
        unit: ParamUnit::Ratio,
        advanced: true,
    },
    ParamInfo {
        id: "advanced",
        name: "Advanced",
        min: 0.0,
        max: 1.0,
        default: 0.0,
        unit: ParamUnit::Boolean,
        advanced: false,
    },
];

impl ParamId {
    pub const ALL: [ParamId; NUM_PARAMS] = [
        ParamId::DelayTime,
        ParamId::DelayRepeat,
        ParamId::DelayMix,
        ParamId::ReverbSize,
        ParamId::ReverbStyle,
        ParamId::ReverbMix,
        ParamId::DelayLowCut,
        ParamId::DelayHighCut,
        ParamId::ReverbLowCut,
        ParamId::ReverbHighCut,
        ParamId::DuckDelayAmount,
        ParamId::DuckReverbAmount,
        ParamId::DuckBehaviour,
        ParamId::Advanced,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Result<ParamId, ParamError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(ParamError::IndexOutOfRange(index))
    }

    #[inline]
    pub fn info(self) -> &'static ParamInfo {
        &PARAM_INFOS[self.index()]
    }

    pub fn as_str(self) -> &'static str {
        self.info().id
    }

    pub fn default_value(self) -> f32 {
        self.info().default
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamId {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ParamError::UnknownId(s.to_string()))
    }
}
