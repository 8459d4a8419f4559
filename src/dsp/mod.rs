pub mod biquad;
pub mod delay_line;
pub mod ducker;
pub mod envelope;
pub mod lfo;
pub mod params;
pub mod processor;
pub mod reverb;
pub mod utils;

pub use biquad::{Biquad, CascadedBiquad, FilterType};
pub use delay_line::DelayLine;
pub use ducker::{DuckGains, Ducker};
pub use envelope::EnvelopeFollower;
pub use lfo::Lfo;
pub use params::{ParamError, ParamId, ParamInfo, ParamUnit, NUM_PARAMS};
pub use processor::DeliVerbProcessor;
pub use reverb::Reverb;
