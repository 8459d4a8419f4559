mod debug;
pub mod dsp;
mod params;

use crate::debug::DiagLog;
use crate::dsp::{DeliVerbProcessor, ParamId};
use nih_plug::prelude::*;
pub use params::DeliVerbParams;
use std::sync::Arc;

// -----------------------------------------------------------------------------
// PLUGIN STRUCT
// -----------------------------------------------------------------------------
pub struct DeliVerbPlugin {
    params: Arc<DeliVerbParams>,
    processor: DeliVerbProcessor,
    // Mono-to-stereo layout: channel 0 carries the input
    mono_input: bool,
    diag: Arc<DiagLog>,
}

/// Work the audio thread hands off to the host's background executor.
pub enum DeliVerbTask {
    FlushDiagnostics,
}

impl Default for DeliVerbPlugin {
    fn default() -> Self {
        Self {
            params: Arc::new(DeliVerbParams::default()),
            processor: DeliVerbProcessor::new(),
            mono_input: false,
            diag: Arc::new(DiagLog::new(cfg!(feature = "debug"))),
        }
    }
}

impl Plugin for DeliVerbPlugin {
    const NAME: &'static str = "DeliVerb";
    const VENDOR: &'static str = "DeliVerb";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = DeliVerbTask;

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn task_executor(&mut self) -> TaskExecutor<Self> {
        let diag = self.diag.clone();
        Box::new(move |task| match task {
            DeliVerbTask::FlushDiagnostics => {
                if let Err(err) = diag.drain_to_file() {
                    log::warn!("could not write {}: {err}", crate::debug::LOG_PATH);
                }
            }
        })
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        context: &mut impl InitContext<Self>,
    ) -> bool {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.mono_input = audio_io_layout
                .main_input_channels
                .map(|c| c.get() == 1)
                .unwrap_or(false);

            // All delay and reverb buffers are allocated here
            self.processor
                .set_sample_rate(buffer_config.sample_rate as f64);
            for id in ParamId::ALL {
                self.processor.set_parameter(id, self.params.value_of(id));
            }

            dv_log!(
                self.diag,
                "initialize: sr={} max_block={} mono_input={}",
                buffer_config.sample_rate,
                buffer_config.max_buffer_size,
                self.mono_input
            );
            context.execute(DeliVerbTask::FlushDiagnostics);

            true
        }))
        .unwrap_or(false)
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.process_internal(buffer, context)
        }))
        .unwrap_or(ProcessStatus::Normal)
    }

    fn reset(&mut self) {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.processor.reset();
        }))
        .unwrap_or(());
    }
}

impl DeliVerbPlugin {
    /// Push host values that changed since the last block into the processor.
    /// Returns whether anything changed.
    fn sync_parameters(&mut self) -> bool {
        let mut changed = false;
        for id in ParamId::ALL {
            let value = self.params.value_of(id);
            if value != self.processor.get_parameter(id) {
                dv_log!(self.diag, "param {} -> {}", id, value);
                self.processor.set_parameter(id, value);
                changed = true;
            }
        }
        changed
    }

    fn process_internal(
        &mut self,
        buffer: &mut Buffer,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        if self.sync_parameters() && self.diag.is_enabled() {
            context.execute_background(DeliVerbTask::FlushDiagnostics);
        }

        let mono_input = self.mono_input;
        if let [left, right, ..] = buffer.as_slice() {
            if mono_input {
                self.processor.process_mono_in_place(left, right);
            } else {
                self.processor.process_stereo_in_place(left, right);
            }
        }

        ProcessStatus::Normal
    }
}

impl ClapPlugin for DeliVerbPlugin {
    const CLAP_ID: &'static str = "com.deliverb.deliverb";
    const CLAP_DESCRIPTION: Option<&'static str> = Some("Stereo delay into reverb with ducking");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Delay,
        ClapFeature::Reverb,
        ClapFeature::Stereo,
    ];
}

impl Vst3Plugin for DeliVerbPlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"DeliVerbDelayRev";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Delay,
        Vst3SubCategory::Reverb,
    ];
}

nih_export_clap!(DeliVerbPlugin);
nih_export_vst3!(DeliVerbPlugin);
