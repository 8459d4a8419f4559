use anyhow::{bail, Context, Result};
use deliverb::dsp::utils::lin_to_db;
use deliverb::dsp::{DeliVerbProcessor, ParamId};
use ebur128::{EbuR128, Mode};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const USAGE: &str = "usage: deliverb_render <in.wav> <out.wav> [settings.json]";

// -----------------------------------------------------------------------------
// CONFIG
// -----------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RenderConfig {
    block_size: usize,
    /// Silence appended after the input so tails ring out.
    tail_seconds: f32,
    params: BTreeMap<String, f32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            tail_seconds: 0.0,
            params: BTreeMap::new(),
        }
    }
}

impl RenderConfig {
    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid settings '{}'", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let config: RenderConfig = serde_json::from_str(text)?;
        if config.block_size == 0 {
            bail!("block_size must be at least 1");
        }
        Ok(config)
    }

    /// Known parameters clamped to their range. Unknown ids are skipped.
    fn resolved_params(&self) -> Vec<(ParamId, f32)> {
        let mut resolved = Vec::with_capacity(self.params.len());
        for (key, &value) in &self.params {
            match key.parse::<ParamId>() {
                Ok(id) => {
                    let clamped = id.info().clamp(value);
                    if clamped != value {
                        log::warn!("{id} = {value} out of range, using {clamped}");
                    }
                    resolved.push((id, clamped));
                }
                Err(e) => log::warn!("{e}, ignoring"),
            }
        }
        resolved
    }
}

// -----------------------------------------------------------------------------
// WAV I/O
// -----------------------------------------------------------------------------
struct Input {
    sample_rate: u32,
    /// One or two channels of equal length.
    channels: Vec<Vec<f32>>,
}

impl Input {
    fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

fn read_input(path: &Path) -> Result<Input> {
    let reader = WavReader::open(path)
        .with_context(|| format!("failed to open input WAV '{}'", path.display()))?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    if !(1..=2).contains(&num_channels) {
        bail!("only mono and stereo input is supported, got {num_channels} channels");
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .context("failed to decode float samples")?,
        (SampleFormat::Int, bits @ (16 | 24 | 32)) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<f32>, _>>()
                .context("failed to decode integer samples")?
        }
        (format, bits) => bail!("unsupported sample format {format:?} at {bits} bits"),
    };

    let mut channels = vec![Vec::with_capacity(interleaved.len() / num_channels); num_channels];
    for frame in interleaved.chunks_exact(num_channels) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    Ok(Input {
        sample_rate: spec.sample_rate,
        channels,
    })
}

fn write_output(path: &Path, sample_rate: u32, left: &[f32], right: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create output WAV '{}'", path.display()))?;
    for (&l, &r) in left.iter().zip(right) {
        writer.write_sample(l)?;
        writer.write_sample(r)?;
    }
    writer.finalize().context("failed to finalize output WAV")?;
    Ok(())
}

// -----------------------------------------------------------------------------
// RENDER
// -----------------------------------------------------------------------------
fn render(
    processor: &mut DeliVerbProcessor,
    input: &Input,
    config: &RenderConfig,
) -> (Vec<f32>, Vec<f32>) {
    let tail = (config.tail_seconds.max(0.0) * input.sample_rate as f32).round() as usize;
    let total = input.frames() + tail;

    let padded: Vec<Vec<f32>> = input
        .channels
        .iter()
        .map(|c| {
            let mut padded = c.clone();
            padded.resize(total, 0.0);
            padded
        })
        .collect();

    let mut out_l = vec![0.0f32; total];
    let mut out_r = vec![0.0f32; total];
    let block = config.block_size.max(1);

    let mut start = 0;
    while start < total {
        let end = (start + block).min(total);
        match padded.as_slice() {
            [mono] => processor.process_mono(
                &mono[start..end],
                &mut out_l[start..end],
                &mut out_r[start..end],
            ),
            [left, right, ..] => processor.process_stereo(
                &left[start..end],
                &right[start..end],
                &mut out_l[start..end],
                &mut out_r[start..end],
            ),
            [] => {}
        }
        start = end;
    }

    (out_l, out_r)
}

// -----------------------------------------------------------------------------
// SUMMARY
// -----------------------------------------------------------------------------
struct Loudness {
    integrated_lufs: f64,
    true_peak_db: f32,
}

fn measure(channels: &[&[f32]], sample_rate: u32) -> Result<Loudness> {
    let mut meter = EbuR128::new(channels.len() as u32, sample_rate, Mode::I | Mode::TRUE_PEAK)
        .map_err(|e| anyhow::anyhow!("failed to create loudness meter: {e:?}"))?;

    let frames = channels.first().map_or(0, |c| c.len());
    let mut interleaved = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        for channel in channels {
            interleaved.push(channel[i]);
        }
    }
    meter
        .add_frames_f32(&interleaved)
        .map_err(|e| anyhow::anyhow!("loudness measurement failed: {e:?}"))?;

    let integrated_lufs = meter
        .loudness_global()
        .map_err(|e| anyhow::anyhow!("integrated loudness unavailable: {e:?}"))?;
    let mut true_peak = 0.0f64;
    for ch in 0..channels.len() as u32 {
        let peak = meter
            .true_peak(ch)
            .map_err(|e| anyhow::anyhow!("true peak unavailable: {e:?}"))?;
        true_peak = true_peak.max(peak);
    }

    Ok(Loudness {
        integrated_lufs,
        true_peak_db: lin_to_db(true_peak as f32),
    })
}

fn sample_peak(channels: &[&[f32]]) -> f32 {
    channels
        .iter()
        .flat_map(|c| c.iter())
        .fold(0.0f32, |m, x| m.max(x.abs()))
}

// -----------------------------------------------------------------------------
// LOGGING
// -----------------------------------------------------------------------------
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() -> Result<()> {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }

    let mut args = std::env::args().skip(1);
    let (Some(input_path), Some(output_path)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let input_path = PathBuf::from(input_path);
    let output_path = PathBuf::from(output_path);
    let config = match args.next() {
        Some(path) => RenderConfig::load(Path::new(&path))?,
        None => RenderConfig::default(),
    };

    let input = read_input(&input_path)?;
    if input.sample_rate == 0 {
        bail!("input WAV reports a sample rate of 0");
    }

    let mut processor = DeliVerbProcessor::new();
    processor.set_sample_rate(input.sample_rate as f64);
    for (id, value) in config.resolved_params() {
        processor.set_parameter(id, value);
    }

    let (out_l, out_r) = render(&mut processor, &input, &config);
    write_output(&output_path, input.sample_rate, &out_l, &out_r)?;

    let input_refs: Vec<&[f32]> = input.channels.iter().map(Vec::as_slice).collect();
    let output_refs = [out_l.as_slice(), out_r.as_slice()];
    let loudness_in = measure(&input_refs, input.sample_rate)?;
    let loudness_out = measure(&output_refs, input.sample_rate)?;

    println!("Render summary for '{}':", input_path.display());
    println!("  input frames      : {}", input.frames());
    println!("  output frames     : {}", out_l.len());
    println!("  input loudness    : {:.1} LUFS", loudness_in.integrated_lufs);
    println!("  output loudness   : {:.1} LUFS", loudness_out.integrated_lufs);
    println!("  output true peak  : {:.1} dBTP", loudness_out.true_peak_db);
    println!(
        "  output sample peak: {:.1} dBFS",
        lin_to_db(sample_peak(&output_refs))
    );
    println!("  written to        : {}", output_path.display());
    Ok(())
}
