//! Circular Delay Line
//!
//! Fixed-capacity float ring buffer with linearly interpolated fractional
//! reads. Shared by the echo stage, the reverb pre-delay, the allpass
//! diffusers and the comb bank.
//!
//! ## Audio Thread Safety
//! - `set_max_delay_ms()` is the only place that allocates
//! - `read()`/`write()` never resize

#[derive(Debug, Clone)]
pub struct DelayLine {
    sample_rate: f64,
    buffer: Vec<f32>,
    write_index: usize,
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayLine {
    /// Empty line at 44.1 kHz. Reads return 0 until `set_max_delay_ms`.
    pub fn new() -> Self {
        Self {
            sample_rate: 44_100.0,
            buffer: Vec::new(),
            write_index: 0,
        }
    }

    /// Stores the rate used for ms conversions. Does not reallocate.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Resize to hold `max_delay_ms` at the current rate and zero the contents.
    ///
    /// Capacity is `ceil(sr * ms / 1000) + 4`.
    pub fn set_max_delay_ms(&mut self, max_delay_ms: f32) {
        let samples = (self.sample_rate * max_delay_ms as f64 / 1000.0).ceil();
        let capacity = if samples.is_finite() && samples > 0.0 {
            samples as usize + 4
        } else {
            4
        };

        self.buffer.clear();
        self.buffer.resize(capacity, 0.0);
        self.write_index = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        if self.buffer.is_empty() {
            return;
        }
        self.buffer[self.write_index] = sample;
        self.write_index += 1;
        if self.write_index >= self.buffer.len() {
            self.write_index = 0;
        }
    }

    /// Read `delay_ms` behind the write head.
    #[inline]
    pub fn read(&self, delay_ms: f32) -> f32 {
        let delay_samples = (delay_ms as f64 * self.sample_rate / 1000.0) as f32;
        self.read_samples(delay_samples)
    }

    /// Read `delay_samples` behind the write head.
    ///
    /// The delay is clamped to `[1, capacity - 2]`: at least one sample so the
    /// slot about to be written is never read, and small enough that both
    /// interpolation taps are valid.
    #[inline]
    pub fn read_samples(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }

        let max_delay = len.saturating_sub(2).max(1) as f32;
        let delay = delay_samples.max(1.0).min(max_delay);

        let mut read_pos = self.write_index as f32 - delay;
        if read_pos < 0.0 {
            read_pos += len as f32;
        }

        let index0 = (read_pos as usize).min(len - 1);
        let index1 = if index0 + 1 >= len { 0 } else { index0 + 1 };
        let frac = read_pos - index0 as f32;

        self.buffer[index0] * (1.0 - frac) + self.buffer[index1] * frac
    }

    /// Zero the contents and rewind the write head. Keeps the allocation.
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_index = 0;
    }
}
