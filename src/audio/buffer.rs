//! Decoded multi-channel PCM

use ndarray::{s, Array2, ArrayView1, Axis};
use crate::error::{AudioForgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    Int8,
    Int16,
    Int24,
    Int32,
    Float32,
    Float64,
}

impl SampleFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::Int8 => "int8",
            SampleFormat::Int16 => "int16",
            SampleFormat::Int24 => "int24",
            SampleFormat::Int32 => "int32",
            SampleFormat::Float32 => "float32",
            SampleFormat::Float64 => "float64",
        }
    }

    pub fn bits(&self) -> u16 {
        match self {
            SampleFormat::Int8 => 8,
            SampleFormat::Int16 => 16,
            SampleFormat::Int24 => 24,
            SampleFormat::Int32 | SampleFormat::Float32 => 32,
            SampleFormat::Float64 => 64,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SampleFormat::Float32 | SampleFormat::Float64)
    }

    /// Integer format of the given width.
    pub fn int_from_bits(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(SampleFormat::Int8),
            16 => Some(SampleFormat::Int16),
            24 => Some(SampleFormat::Int24),
            32 => Some(SampleFormat::Int32),
            _ => None,
        }
    }

    /// Full-scale integer magnitude, `2^(bits-1)`. `None` for float formats.
    pub fn int_scale(&self) -> Option<f64> {
        if self.is_float() {
            None
        } else {
            Some((1u64 << (self.bits() - 1)) as f64)
        }
    }

    /// Size of one quantization step in normalized units.
    pub fn lsb(&self) -> Option<f64> {
        self.int_scale().map(|scale| 1.0 / scale)
    }

    /// Valid normalized range for this format.
    pub fn range(&self) -> (f64, f64) {
        match self.int_scale() {
            Some(scale) => (-1.0, (scale - 1.0) / scale),
            None => (-1.0, 1.0),
        }
    }

    /// Clamp into range and snap onto this format's sample grid.
    pub fn quantize(&self, value: f64) -> f64 {
        let value = if value.is_finite() { value } else { 0.0 };
        match self {
            SampleFormat::Float64 => value.clamp(-1.0, 1.0),
            SampleFormat::Float32 => (value.clamp(-1.0, 1.0) as f32) as f64,
            _ => {
                let (min, max) = self.range();
                let scale = self.int_scale().unwrap_or(1.0);
                ((value * scale).round() / scale).clamp(min, max)
            }
        }
    }

    /// Integer code for a normalized value, as written to PCM containers.
    pub fn to_int(&self, value: f64) -> i32 {
        let scale = self.int_scale().unwrap_or(1.0);
        (self.quantize(value) * scale) as i32
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Multi-channel audio held as a `(frames, channels)` matrix of normalized samples.
///
/// Integer formats are scaled by `2^(bits-1)`, so integer PCM survives a
/// decode/encode cycle unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    format: SampleFormat,
    data: Array2<f64>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32, format: SampleFormat, data: Array2<f64>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AudioForgeError::corrupt_data("Sample rate cannot be 0"));
        }
        if data.ncols() == 0 {
            return Err(AudioForgeError::corrupt_data("Buffer must have at least one channel"));
        }
        Ok(Self { sample_rate, format, data })
    }

    /// Build from frame-interleaved samples.
    pub fn from_interleaved(sample_rate: u32, format: SampleFormat, channels: usize, samples: Vec<f64>) -> Result<Self> {
        if channels == 0 {
            return Err(AudioForgeError::corrupt_data("Channel count cannot be 0"));
        }
        if samples.len() % channels != 0 {
            return Err(AudioForgeError::corrupt_data(format!(
                "{} samples do not divide into {} channels", samples.len(), channels
            )));
        }
        let frames = samples.len() / channels;
        let data = Array2::from_shape_vec((frames, channels), samples)
            .map_err(|e| AudioForgeError::corrupt_data(format!("Bad sample layout: {}", e)))?;
        Self::new(sample_rate, format, data)
    }

    /// Build from one vector per channel; all channels must have the same length.
    pub fn from_channels(sample_rate: u32, format: SampleFormat, channels: Vec<Vec<f64>>) -> Result<Self> {
        let frames = channels.first().map(|c| c.len()).unwrap_or(0);
        if let Some(bad) = channels.iter().position(|c| c.len() != frames) {
            return Err(AudioForgeError::corrupt_data(format!(
                "Channel {} has {} frames, expected {}", bad, channels[bad].len(), frames
            )));
        }
        let mut data = Array2::zeros((frames, channels.len()));
        for (index, channel) in channels.iter().enumerate() {
            for (frame, &sample) in channel.iter().enumerate() {
                data[[frame, index]] = sample;
            }
        }
        Self::new(sample_rate, format, data)
    }

    pub fn silence(sample_rate: u32, format: SampleFormat, channels: usize, frames: usize) -> Result<Self> {
        Self::new(sample_rate, format, Array2::zeros((frames, channels)))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn channel_count(&self) -> usize {
        self.data.ncols()
    }

    pub fn frame_count(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    pub fn channel(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.channel_count()).then(|| self.data.column(index))
    }

    /// Samples in frame-interleaved order.
    pub fn interleaved(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }

    /// Same audio, relabelled with a different sample format.
    pub fn with_format(self, format: SampleFormat) -> Self {
        Self { format, ..self }
    }

    /// Replace the sample matrix, keeping rate and format.
    pub fn with_data(self, data: Array2<f64>) -> Result<Self> {
        Self::new(self.sample_rate, self.format, data)
    }

    /// Contiguous frame range `[start, end)`, bounds already validated by the caller.
    pub fn slice_frames(&self, start: usize, end: usize) -> Self {
        Self {
            sample_rate: self.sample_rate,
            format: self.format,
            data: self.data.slice(s![start..end, ..]).to_owned(),
        }
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f64 {
        self.data.iter().fold(0.0f64, |peak, &x| peak.max(x.abs()))
    }

    /// Per-channel RMS level.
    pub fn rms(&self) -> Vec<f64> {
        if self.is_empty() {
            return vec![0.0; self.channel_count()];
        }
        self.data
            .mapv(|x| x * x)
            .mean_axis(Axis(0))
            .map(|m| m.iter().map(|v| v.sqrt()).collect())
            .unwrap_or_default()
    }
}
