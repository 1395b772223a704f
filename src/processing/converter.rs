//! Sample rate and bit depth conversion

use std::f64::consts::PI;
use log::debug;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use crate::audio::{SampleBuffer, SampleFormat};
use crate::error::{AudioForgeError, Result};

/// Above this many distinct filter phases, taps are computed per output frame.
const MAX_PHASES: u64 = 4096;

/// Bit depths accepted in a [`ConversionTarget`].
pub const SUPPORTED_BIT_DEPTHS: [u16; 5] = [8, 16, 24, 32, 64];

/// Requested output properties; every field is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionTarget {
    pub sample_rate: Option<u32>,
    pub bit_depth: Option<u16>,
    /// Lossy encode bit rate in kbps, forwarded to the codec.
    pub bit_rate: Option<u32>,
}

impl ConversionTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_bit_depth(mut self, bit_depth: u16) -> Self {
        self.bit_depth = Some(bit_depth);
        self
    }

    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Nothing requested beyond a container change.
    pub fn is_empty(&self) -> bool {
        self.sample_rate.is_none() && self.bit_depth.is_none() && self.bit_rate.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == Some(0) {
            return Err(AudioForgeError::invalid_target("Target sample rate must be greater than 0"));
        }
        if let Some(bits) = self.bit_depth {
            if !SUPPORTED_BIT_DEPTHS.contains(&bits) {
                return Err(AudioForgeError::invalid_target(format!(
                    "Unsupported target bit depth: {} (expected one of {:?})", bits, SUPPORTED_BIT_DEPTHS
                )));
            }
        }
        if self.bit_rate == Some(0) {
            return Err(AudioForgeError::invalid_target("Target bit rate must be greater than 0"));
        }
        Ok(())
    }

    /// Output sample format for a buffer currently in `source`.
    ///
    /// 32 bits keeps a float source float; otherwise integer widths map to
    /// integer formats and 64 to double precision float.
    pub fn resolve_format(&self, source: SampleFormat) -> Result<SampleFormat> {
        match self.bit_depth {
            None => Ok(source),
            Some(32) if source.is_float() => Ok(SampleFormat::Float32),
            Some(64) => Ok(SampleFormat::Float64),
            Some(bits) => SampleFormat::int_from_bits(bits)
                .ok_or_else(|| AudioForgeError::invalid_target(format!("Unsupported target bit depth: {}", bits))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Hann,
    BlackmanHarris,
}

impl WindowKind {
    /// Window value at `x` in `[-1, 1]`, zero outside.
    fn value(&self, x: f64) -> f64 {
        if x.abs() >= 1.0 {
            return 0.0;
        }
        let t = PI * x;
        match self {
            WindowKind::Hann => 0.5 * (1.0 + t.cos()),
            WindowKind::BlackmanHarris => {
                0.35875 + 0.48829 * t.cos() + 0.14128 * (2.0 * t).cos() + 0.01168 * (3.0 * t).cos()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherKind {
    None,
    Rectangular,
    Tpdf,
}

/// Converter configuration
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    pub half_taps: usize,
    pub cutoff: f64,
    pub window: WindowKind,
    pub dither: DitherKind,
    pub dither_seed: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            half_taps: 32,
            cutoff: 0.95,
            window: WindowKind::BlackmanHarris,
            dither: DitherKind::Tpdf,
            dither_seed: 0x5eed,
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 { 1.0 } else { (PI * x).sin() / (PI * x) }
}

/// Band-limited windowed-sinc resampler over whole buffers.
#[derive(Debug, Clone)]
pub struct SincResampler {
    half_taps: usize,
    cutoff: f64,
    window: WindowKind,
}

impl SincResampler {
    pub fn new(half_taps: usize, cutoff: f64, window: WindowKind) -> Self {
        Self { half_taps: half_taps.max(1), cutoff, window }
    }

    pub fn output_frames(frames: usize, from: u32, to: u32) -> usize {
        ((frames as u128 * to as u128 + from as u128 / 2) / from as u128) as usize
    }

    /// Filter taps for an output frame lying `frac` input frames past its base index.
    /// Normalized to unity gain at DC.
    fn taps(&self, frac: f64, half_width: usize, fc: f64) -> Vec<f64> {
        let mut taps: Vec<f64> = (0..2 * half_width)
            .map(|j| {
                let distance = frac + half_width as f64 - 1.0 - j as f64;
                fc * sinc(fc * distance) * self.window.value(distance / half_width as f64)
            })
            .collect();
        let sum: f64 = taps.iter().sum();
        if sum.abs() > 1e-12 {
            taps.iter_mut().for_each(|t| *t /= sum);
        }
        taps
    }

    /// Resample `(frames, channels)` data from `from` Hz to `to` Hz.
    pub fn resample(&self, input: &Array2<f64>, from: u32, to: u32) -> Array2<f64> {
        let in_frames = input.nrows();
        let channels = input.ncols();
        let out_frames = Self::output_frames(in_frames, from, to);
        let mut output = Array2::zeros((out_frames, channels));
        if in_frames == 0 || out_frames == 0 {
            return output;
        }

        let g = gcd(from as u64, to as u64);
        let step = from as u64 / g;
        let phases = to as u64 / g;

        let scale = (to as f64 / from as f64).min(1.0);
        let fc = self.cutoff * scale;
        let half_width = (self.half_taps as f64 / scale).ceil() as usize;

        let table: Option<Vec<Vec<f64>>> = (phases <= MAX_PHASES).then(|| {
            (0..phases)
                .map(|p| self.taps(p as f64 / phases as f64, half_width, fc))
                .collect()
        });
        debug!(
            "Resampling {} -> {} Hz: {} taps, fc={:.4}, {}",
            from, to, 2 * half_width, fc,
            if table.is_some() { "polyphase table" } else { "per-frame taps" }
        );

        let mut scratch = Vec::new();
        for n in 0..out_frames {
            let position = n as u64 * step;
            let base = (position / phases) as i64;
            let phase = position % phases;
            let taps: &[f64] = match &table {
                Some(table) => &table[phase as usize],
                None => {
                    scratch = self.taps(phase as f64 / phases as f64, half_width, fc);
                    &scratch
                }
            };

            let first = base + 1 - half_width as i64;
            for (j, &weight) in taps.iter().enumerate() {
                let k = first + j as i64;
                if k < 0 || k as usize >= in_frames {
                    continue;
                }
                let row = input.row(k as usize);
                for c in 0..channels {
                    output[[n, c]] += weight * row[c];
                }
            }
        }

        output
    }
}

/// Requantizes samples onto a coarser grid with optional dither.
pub struct Ditherer {
    kind: DitherKind,
    rng: StdRng,
}

impl Ditherer {
    pub fn new(kind: DitherKind, seed: u64) -> Self {
        Self { kind, rng: StdRng::seed_from_u64(seed) }
    }

    /// Dither noise in LSB units.
    fn noise(&mut self) -> f64 {
        match self.kind {
            DitherKind::None => 0.0,
            DitherKind::Rectangular => self.rng.gen_range(-0.5..0.5),
            DitherKind::Tpdf => self.rng.gen_range(-0.5..0.5) + self.rng.gen_range(-0.5..0.5),
        }
    }

    pub fn requantize(&mut self, data: &mut Array2<f64>, target: SampleFormat) {
        match target.lsb() {
            Some(lsb) => {
                for sample in data.iter_mut() {
                    let noise = self.noise() * lsb;
                    *sample = target.quantize(*sample + noise);
                }
            }
            None => data.mapv_inplace(|x| target.quantize(x)),
        }
    }
}

/// Resampling and requantization of whole buffers.
#[derive(Debug)]
pub struct FormatConverter {
    config: ConverterConfig,
    resampler: SincResampler,
}

impl FormatConverter {
    pub fn new(config: ConverterConfig) -> Self {
        let resampler = SincResampler::new(config.half_taps, config.cutoff, config.window);
        Self { config, resampler }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Apply `target` to `buffer`. The bit rate is left for the encoder.
    pub fn convert(&self, buffer: SampleBuffer, target: &ConversionTarget) -> Result<SampleBuffer> {
        target.validate()?;

        let source_format = buffer.format();
        let target_format = target.resolve_format(source_format)?;
        let from_rate = buffer.sample_rate();
        let to_rate = target.sample_rate.unwrap_or(from_rate);
        let rate_changes = to_rate != from_rate;

        if !rate_changes && target_format == source_format {
            return Ok(buffer);
        }

        let needs_requantize = match target_format.lsb() {
            Some(_) => rate_changes || source_format.is_float() || target_format.bits() < source_format.bits(),
            None => target_format == SampleFormat::Float32 && (rate_changes || source_format == SampleFormat::Float64),
        };
        debug!(
            "Converting {}Hz/{} -> {}Hz/{} (requantize: {})",
            from_rate, source_format, to_rate, target_format, needs_requantize
        );

        let mut data = if rate_changes {
            self.resampler.resample(buffer.data(), from_rate, to_rate)
        } else {
            buffer.into_data()
        };

        if needs_requantize {
            Ditherer::new(self.config.dither, self.config.dither_seed).requantize(&mut data, target_format);
        }

        SampleBuffer::new(to_rate, target_format, data)
    }
}

impl Default for FormatConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(rate: u32, frames: usize, freq: f64, amp: f64, format: SampleFormat) -> SampleBuffer {
        let values = (0..frames)
            .map(|n| amp * (2.0 * PI * freq * n as f64 / rate as f64).sin())
            .collect();
        SampleBuffer::from_channels(rate, format, vec![values]).unwrap()
    }

    fn no_dither() -> FormatConverter {
        FormatConverter::new(ConverterConfig { dither: DitherKind::None, ..Default::default() })
    }

    #[test]
    fn test_same_rate_is_noop() {
        let converter = FormatConverter::default();
        for format in [SampleFormat::Int16, SampleFormat::Float32] {
            let buffer = SampleBuffer::from_channels(
                44100, format, vec![vec![0.25, -0.5, 0.125], vec![0.0, 0.5, -0.25]],
            ).unwrap();
            let target = ConversionTarget::new().with_sample_rate(44100);
            assert_eq!(converter.convert(buffer.clone(), &target).unwrap(), buffer);
        }
    }

    #[test]
    fn test_invalid_targets() {
        let converter = FormatConverter::default();
        let buffer = SampleBuffer::silence(44100, SampleFormat::Int16, 1, 10).unwrap();

        for target in [
            ConversionTarget::new().with_bit_depth(0),
            ConversionTarget::new().with_bit_depth(12),
            ConversionTarget::new().with_sample_rate(0),
            ConversionTarget::new().with_bit_rate(0),
        ] {
            let err = converter.convert(buffer.clone(), &target).unwrap_err();
            assert_eq!(err.status_code(), 8, "{:?}", target);
        }
    }

    #[test]
    fn test_resolve_format() {
        let target = ConversionTarget::new().with_bit_depth(32);
        assert_eq!(target.resolve_format(SampleFormat::Int16).unwrap(), SampleFormat::Int32);
        assert_eq!(target.resolve_format(SampleFormat::Float64).unwrap(), SampleFormat::Float32);
        let target = ConversionTarget::new().with_bit_depth(64);
        assert_eq!(target.resolve_format(SampleFormat::Int24).unwrap(), SampleFormat::Float64);
        assert_eq!(ConversionTarget::new().resolve_format(SampleFormat::Int8).unwrap(), SampleFormat::Int8);
    }

    #[test]
    fn test_output_frame_count() {
        assert_eq!(SincResampler::output_frames(44100, 44100, 48000), 48000);
        assert_eq!(SincResampler::output_frames(4800, 48000, 44100), 4410);
        assert_eq!(SincResampler::output_frames(0, 48000, 44100), 0);
    }

    #[test]
    fn test_resample_preserves_tone() {
        let buffer = sine(48000, 4800, 1000.0, 0.5, SampleFormat::Float64);
        let target = ConversionTarget::new().with_sample_rate(44100);
        let out = no_dither().convert(buffer, &target).unwrap();

        assert_eq!(out.sample_rate(), 44100);
        assert_eq!(out.frame_count(), 4410);
        let channel = out.channel(0).unwrap();
        for n in 200..4210 {
            let expected = 0.5 * (2.0 * PI * 1000.0 * n as f64 / 44100.0).sin();
            assert!((channel[n] - expected).abs() < 1e-3, "frame {}: {} vs {}", n, channel[n], expected);
        }
    }

    #[test]
    fn test_upsample_preserves_dc() {
        let buffer = SampleBuffer::from_channels(
            22050, SampleFormat::Float64, vec![vec![0.5; 2205], vec![-0.25; 2205]],
        ).unwrap();
        let out = no_dither().convert(buffer, &ConversionTarget::new().with_sample_rate(44100)).unwrap();
        assert_eq!(out.frame_count(), 4410);
        for n in 200..4200 {
            assert!((out.data()[[n, 0]] - 0.5).abs() < 1e-9);
            assert!((out.data()[[n, 1]] + 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn test_downsample_removes_content_above_nyquist() {
        let buffer = sine(48000, 9600, 20000.0, 0.5, SampleFormat::Float64);
        let out = no_dither().convert(buffer, &ConversionTarget::new().with_sample_rate(16000)).unwrap();
        assert_eq!(out.frame_count(), 3200);
        let interior = out.slice_frames(300, 2900);
        assert!(interior.rms()[0] < 0.01, "alias energy {}", interior.rms()[0]);
    }

    #[test]
    fn test_large_phase_count_uses_direct_taps() {
        let buffer = SampleBuffer::from_channels(44100, SampleFormat::Float64, vec![vec![0.3; 4410]]).unwrap();
        let out = no_dither().convert(buffer, &ConversionTarget::new().with_sample_rate(44101)).unwrap();
        assert_eq!(out.frame_count(), 4410);
        assert!((out.data()[[2000, 0]] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_requantize_with_dither_lands_on_grid() {
        let buffer = sine(48000, 2000, 440.0, 0.8, SampleFormat::Int24);
        let buffer = buffer.clone().with_data(buffer.data().mapv(|x| SampleFormat::Int24.quantize(x))).unwrap();
        let converter = FormatConverter::default();
        let out = converter.convert(buffer.clone(), &ConversionTarget::new().with_bit_depth(16)).unwrap();

        assert_eq!(out.format(), SampleFormat::Int16);
        for (q, x) in out.interleaved().zip(buffer.interleaved()) {
            let code = q * 32768.0;
            assert_eq!(code, code.round());
            assert!((q - x).abs() <= 1.5 / 32768.0);
        }

        let again = converter.convert(buffer, &ConversionTarget::new().with_bit_depth(16)).unwrap();
        assert_eq!(out, again);
    }

    #[test]
    fn test_requantize_without_dither_rounds() {
        let buffer = SampleBuffer::from_channels(
            8000, SampleFormat::Float32, vec![vec![0.3, -0.7, 0.9]],
        ).unwrap();
        let out = no_dither().convert(buffer.clone(), &ConversionTarget::new().with_bit_depth(8)).unwrap();
        for (q, x) in out.interleaved().zip(buffer.interleaved()) {
            assert!((q - x).abs() <= 0.5 / 128.0 + 1e-12);
        }
    }

    #[test]
    fn test_increasing_depth_is_exact() {
        let buffer = SampleBuffer::from_channels(
            44100, SampleFormat::Int16, vec![vec![100.0 / 32768.0, -5.0 / 32768.0]],
        ).unwrap();
        let out = FormatConverter::default().convert(buffer.clone(), &ConversionTarget::new().with_bit_depth(24)).unwrap();
        assert_eq!(out.format(), SampleFormat::Int24);
        assert_eq!(out.data(), buffer.data());
    }

    #[test]
    fn test_bit_rate_only_leaves_buffer() {
        let buffer = sine(44100, 100, 440.0, 0.5, SampleFormat::Int16);
        let out = FormatConverter::default().convert(buffer.clone(), &ConversionTarget::new().with_bit_rate(128)).unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn test_window_edges() {
        assert_eq!(WindowKind::Hann.value(1.0), 0.0);
        assert!((WindowKind::Hann.value(0.0) - 1.0).abs() < 1e-12);
        assert!((WindowKind::BlackmanHarris.value(0.0) - 1.0).abs() < 1e-12);
    }
}
