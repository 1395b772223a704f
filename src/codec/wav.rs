//! WAV file reading and writing

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use hound::{WavReader, WavSpec, WavWriter};
use crate::audio::{SampleBuffer, SampleFormat};
use crate::error::{AudioForgeError, Result};

fn format_from_spec(spec: &WavSpec) -> Result<SampleFormat> {
    match spec.sample_format {
        hound::SampleFormat::Int => SampleFormat::int_from_bits(spec.bits_per_sample)
            .ok_or_else(|| AudioForgeError::unsupported_format(format!(
                "Unsupported integer bit depth: {}", spec.bits_per_sample
            ))),
        hound::SampleFormat::Float => match spec.bits_per_sample {
            32 => Ok(SampleFormat::Float32),
            bits => Err(AudioForgeError::unsupported_format(format!(
                "Unsupported float bit depth: {}", bits
            ))),
        },
    }
}

fn spec_for(buffer: &SampleBuffer) -> Result<WavSpec> {
    let format = buffer.format();
    let sample_format = match format {
        SampleFormat::Float64 => {
            return Err(AudioForgeError::unsupported_format("64-bit float WAV output is not supported"));
        }
        SampleFormat::Float32 => hound::SampleFormat::Float,
        _ => hound::SampleFormat::Int,
    };
    let channels = u16::try_from(buffer.channel_count())
        .map_err(|_| AudioForgeError::encode(format!("Too many channels: {}", buffer.channel_count())))?;

    Ok(WavSpec {
        channels,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: format.bits(),
        sample_format,
    })
}

pub fn read_wav(path: &Path) -> Result<SampleBuffer> {
    let file = File::open(path)
        .map_err(|e| AudioForgeError::io(format!("Cannot open audio file {}: {}", path.display(), e)))?;
    let reader = WavReader::new(BufReader::new(file))?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(AudioForgeError::corrupt_data("Invalid sample rate"));
    }
    if spec.channels == 0 {
        return Err(AudioForgeError::corrupt_data("Invalid channel count"));
    }
    let format = format_from_spec(&spec)?;

    let samples: Vec<f64> = match format.int_scale() {
        Some(scale) => reader
            .into_samples::<i32>()
            .map(|sample| sample.map(|s| s as f64 / scale))
            .collect::<std::result::Result<_, _>>()?,
        None => reader
            .into_samples::<f32>()
            .map(|sample| sample.map(|s| s as f64))
            .collect::<std::result::Result<_, _>>()?,
    };

    SampleBuffer::from_interleaved(spec.sample_rate, format, spec.channels as usize, samples)
}

/// Write `buffer` as PCM WAV, clamping and rounding onto the buffer's format.
pub fn write_wav(buffer: &SampleBuffer, path: &Path) -> Result<()> {
    let spec = spec_for(buffer)?;
    let format = buffer.format();

    let file = File::create(path)
        .map_err(|e| AudioForgeError::io(format!("Cannot create output file {}: {}", path.display(), e)))?;
    let mut writer = WavWriter::new(BufWriter::new(file), spec)?;

    if format.is_float() {
        for sample in buffer.interleaved() {
            writer.write_sample(format.quantize(sample) as f32)?;
        }
    } else {
        for sample in buffer.interleaved() {
            writer.write_sample(format.to_int(sample))?;
        }
    }

    writer.finalize()?;
    Ok(())
}
