//! Compressed-format decoding through symphonia

use std::fs::File;
use std::path::Path;
use log::warn;
use symphonia::core::audio::SampleBuffer as DecodedSamples;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::SampleFormat as SymphoniaSampleFormat;
use crate::audio::{SampleBuffer, SampleFormat};
use crate::error::{AudioForgeError, Result};

/// Lossy sources report no bit depth and are treated as 16-bit.
fn format_from_params(bits: Option<u32>, sample_format: Option<SymphoniaSampleFormat>) -> SampleFormat {
    match sample_format {
        Some(SymphoniaSampleFormat::F32) => return SampleFormat::Float32,
        Some(SymphoniaSampleFormat::F64) => return SampleFormat::Float64,
        _ => {}
    }
    bits.and_then(|b| u16::try_from(b).ok())
        .and_then(SampleFormat::int_from_bits)
        .unwrap_or(SampleFormat::Int16)
}

/// Decode the default audio track of `path` in full.
pub fn decode_file(path: &Path) -> Result<SampleBuffer> {
    let file = File::open(path)
        .map_err(|e| AudioForgeError::io(format!("Cannot open audio file {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| match e {
            SymphoniaError::IoError(io) => AudioForgeError::io(io.to_string()),
            SymphoniaError::Unsupported(_) => AudioForgeError::unsupported_format(format!(
                "Unrecognized container: {}", path.display()
            )),
            other => AudioForgeError::from(other),
        })?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioForgeError::unsupported_format("No supported audio track found"))?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let mut decoder = symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;

    let sample_rate = params.sample_rate
        .ok_or_else(|| AudioForgeError::corrupt_data("Unknown sample rate"))?;
    let sample_format = format_from_params(params.bits_per_sample, params.sample_format);
    let mut channels = params.channels.map(|c| c.count());
    let mut samples: Vec<f64> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!("Skipping undecodable packet in {}: {}", path.display(), msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let count = spec.channels.count();
        match channels {
            Some(expected) if expected != count => {
                return Err(AudioForgeError::corrupt_data(format!(
                    "Channel count changed mid-stream: {} -> {}", expected, count
                )));
            }
            _ => channels = Some(count),
        }

        let mut buf = DecodedSamples::<f64>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    let channels = channels.ok_or_else(|| AudioForgeError::corrupt_data("Unknown channel layout"))?;
    SampleBuffer::from_interleaved(sample_rate, sample_format, channels, samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn test_format_from_params() {
        assert_eq!(format_from_params(Some(24), None), SampleFormat::Int24);
        assert_eq!(format_from_params(None, None), SampleFormat::Int16);
        assert_eq!(format_from_params(None, Some(SymphoniaSampleFormat::F32)), SampleFormat::Float32);
        assert_eq!(format_from_params(Some(12), None), SampleFormat::Int16);
    }

    /// 16-bit big-endian PCM AIFF.
    fn aiff_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let frames = (samples.len() / channels as usize) as u32;
        let data: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();

        // 80-bit extended float: biased exponent, explicit leading mantissa bit
        let exponent = 31 - sample_rate.leading_zeros();
        let mantissa = (sample_rate as u64) << (63 - exponent);

        let mut comm = Vec::new();
        comm.extend_from_slice(&channels.to_be_bytes());
        comm.extend_from_slice(&frames.to_be_bytes());
        comm.extend_from_slice(&16u16.to_be_bytes());
        comm.extend_from_slice(&((16383 + exponent) as u16).to_be_bytes());
        comm.extend_from_slice(&mantissa.to_be_bytes());

        let mut body = b"AIFF".to_vec();
        body.extend_from_slice(b"COMM");
        body.extend_from_slice(&(comm.len() as u32).to_be_bytes());
        body.extend_from_slice(&comm);
        body.extend_from_slice(b"SSND");
        body.extend_from_slice(&(8 + data.len() as u32).to_be_bytes());
        body.extend_from_slice(&[0u8; 8]);
        body.extend_from_slice(&data);

        let mut bytes = b"FORM".to_vec();
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }

    #[test]
    fn test_decode_mono_aiff() {
        let samples = [0i16, 16384, -16384, 32767, -32768, 1, -1, 1234];
        let file = Builder::new().suffix(".aiff").tempfile().unwrap();
        std::fs::write(file.path(), aiff_bytes(1, 8000, &samples)).unwrap();

        let buffer = decode_file(file.path()).unwrap();
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.frame_count(), samples.len());
        assert_eq!(buffer.format(), SampleFormat::Int16);
        for (decoded, &expected) in buffer.interleaved().zip(samples.iter()) {
            assert_eq!(decoded * 32768.0, expected as f64);
        }
    }

    #[test]
    fn test_decode_stereo_aiff_keeps_channel_order() {
        let frames = 3000;
        let samples: Vec<i16> = (0..frames)
            .flat_map(|i| [(i % 1000) as i16 * 10, -((i % 1000) as i16) * 10])
            .collect();
        let file = Builder::new().suffix(".aif").tempfile().unwrap();
        std::fs::write(file.path(), aiff_bytes(2, 22050, &samples)).unwrap();

        let buffer = decode_file(file.path()).unwrap();
        assert_eq!(buffer.sample_rate(), 22050);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), frames);

        let left = buffer.channel(0).unwrap();
        let right = buffer.channel(1).unwrap();
        assert_eq!(left[999] * 32768.0, 9990.0);
        assert_eq!(right[2999] * 32768.0, -9990.0);
        assert_eq!(left[1000], 0.0);
    }

    #[test]
    fn test_unrecognized_container() {
        let file = Builder::new().suffix(".xyz").tempfile().unwrap();
        std::fs::write(file.path(), vec![0x42u8; 4096]).unwrap();
        let err = decode_file(file.path()).unwrap_err();
        assert_eq!(err.status_code(), 1);
    }
}
