//! Time-domain trimming

use std::fmt;
use std::str::FromStr;
use crate::audio::SampleBuffer;
use crate::error::{AudioForgeError, Result};

/// A point in a buffer, in seconds or frames. `End` is the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSpec {
    Seconds(f64),
    Frames(u64),
    End,
}

impl TimeSpec {
    /// Frame index for this point, clamped to `[0, frame_count]`.
    pub fn resolve(&self, sample_rate: u32, frame_count: usize) -> Result<usize> {
        let frame = match *self {
            TimeSpec::Seconds(seconds) => {
                if !seconds.is_finite() {
                    return Err(AudioForgeError::invalid_range(format!("Time is not finite: {}", seconds)));
                }
                let frames = (seconds * sample_rate as f64).round();
                if frames <= 0.0 { 0 } else { frames.min(frame_count as f64) as usize }
            }
            TimeSpec::Frames(frames) => usize::try_from(frames).unwrap_or(usize::MAX),
            TimeSpec::End => frame_count,
        };
        Ok(frame.min(frame_count))
    }
}

impl FromStr for TimeSpec {
    type Err = AudioForgeError;

    /// `end`, `<n>s` for a frame count, `[[hh:]mm:]ss[.frac]`, or plain seconds.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || AudioForgeError::invalid_range(format!("Invalid time '{}'", s));

        if s.eq_ignore_ascii_case("end") {
            return Ok(TimeSpec::End);
        }
        if let Some(frames) = s.strip_suffix('s') {
            return frames.parse::<u64>().map(TimeSpec::Frames).map_err(|_| invalid());
        }

        let mut seconds = 0.0;
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() > 3 {
            return Err(invalid());
        }
        for (index, part) in parts.iter().enumerate() {
            let value: f64 = part.parse().map_err(|_| invalid())?;
            let is_last = index == parts.len() - 1;
            if !value.is_finite() || value < 0.0 || (!is_last && value.fract() != 0.0) {
                return Err(invalid());
            }
            seconds = seconds * 60.0 + value;
        }
        Ok(TimeSpec::Seconds(seconds))
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpec::Seconds(s) => write!(f, "{}", s),
            TimeSpec::Frames(n) => write!(f, "{}s", n),
            TimeSpec::End => f.write_str("end"),
        }
    }
}

pub struct TimeTrimmer;

impl TimeTrimmer {
    /// Contiguous slice between `start` and `end`.
    ///
    /// Out-of-range bounds are clamped to the buffer; only a start that lies
    /// after the end is rejected.
    pub fn trim(buffer: SampleBuffer, start: TimeSpec, end: TimeSpec) -> Result<SampleBuffer> {
        let frames = buffer.frame_count();
        let first = start.resolve(buffer.sample_rate(), frames)?;
        let last = end.resolve(buffer.sample_rate(), frames)?;

        if first > last {
            return Err(AudioForgeError::invalid_range(format!(
                "Start {} (frame {}) is after end {} (frame {})", start, first, end, last
            )));
        }
        if first == 0 && last == frames {
            return Ok(buffer);
        }
        Ok(buffer.slice_frames(first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleFormat;

    fn ramp(rate: u32, frames: usize) -> SampleBuffer {
        let values = (0..frames).map(|i| i as f64 / frames as f64).collect();
        SampleBuffer::from_channels(rate, SampleFormat::Float32, vec![values]).unwrap()
    }

    #[test]
    fn test_full_range_is_identity() {
        let buffer = ramp(44100, 4410);
        let trimmed = TimeTrimmer::trim(
            buffer.clone(), TimeSpec::Seconds(0.0), TimeSpec::Seconds(buffer.duration()),
        ).unwrap();
        assert_eq!(trimmed, buffer);
    }

    #[test]
    fn test_trim_seconds() {
        let buffer = ramp(1000, 5000);
        let trimmed = TimeTrimmer::trim(buffer, TimeSpec::Seconds(1.0), TimeSpec::Seconds(2.0)).unwrap();
        assert_eq!(trimmed.frame_count(), 1000);
        assert_eq!(trimmed.channel(0).unwrap()[0], 1000.0 / 5000.0);
    }

    #[test]
    fn test_trim_frames_and_end() {
        let buffer = ramp(1000, 5000);
        let trimmed = TimeTrimmer::trim(buffer, TimeSpec::Frames(4500), TimeSpec::End).unwrap();
        assert_eq!(trimmed.frame_count(), 500);
        assert_eq!(trimmed.sample_rate(), 1000);
    }

    #[test]
    fn test_past_end_clamps_to_empty() {
        let buffer = ramp(1000, 5000);
        let trimmed = TimeTrimmer::trim(buffer, TimeSpec::Seconds(10.0), TimeSpec::Seconds(12.0)).unwrap();
        assert!(trimmed.is_empty());
        assert_eq!(trimmed.channel_count(), 1);
    }

    #[test]
    fn test_negative_start_clamps() {
        let buffer = ramp(1000, 5000);
        let trimmed = TimeTrimmer::trim(buffer, TimeSpec::Seconds(-3.0), TimeSpec::Frames(10)).unwrap();
        assert_eq!(trimmed.frame_count(), 10);
    }

    #[test]
    fn test_inverted_range_fails() {
        let buffer = ramp(1000, 5000);
        let err = TimeTrimmer::trim(buffer.clone(), TimeSpec::Seconds(3.0), TimeSpec::Seconds(1.0)).unwrap_err();
        assert_eq!(err.status_code(), 7);

        let err = TimeTrimmer::trim(buffer, TimeSpec::Seconds(f64::NAN), TimeSpec::End).unwrap_err();
        assert_eq!(err.status_code(), 7);
    }

    #[test]
    fn test_time_parsing() {
        assert_eq!("1.5".parse::<TimeSpec>().unwrap(), TimeSpec::Seconds(1.5));
        assert_eq!("1:02.5".parse::<TimeSpec>().unwrap(), TimeSpec::Seconds(62.5));
        assert_eq!("1:00:00".parse::<TimeSpec>().unwrap(), TimeSpec::Seconds(3600.0));
        assert_eq!("44100s".parse::<TimeSpec>().unwrap(), TimeSpec::Frames(44100));
        assert_eq!("END".parse::<TimeSpec>().unwrap(), TimeSpec::End);

        assert!("-1".parse::<TimeSpec>().is_err());
        assert!("1.5:00".parse::<TimeSpec>().is_err());
        assert!("1:2:3:4".parse::<TimeSpec>().is_err());
        assert!("abc".parse::<TimeSpec>().is_err());
        assert!("xs".parse::<TimeSpec>().is_err());
    }
}
