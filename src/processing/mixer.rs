//! Channel composition and remixing

use std::fmt;
use std::str::FromStr;
use ndarray::{s, Array2};
use crate::audio::SampleBuffer;
use crate::error::{AudioForgeError, Result};

/// Source channels (0-based) averaged with equal weight into one output channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRoute {
    pub sources: Vec<usize>,
}

impl ChannelRoute {
    pub fn copy(source: usize) -> Self {
        Self { sources: vec![source] }
    }

    pub fn mix(sources: Vec<usize>) -> Self {
        Self { sources }
    }
}

/// Selection/remap of source channels onto output channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSpec {
    Left,
    Right,
    MixToMono,
    Map(Vec<ChannelRoute>),
}

impl ChannelSpec {
    /// Every channel copied to the same position.
    pub fn identity(channels: usize) -> Self {
        ChannelSpec::Map((0..channels).map(ChannelRoute::copy).collect())
    }

    /// Single output channel copied from `source`.
    pub fn single(source: usize) -> Self {
        ChannelSpec::Map(vec![ChannelRoute::copy(source)])
    }

    /// Concrete routes for a buffer with `channel_count` channels.
    pub fn resolve(&self, channel_count: usize) -> Result<Vec<ChannelRoute>> {
        let routes = match self {
            ChannelSpec::Left => vec![ChannelRoute::copy(0)],
            ChannelSpec::Right => vec![ChannelRoute::copy(1)],
            ChannelSpec::MixToMono => vec![ChannelRoute::mix((0..channel_count).collect())],
            ChannelSpec::Map(routes) => routes.clone(),
        };

        if routes.is_empty() {
            return Err(AudioForgeError::invalid_channel("Channel spec selects no channels"));
        }
        for (output, route) in routes.iter().enumerate() {
            if route.sources.is_empty() {
                return Err(AudioForgeError::invalid_channel(format!(
                    "Output channel {} has no source", output + 1
                )));
            }
            if let Some(&bad) = route.sources.iter().find(|&&src| src >= channel_count) {
                return Err(AudioForgeError::invalid_channel(format!(
                    "Channel {} requested but source has {} channel(s)", bad + 1, channel_count
                )));
            }
        }
        Ok(routes)
    }
}

impl FromStr for ChannelSpec {
    type Err = AudioForgeError;

    /// `left`, `right`, `mono`, or space-separated output channels where each is a
    /// comma list of 1-based source channels or ranges, e.g. `"2 1"`, `"1,2"`, `"1-3 4"`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "left" | "l" => return Ok(ChannelSpec::Left),
            "right" | "r" => return Ok(ChannelSpec::Right),
            "mono" | "mix" => return Ok(ChannelSpec::MixToMono),
            "" => return Err(AudioForgeError::invalid_channel("Empty channel selector")),
            _ => {}
        }

        let parse_index = |token: &str| -> Result<usize> {
            match token.trim().parse::<usize>() {
                Ok(n) if n >= 1 => Ok(n - 1),
                _ => Err(AudioForgeError::invalid_channel(format!(
                    "Invalid channel '{}' in selector '{}'", token, trimmed
                ))),
            }
        };

        let mut routes = Vec::new();
        for output in trimmed.split_whitespace() {
            let mut sources = Vec::new();
            for item in output.split(',').filter(|t| !t.is_empty()) {
                match item.split_once('-') {
                    Some((lo, hi)) => {
                        let (lo, hi) = (parse_index(lo)?, parse_index(hi)?);
                        if lo > hi {
                            return Err(AudioForgeError::invalid_channel(format!(
                                "Descending channel range '{}'", item
                            )));
                        }
                        sources.extend(lo..=hi);
                    }
                    None => sources.push(parse_index(item)?),
                }
            }
            routes.push(ChannelRoute::mix(sources));
        }
        Ok(ChannelSpec::Map(routes))
    }
}

impl fmt::Display for ChannelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelSpec::Left => f.write_str("left"),
            ChannelSpec::Right => f.write_str("right"),
            ChannelSpec::MixToMono => f.write_str("mono"),
            ChannelSpec::Map(routes) => {
                let outputs: Vec<String> = routes
                    .iter()
                    .map(|r| r.sources.iter().map(|s| (s + 1).to_string()).collect::<Vec<_>>().join(","))
                    .collect();
                f.write_str(&outputs.join(" "))
            }
        }
    }
}

pub struct ChannelMixer;

impl ChannelMixer {
    /// Append the channels of every buffer, in order, into one buffer.
    ///
    /// Shorter inputs are zero-padded at the tail to the longest input.
    pub fn combine(buffers: Vec<SampleBuffer>) -> Result<SampleBuffer> {
        let first = buffers.first()
            .ok_or_else(|| AudioForgeError::empty_input("No input buffers to combine"))?;
        let sample_rate = first.sample_rate();
        let format = first.format();

        for (index, buffer) in buffers.iter().enumerate().skip(1) {
            if buffer.sample_rate() != sample_rate || buffer.format() != format {
                return Err(AudioForgeError::format_mismatch(format!(
                    "Input {} is {}Hz/{}, expected {}Hz/{}",
                    index + 1, buffer.sample_rate(), buffer.format(), sample_rate, format
                )));
            }
        }

        let frames = buffers.iter().map(|b| b.frame_count()).max().unwrap_or(0);
        let channels: usize = buffers.iter().map(|b| b.channel_count()).sum();
        let mut data = Array2::zeros((frames, channels));

        let mut offset = 0;
        for buffer in &buffers {
            let width = buffer.channel_count();
            data.slice_mut(s![..buffer.frame_count(), offset..offset + width])
                .assign(buffer.data());
            offset += width;
        }

        SampleBuffer::new(sample_rate, format, data)
    }

    /// Build one output channel per route. Mixed values are not range-limited here;
    /// they are clamped to the format when written.
    pub fn remix(buffer: SampleBuffer, spec: &ChannelSpec) -> Result<SampleBuffer> {
        let routes = spec.resolve(buffer.channel_count())?;

        let is_identity = routes.len() == buffer.channel_count()
            && routes.iter().enumerate().all(|(i, r)| r.sources == [i]);
        if is_identity {
            return Ok(buffer);
        }

        let source = buffer.data();
        let mut data = Array2::zeros((buffer.frame_count(), routes.len()));
        for (output, route) in routes.iter().enumerate() {
            let mut column = data.column_mut(output);
            for &src in &route.sources {
                column += &source.column(src);
            }
            if route.sources.len() > 1 {
                column /= route.sources.len() as f64;
            }
        }

        buffer.with_data(data)
    }
}
