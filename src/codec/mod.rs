//! Codec Gateway
//!
//! The narrow decode/encode contract the pipeline depends on, plus the default
//! file-based implementation: WAV through `hound`, compressed formats decoded
//! through `symphonia`.

pub mod compressed;
pub mod wav;

use std::path::Path;
use log::debug;
use crate::audio::SampleBuffer;
use crate::error::{AudioForgeError, Result};

/// Container/codec family, derived from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Wav,
    Mp3,
    Flac,
    Ogg,
    Aiff,
}

impl Container {
    pub const ALL: [Container; 5] = [Container::Wav, Container::Mp3, Container::Flac, Container::Ogg, Container::Aiff];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Some(Container::Wav),
            "mp3" => Some(Container::Mp3),
            "flac" => Some(Container::Flac),
            "ogg" | "oga" => Some(Container::Ogg),
            "aif" | "aiff" => Some(Container::Aiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Container::Wav => "wav",
            Container::Mp3 => "mp3",
            Container::Flac => "flac",
            Container::Ogg => "ogg",
            Container::Aiff => "aiff",
        }
    }

    /// Whether a bit rate is meaningful for this container.
    pub fn is_lossy(&self) -> bool {
        matches!(self, Container::Mp3 | Container::Ogg)
    }
}

/// Encode-time parameters that never touch the in-memory buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeHint {
    pub container: Container,
    /// Lossy bit rate in kbps.
    pub bit_rate: Option<u32>,
    /// Lossy encoder quality, 0 (best) to 9 (fastest).
    pub quality: u8,
}

impl EncodeHint {
    pub fn new(container: Container) -> Self {
        Self { container, bit_rate: None, quality: 2 }
    }

    pub fn with_bit_rate(mut self, bit_rate: Option<u32>) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Hint for writing to `path`, keyed on its extension.
    pub fn for_path(path: &Path) -> Result<Self> {
        Container::from_path(path)
            .map(Self::new)
            .ok_or_else(|| AudioForgeError::unsupported_format(format!(
                "Unrecognized output container: {}", path.display()
            )))
    }
}

/// Decode/encode capability the job pipeline is built on.
///
/// Implementations may be asked to write to a staging path whose extension
/// matches `hint.container`; they must not retry internally.
pub trait CodecGateway {
    fn decode(&self, path: &Path) -> Result<SampleBuffer>;

    fn encode(&self, buffer: &SampleBuffer, path: &Path, hint: &EncodeHint) -> Result<()>;
}

impl<G: CodecGateway + ?Sized> CodecGateway for &G {
    fn decode(&self, path: &Path) -> Result<SampleBuffer> {
        (**self).decode(path)
    }

    fn encode(&self, buffer: &SampleBuffer, path: &Path, hint: &EncodeHint) -> Result<()> {
        (**self).encode(buffer, path, hint)
    }
}

/// Default gateway over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileCodecGateway;

impl FileCodecGateway {
    pub fn new() -> Self {
        Self
    }

    /// Only PCM WAV has a linked encoder.
    pub fn can_encode(container: Container) -> bool {
        container == Container::Wav
    }
}

impl CodecGateway for FileCodecGateway {
    fn decode(&self, path: &Path) -> Result<SampleBuffer> {
        let buffer = match Container::from_path(path) {
            Some(Container::Wav) => wav::read_wav(path)?,
            _ => compressed::decode_file(path)?,
        };
        debug!(
            "Decoded {}: {}ch {}Hz {} frames ({})",
            path.display(), buffer.channel_count(), buffer.sample_rate(), buffer.frame_count(), buffer.format()
        );
        Ok(buffer)
    }

    fn encode(&self, buffer: &SampleBuffer, path: &Path, hint: &EncodeHint) -> Result<()> {
        match hint.container {
            container if Self::can_encode(container) => {
                if let Some(bit_rate) = hint.bit_rate {
                    return Err(AudioForgeError::encode(format!(
                        "Bit rate {} kbps is not applicable to PCM WAV output", bit_rate
                    )));
                }
                wav::write_wav(buffer, path)
            }
            other => Err(AudioForgeError::unsupported_format(format!(
                "No {} encoder is available", other.extension()
            ))),
        }
    }
}
