//! AudioForge - Audio file job processing library
//!
//! Decodes audio files into normalized sample buffers, applies one processing
//! stage (channel combine/remix, trim, format conversion) and encodes the result.

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod processing;

pub use audio::{SampleBuffer, SampleFormat};
pub use codec::{CodecGateway, Container, EncodeHint, FileCodecGateway};
pub use config::{Args, Command, Config};
pub use error::{AudioForgeError, ErrorKind, Result};
pub use processing::{ChannelSpec, ConversionTarget, Job, JobReport, JobRunner, TimeSpec};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Info by default, debug when verbose; `RUST_LOG` takes precedence.
pub fn init_logging(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .parse_env("RUST_LOG")
        .try_init()
        .ok();
}

/// Crate identity plus the containers the default gateway can read and write.
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub decodes: Vec<Container>,
    pub encodes: Vec<Container>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        name: NAME,
        version: VERSION,
        decodes: Container::ALL.to_vec(),
        encodes: Container::ALL.into_iter().filter(|c| FileCodecGateway::can_encode(*c)).collect(),
    }
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let list = |containers: &[Container]| {
            containers.iter().map(|c| c.extension()).collect::<Vec<_>>().join(", ")
        };
        write!(
            f,
            "{} v{} (decode: {}; encode: {})",
            self.name,
            self.version,
            list(&self.decodes),
            list(&self.encodes)
        )
    }
}
