//! Configuration management for job processing

use crate::error::{AudioForgeError, Result};
use crate::processing::{DitherKind, WindowKind};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resample: ResampleConfig,
    #[serde(default)]
    pub dither: DitherConfig,
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleConfig {
    pub half_taps: usize,
    pub cutoff: f64,
    pub window: WindowKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DitherConfig {
    pub kind: DitherKind,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Lossy encoder quality, 0 (best) to 9 (fastest)
    pub quality: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub verbose: bool,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            half_taps: 32,
            cutoff: 0.95,
            window: WindowKind::BlackmanHarris,
        }
    }
}

impl Default for DitherConfig {
    fn default() -> Self {
        Self {
            kind: DitherKind::Tpdf,
            seed: 0x5eed,
        }
    }
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self { quality: 2 }
    }
}

impl Config {
    /// Get verbose mode (convenience method)
    pub fn verbose(&self) -> bool {
        self.processing.verbose
    }

    /// Get resampler half kernel width (convenience method)
    pub fn half_taps(&self) -> usize {
        self.resample.half_taps
    }

    /// Get lossy encode quality (convenience method)
    pub fn encode_quality(&self) -> u8 {
        self.encode.quality
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "audioforge", about = "Audio file job processor", version, author)]
pub struct Args {
    #[arg(short = 'v', long = "verbose", global = true, help = "Enable verbose output mode")]
    pub verbose: bool,

    #[arg(short = 'c', long = "config", global = true, help = "Config file path (TOML format)")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Combine inputs into one multi-channel file
    Merge {
        #[arg(required = true, num_args = 1.., help = "Input files, in channel order")]
        inputs: Vec<PathBuf>,
        #[arg(short = 'o', long = "output", help = "Output file path")]
        output: PathBuf,
    },
    /// Select, reorder or mix channels
    Remix {
        input: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long = "channels", help = "Channel selector, e.g. \"left\", \"2 1\" or \"1,2\"")]
        channels: String,
    },
    /// Cut a time range
    Trim {
        input: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long = "start", help = "Start time, e.g. \"1.5\", \"1:02\" or \"44100s\"")]
        start: String,
        #[arg(long = "end", default_value = "end", help = "End time, \"end\" for the end of the file")]
        end: String,
    },
    /// Change sample rate, bit depth or bit rate
    Convert {
        input: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        #[arg(long = "bits", help = "Target bit depth (8, 16, 24, 32, 64)")]
        bits: Option<u16>,
        #[arg(long = "rate", help = "Target sample rate (Hz)")]
        rate: Option<u32>,
        #[arg(long = "bit-rate", help = "Target bit rate for lossy outputs (kbps)")]
        bit_rate: Option<u32>,
    },
    /// Write the left and right channels as separate mono files
    SplitStereo {
        input: PathBuf,
        #[arg(long = "dest", help = "Destination directory")]
        dest: Option<PathBuf>,
        #[arg(long = "name", help = "Base name for the outputs")]
        name: Option<String>,
        #[arg(long = "no-overwrite", help = "Keep outputs that already exist")]
        no_overwrite: bool,
    },
    /// Write every channel as a separate mono file
    ExportChannels {
        input: PathBuf,
        #[arg(long = "dest")]
        dest: Option<PathBuf>,
        #[arg(long = "name")]
        name: Option<String>,
    },
    /// Mix all channels down to one mono file
    Mono {
        input: PathBuf,
        #[arg(long = "dest")]
        dest: Option<PathBuf>,
        #[arg(long = "name")]
        name: Option<String>,
    },
    /// Write a default config file
    InitConfig { path: PathBuf },
}

impl Config {
    /// Create config from command line arguments and config file
    pub fn from_args_and_config(args: &Args) -> Result<Self> {
        let mut config = if let Some(config_path) = &args.config_file {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        // Command line flags override the file
        if args.verbose {
            config.processing.verbose = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load config from TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AudioForgeError::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| AudioForgeError::config(format!("Failed to parse config file: {}", e)))
    }

    /// Validate configuration parameter validity
    pub fn validate(&self) -> Result<()> {
        if self.resample.half_taps == 0 || self.resample.half_taps > 256 {
            return Err(AudioForgeError::config("Resampler half_taps must be in range [1, 256]"));
        }

        if !(self.resample.cutoff > 0.0 && self.resample.cutoff <= 1.0) {
            return Err(AudioForgeError::config("Resampler cutoff must be in range (0.0, 1.0]"));
        }

        if self.encode.quality > 9 {
            return Err(AudioForgeError::config("Encode quality cannot exceed 9"));
        }

        Ok(())
    }

    /// Save config to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AudioForgeError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| AudioForgeError::config(format!("Failed to write config file: {}", e)))
    }

    /// Create default config file
    pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}
