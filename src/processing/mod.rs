//! Audio processing stages and job execution

pub mod converter;
pub mod export;
pub mod mixer;
pub mod queue;
pub mod runner;
pub mod trimmer;

pub use converter::{
    ConversionTarget, ConverterConfig, DitherKind, Ditherer, FormatConverter, SincResampler, WindowKind,
};
pub use export::{ChannelExporter, SplitStereoPair};
pub use mixer::{ChannelMixer, ChannelRoute, ChannelSpec};
pub use queue::{JobTicket, SerialJobQueue};
pub use runner::{Job, JobReport, JobRunner, JobState, Operation};
pub use trimmer::{TimeSpec, TimeTrimmer};
