//! Job execution pipeline
//!
//! A job decodes its inputs, runs one processing stage and encodes the result.
//! Output is staged next to the destination and renamed into place only once the
//! encoder has finished, so a failed job never leaves a partial file behind.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use crate::audio::{SampleBuffer, SampleFormat};
use crate::codec::{CodecGateway, EncodeHint, FileCodecGateway};
use crate::config::Config;
use crate::error::{AudioForgeError, ErrorKind, Result, status_of};
use crate::processing::{
    ChannelMixer, ChannelSpec, ConversionTarget, ConverterConfig, FormatConverter, TimeSpec, TimeTrimmer,
};

/// Processing stage a job applies.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Combine,
    Remix(ChannelSpec),
    Trim { start: TimeSpec, end: TimeSpec },
    Convert(ConversionTarget),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Combine => "combine",
            Operation::Remix(_) => "remix",
            Operation::Trim { .. } => "trim",
            Operation::Convert(_) => "convert",
        }
    }
}

/// One request: inputs, output and the operation between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub operation: Operation,
}

impl Job {
    pub fn combine<P: AsRef<Path>>(inputs: &[P], output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: inputs.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            output: output.into(),
            operation: Operation::Combine,
        }
    }

    pub fn remix(input: impl Into<PathBuf>, output: impl Into<PathBuf>, spec: ChannelSpec) -> Self {
        Self { inputs: vec![input.into()], output: output.into(), operation: Operation::Remix(spec) }
    }

    pub fn trim(input: impl Into<PathBuf>, output: impl Into<PathBuf>, start: TimeSpec, end: TimeSpec) -> Self {
        Self { inputs: vec![input.into()], output: output.into(), operation: Operation::Trim { start, end } }
    }

    pub fn convert(input: impl Into<PathBuf>, output: impl Into<PathBuf>, target: ConversionTarget) -> Self {
        Self { inputs: vec![input.into()], output: output.into(), operation: Operation::Convert(target) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    InputsDecoded,
    Processed,
    OutputEncoded,
    Done,
    Failed(ErrorKind),
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Created => f.write_str("created"),
            JobState::InputsDecoded => f.write_str("inputs-decoded"),
            JobState::Processed => f.write_str("processed"),
            JobState::OutputEncoded => f.write_str("output-encoded"),
            JobState::Done => f.write_str("done"),
            JobState::Failed(kind) => write!(f, "failed({})", kind.name()),
        }
    }
}

/// Summary of a completed job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub operation: &'static str,
    pub state: JobState,
    pub output_path: PathBuf,
    pub channels: usize,
    pub frames: usize,
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub processing_time: Duration,
}

impl JobReport {
    pub fn duration_seconds(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Runs jobs one at a time against a codec gateway.
///
/// Holds no per-job state, so a runner can be reused; it is not internally
/// synchronized and callers must not run jobs on it concurrently.
#[derive(Debug)]
pub struct JobRunner<G: CodecGateway = FileCodecGateway> {
    gateway: G,
    converter: FormatConverter,
    encode_quality: u8,
}

impl JobRunner<FileCodecGateway> {
    pub fn new(config: &Config) -> Self {
        Self::with_gateway(FileCodecGateway::new(), config)
    }
}

impl Default for JobRunner<FileCodecGateway> {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl<G: CodecGateway> JobRunner<G> {
    pub fn with_gateway(gateway: G, config: &Config) -> Self {
        let converter = FormatConverter::new(ConverterConfig {
            half_taps: config.resample.half_taps,
            cutoff: config.resample.cutoff,
            window: config.resample.window,
            dither: config.dither.kind,
            dither_seed: config.dither.seed,
        });

        Self { gateway, converter, encode_quality: config.encode.quality }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run `job` to completion, returning a report or the first failure.
    pub fn run(&self, job: Job) -> Result<JobReport> {
        let start_time = Instant::now();
        let operation = job.operation.name();
        info!("Starting {} -> {}", operation, job.output.display());

        let mut state = JobState::Created;
        match self.drive(&job, &mut state) {
            Ok(buffer) => {
                advance(&mut state, JobState::Done);
                let report = JobReport {
                    operation,
                    state,
                    output_path: job.output,
                    channels: buffer.channel_count(),
                    frames: buffer.frame_count(),
                    sample_rate: buffer.sample_rate(),
                    format: buffer.format(),
                    processing_time: start_time.elapsed(),
                };
                info!(
                    "Finished {} in {:.2}s: {} ({}ch, {}Hz, {}, {:.3}s)",
                    operation,
                    report.processing_time.as_secs_f64(),
                    report.output_path.display(),
                    report.channels,
                    report.sample_rate,
                    report.format,
                    report.duration_seconds()
                );
                Ok(report)
            }
            Err(e) => {
                let failed = fail(state, &e);
                warn!("{} {} after reaching state '{}': {}", operation, failed, state, e);
                Err(e)
            }
        }
    }

    /// Run `job` and collapse the outcome into a status code.
    pub fn execute(&self, job: Job) -> i32 {
        status_of(&self.run(job))
    }

    pub fn create_multi_channel_wave<P: AsRef<Path>>(&self, inputs: &[P], output: impl AsRef<Path>) -> i32 {
        self.execute(Job::combine(inputs, output.as_ref()))
    }

    pub fn remix(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, spec: ChannelSpec) -> i32 {
        self.execute(Job::remix(input.as_ref(), output.as_ref(), spec))
    }

    pub fn trim(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, start: TimeSpec, end: TimeSpec) -> i32 {
        self.execute(Job::trim(input.as_ref(), output.as_ref(), start, end))
    }

    pub fn convert(&self, input: impl AsRef<Path>, output: impl AsRef<Path>, target: ConversionTarget) -> i32 {
        self.execute(Job::convert(input.as_ref(), output.as_ref(), target))
    }

    fn drive(&self, job: &Job, state: &mut JobState) -> Result<SampleBuffer> {
        let hint = EncodeHint::for_path(&job.output)?.with_quality(self.encode_quality);

        let mut inputs = self.decode_inputs(&job.inputs)?;
        advance(state, JobState::InputsDecoded);

        let (buffer, bit_rate) = match &job.operation {
            Operation::Combine => (ChannelMixer::combine(inputs)?, None),
            Operation::Remix(spec) => (ChannelMixer::remix(single(&mut inputs)?, spec)?, None),
            Operation::Trim { start, end } => (TimeTrimmer::trim(single(&mut inputs)?, *start, *end)?, None),
            Operation::Convert(target) => {
                (self.converter.convert(single(&mut inputs)?, target)?, target.bit_rate)
            }
        };
        advance(state, JobState::Processed);

        self.write_output(&buffer, &job.output, &hint.with_bit_rate(bit_rate))?;
        advance(state, JobState::OutputEncoded);

        Ok(buffer)
    }

    pub(crate) fn decode_inputs(&self, paths: &[PathBuf]) -> Result<Vec<SampleBuffer>> {
        if paths.is_empty() {
            return Err(AudioForgeError::empty_input("Job has no input files"));
        }
        paths.iter().map(|path| self.gateway.decode(path)).collect()
    }

    /// Encode into a staging file beside `output`, then rename it into place.
    pub(crate) fn write_output(&self, buffer: &SampleBuffer, output: &Path, hint: &EncodeHint) -> Result<()> {
        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .map_err(|e| AudioForgeError::io(format!("Cannot create output directory {}: {}", parent.display(), e)))?;

        let suffix = format!(".{}", hint.container.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix(".audioforge-").suffix(&suffix);
        // Same mode a plain File::create would give, after umask
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let staging = builder.tempfile_in(parent)?;
        debug!("Staging {} at {}", output.display(), staging.path().display());

        self.gateway.encode(buffer, staging.path(), hint)?;
        staging.persist(output)?;
        Ok(())
    }
}

fn advance(state: &mut JobState, next: JobState) {
    debug!("Job state: {} -> {}", state, next);
    *state = next;
}

fn fail(reached: JobState, error: &AudioForgeError) -> JobState {
    let failed = JobState::Failed(error.kind());
    debug!("Job state: {} -> {}", reached, failed);
    failed
}

fn single(inputs: &mut Vec<SampleBuffer>) -> Result<SampleBuffer> {
    if inputs.len() != 1 {
        return Err(AudioForgeError::empty_input(format!("Expected exactly one input, got {}", inputs.len())));
    }
    inputs.pop().ok_or_else(|| AudioForgeError::empty_input("No input buffer"))
}
