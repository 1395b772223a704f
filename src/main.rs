//! AudioForge - audio file job processor

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;
use audioforge::config::{Args, Command, Config};
use audioforge::processing::{ChannelExporter, ChannelSpec, ConversionTarget, Job, JobReport, JobRunner, TimeSpec};
use audioforge::{AudioForgeError, ErrorKind, init_logging};

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        process::exit(exit_code(&e));
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<AudioForgeError>())
        .map(AudioForgeError::status_code)
        .unwrap_or(ErrorKind::Io.status_code())
}

fn run(args: Args) -> Result<()> {
    let config = Config::from_args_and_config(&args)?;
    init_logging(config.verbose());
    if config.verbose() {
        println!("{}", audioforge::build_info());
        println!();
    }

    let runner = JobRunner::new(&config);
    match args.command {
        Command::Merge { inputs, output } => {
            print_report(&runner.run(Job::combine(&inputs[..], output))?);
        }
        Command::Remix { input, output, channels } => {
            let spec: ChannelSpec = channels.parse()?;
            print_report(&runner.run(Job::remix(input, output, spec))?);
        }
        Command::Trim { input, output, start, end } => {
            let start: TimeSpec = start.parse()?;
            let end: TimeSpec = end.parse()?;
            print_report(&runner.run(Job::trim(input, output, start, end))?);
        }
        Command::Convert { input, output, bits, rate, bit_rate } => {
            let target = ConversionTarget { sample_rate: rate, bit_depth: bits, bit_rate };
            print_report(&runner.run(Job::convert(input, output, target))?);
        }
        Command::SplitStereo { input, dest, name, no_overwrite } => {
            let pair = ChannelExporter::new(&runner)
                .split_stereo(&input, dest.as_deref(), name.as_deref(), !no_overwrite)
                .with_context(|| format!("Cannot split {}", input.display()))?;
            print_outputs(&[pair.left, pair.right]);
        }
        Command::ExportChannels { input, dest, name } => {
            let outputs = ChannelExporter::new(&runner)
                .export_channels(&input, dest.as_deref(), name.as_deref())
                .with_context(|| format!("Cannot export channels of {}", input.display()))?;
            print_outputs(&outputs);
        }
        Command::Mono { input, dest, name } => {
            let output = ChannelExporter::new(&runner)
                .stereo_to_mono(&input, dest.as_deref(), name.as_deref(), true)
                .with_context(|| format!("Cannot mix down {}", input.display()))?;
            print_outputs(&[output]);
        }
        Command::InitConfig { path } => {
            Config::create_default_config(&path)
                .with_context(|| format!("Cannot create config at {}", path.display()))?;
            println!("Default config written to {}", path.display());
        }
    }

    Ok(())
}

fn print_report(report: &JobReport) {
    println!("=== {} complete ===", report.operation);
    println!("Output: {}", report.output_path.display());
    println!(
        "Format: {} channel(s), {} Hz, {}, {:.3}s",
        report.channels,
        report.sample_rate,
        report.format,
        report.duration_seconds()
    );
    println!("Time: {:.2}s", report.processing_time.as_secs_f64());
}

fn print_outputs(outputs: &[PathBuf]) {
    for output in outputs {
        println!("Wrote {}", output.display());
    }
}
