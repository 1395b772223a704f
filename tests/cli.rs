use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn write_tone(path: &Path, channels: u16, frames: usize) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let value = ((i as f64 * 0.05).sin() * 8000.0) as i16;
        for _ in 0..channels {
            writer.write_sample(value).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn audioforge() -> Command {
    Command::cargo_bin("audioforge").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    audioforge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge").and(predicate::str::contains("split-stereo")));
}

#[test]
fn test_trim_command() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_tone(&input, 2, 8000);

    audioforge()
        .args(["trim", input.to_str().unwrap(), "-o", output.to_str().unwrap(), "--start", "0.25", "--end", "0.75"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trim complete"));

    let reader = hound::WavReader::open(&output).unwrap();
    assert_eq!(reader.duration(), 4000);
}

#[test]
fn test_exit_code_is_status_code() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    write_tone(&input, 2, 100);
    let output = dir.path().join("out.wav");

    audioforge()
        .args(["remix", input.to_str().unwrap(), "-o", output.to_str().unwrap(), "--channels", "5"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Error"));

    audioforge()
        .args(["convert", input.to_str().unwrap(), "-o", output.to_str().unwrap(), "--bits", "12"])
        .assert()
        .code(8);

    audioforge()
        .args(["trim", input.to_str().unwrap(), "-o", output.to_str().unwrap(), "--start", "soon"])
        .assert()
        .code(7);

    assert!(!output.exists());
}

#[test]
fn test_mono_and_merge() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("pair.wav");
    write_tone(&input, 2, 400);

    audioforge()
        .args(["mono", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("pair.Mono.wav"));

    let mono = dir.path().join("pair.Mono.wav");
    let merged = dir.path().join("merged.wav");
    audioforge()
        .args(["merge", input.to_str().unwrap(), mono.to_str().unwrap(), "-o", merged.to_str().unwrap()])
        .assert()
        .success();

    assert_eq!(hound::WavReader::open(&merged).unwrap().spec().channels, 3);
}

#[test]
fn test_init_config_and_bad_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("audioforge.toml");

    audioforge().args(["init-config", config.to_str().unwrap()]).assert().success();
    let content = std::fs::read_to_string(&config).unwrap();
    assert!(content.contains("half_taps = 32"));

    std::fs::write(&config, "[encode]\nquality = 42\n").unwrap();
    audioforge()
        .args(["-c", config.to_str().unwrap(), "mono", "whatever.wav"])
        .assert()
        .code(10);
}

#[test]
fn test_verbose_from_config_enables_debug_logging() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("audioforge.toml");
    std::fs::write(&config, "[processing]\nverbose = true\n").unwrap();
    let input = dir.path().join("in.wav");
    write_tone(&input, 1, 100);
    let output = dir.path().join("out.wav");

    audioforge()
        .env_remove("RUST_LOG")
        .args(["-c", config.to_str().unwrap(), "trim", input.to_str().unwrap(), "-o", output.to_str().unwrap(), "--start", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("encode: wav"))
        .stderr(predicate::str::contains("Job state"));
}
