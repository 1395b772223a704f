//! Per-channel export helpers built on the job runner

use std::path::{Path, PathBuf};
use log::info;
use crate::codec::{CodecGateway, EncodeHint};
use crate::error::{AudioForgeError, Result};
use crate::processing::{ChannelMixer, ChannelSpec, JobRunner};

/// Left and right mono files produced by [`ChannelExporter::split_stereo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitStereoPair {
    pub left: PathBuf,
    pub right: PathBuf,
}

/// Writes individual channels of one source file as separate mono files.
///
/// Output names are `<base>.<tag>.<ext>`, where `base` defaults to the source's
/// file stem and `ext` is the source's extension. Files go to `destination`
/// when it is an existing directory, otherwise next to the source.
pub struct ChannelExporter<'a, G: CodecGateway> {
    runner: &'a JobRunner<G>,
}

impl<'a, G: CodecGateway> ChannelExporter<'a, G> {
    pub fn new(runner: &'a JobRunner<G>) -> Self {
        Self { runner }
    }

    pub fn split_stereo(
        &self,
        input: &Path,
        destination: Option<&Path>,
        new_name: Option<&str>,
        overwrite: bool,
    ) -> Result<SplitStereoPair> {
        let left = output_path(input, destination, new_name, "L")?;
        let right = output_path(input, destination, new_name, "R")?;

        self.export(input, &[(ChannelSpec::Left, &left), (ChannelSpec::Right, &right)], overwrite)?;
        Ok(SplitStereoPair { left, right })
    }

    /// One mono file per channel, tagged with the 1-based channel number.
    pub fn export_channels(&self, input: &Path, destination: Option<&Path>, new_name: Option<&str>) -> Result<Vec<PathBuf>> {
        let buffer = self.decode_nonempty(input)?;
        let outputs: Vec<(ChannelSpec, PathBuf)> = (0..buffer.channel_count())
            .map(|c| -> Result<(ChannelSpec, PathBuf)> {
                Ok((ChannelSpec::single(c), output_path(input, destination, new_name, &(c + 1).to_string())?))
            })
            .collect::<Result<_>>()?;

        let hint = EncodeHint::for_path(input)?;
        for (spec, path) in &outputs {
            let mono = ChannelMixer::remix(buffer.clone(), spec)?;
            self.runner.write_output(&mono, path, &hint)?;
        }
        info!("Exported {} channel(s) of {}", outputs.len(), input.display());
        Ok(outputs.into_iter().map(|(_, path)| path).collect())
    }

    /// Equal-weight mixdown of every channel into `<base>.Mono.<ext>`.
    pub fn stereo_to_mono(
        &self,
        input: &Path,
        destination: Option<&Path>,
        new_name: Option<&str>,
        overwrite: bool,
    ) -> Result<PathBuf> {
        let mono = output_path(input, destination, new_name, "Mono")?;
        self.export(input, &[(ChannelSpec::MixToMono, &mono)], overwrite)?;
        Ok(mono)
    }

    fn export(&self, input: &Path, outputs: &[(ChannelSpec, &PathBuf)], overwrite: bool) -> Result<()> {
        let pending: Vec<_> = outputs.iter().filter(|(_, path)| overwrite || !path.exists()).collect();
        if pending.is_empty() {
            info!("All outputs for {} already exist, skipping", input.display());
            return Ok(());
        }

        let buffer = self.decode_nonempty(input)?;
        for (spec, _) in &pending {
            spec.resolve(buffer.channel_count())?;
        }

        let hint = EncodeHint::for_path(input)?;
        for (spec, path) in pending {
            let remixed = ChannelMixer::remix(buffer.clone(), spec)?;
            self.runner.write_output(&remixed, path, &hint)?;
            info!("Wrote {}", path.display());
        }
        Ok(())
    }

    fn decode_nonempty(&self, input: &Path) -> Result<crate::audio::SampleBuffer> {
        let mut buffers = self.runner.decode_inputs(&[input.to_path_buf()])?;
        let buffer = buffers.pop().ok_or_else(|| AudioForgeError::empty_input("No input buffer"))?;
        if buffer.is_empty() {
            return Err(AudioForgeError::empty_input(format!("Duration is 0 for {}", input.display())));
        }
        Ok(buffer)
    }
}

fn output_path(input: &Path, destination: Option<&Path>, new_name: Option<&str>, tag: &str) -> Result<PathBuf> {
    let dir = match destination {
        Some(dir) if dir.is_dir() => dir.to_path_buf(),
        _ => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let base = match new_name {
        Some(name) => name.to_string(),
        None => input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| AudioForgeError::io(format!("Input has no file name: {}", input.display())))?,
    };
    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("wav");
    Ok(dir.join(format!("{}.{}.{}", base, tag, ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_naming() {
        let path = output_path(Path::new("/music/tabla.wav"), None, None, "L").unwrap();
        assert_eq!(path, PathBuf::from("/music/tabla.L.wav"));

        let path = output_path(Path::new("/music/tabla.wav"), Some(Path::new("/does/not/exist")), Some("TEST"), "3").unwrap();
        assert_eq!(path, PathBuf::from("/music/TEST.3.wav"));

        let path = output_path(Path::new("take.aiff"), None, None, "Mono").unwrap();
        assert_eq!(path, PathBuf::from("take.Mono.aiff"));
    }
}
