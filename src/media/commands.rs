use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SubtransError};

/// Media tool invocation assembled from chained arguments
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Only report errors on stderr
    pub fn quiet(self) -> Self {
        self.arg("-hide_banner").arg("-loglevel").arg("error")
    }

    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    pub fn format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-f").arg(format)
    }

    /// Execute the command; the child is killed if the future is dropped
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media command: {} {:?}", self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                SubtransError::Extraction(format!("{} unavailable ({}): {}", self.description, self.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubtransError::Extraction(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Builder for the media operations the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build audio extraction command: mono 16-bit PCM WAV at `sample_rate`
    pub fn extract_audio<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: Q,
        sample_rate: u32,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .overwrite()
            .quiet()
            .input(video_path)
            .no_video()
            .audio_channels(1)
            .audio_sample_rate(sample_rate)
            .audio_codec("pcm_s16le")
            .format("wav")
            .output(audio_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}
