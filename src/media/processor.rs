use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::MediaConfig;
use crate::error::{Result, SubtransError};
use super::{AudioExtractor, MediaCommandBuilder};

/// ffmpeg-backed audio extractor
pub struct FfmpegExtractor {
    command_builder: MediaCommandBuilder,
}

impl FfmpegExtractor {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(&config.binary_path),
        }
    }

    /// Check that the media tool can be launched
    pub async fn check_availability(&self) -> Result<()> {
        self.command_builder.version_check().execute().await?;
        info!("Media processor is available");
        Ok(())
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, video_path: &Path, workspace: &Path, sample_rate: u32) -> Result<PathBuf> {
        if !video_path.is_file() {
            return Err(SubtransError::Extraction(format!(
                "Cannot read video {}",
                video_path.display()
            )));
        }

        let audio_path = workspace.join("audio.wav");
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        self.command_builder
            .extract_audio(video_path, &audio_path, sample_rate)
            .execute()
            .await?;

        if !audio_path.is_file() {
            return Err(SubtransError::Extraction(format!(
                "Audio extraction produced no output for {}",
                video_path.display()
            )));
        }

        info!("Audio extraction completed");
        Ok(audio_path)
    }
}
