// Audio extraction collaborator
//
// - Commands: ffmpeg argument builders
// - Processor: the ffmpeg-backed `AudioExtractor`

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use commands::*;
pub use processor::*;

use crate::error::Result;

/// Pulls the speech track out of a video file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Write a mono PCM WAV at `sample_rate` into `workspace`, returning its path
    async fn extract(&self, video_path: &Path, workspace: &Path, sample_rate: u32) -> Result<PathBuf>;
}
