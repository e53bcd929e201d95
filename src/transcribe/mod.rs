// Speech-to-text collaborator
//
// The pipeline only depends on the `Transcriber` trait; the default
// implementation drives the faster-whisper command-line tool.

pub mod common;
pub mod faster_whisper;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub use common::*;
pub use faster_whisper::FasterWhisperTranscriber;
use crate::error::{Result, SubtransError};

/// A stretch of recognized speech
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl Segment {
    pub fn new(start: Duration, end: Duration, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Result of transcribing one audio file
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub segments: Vec<Segment>,
    /// Language reported by the model, if any
    pub detected_language: Option<String>,
    /// Length of the transcribed media
    pub duration: Duration,
}

/// Per-run transcription parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribeOptions {
    /// Source language hint, `None` to auto-detect
    pub language: Option<String>,
    pub vad_enabled: bool,
    pub vad_min_silence_ms: u32,
    pub vad_threshold: f32,
    pub beam_size: u32,
}

impl TranscribeOptions {
    pub fn validate(&self) -> Result<()> {
        if self.vad_min_silence_ms == 0 {
            return Err(SubtransError::Input(
                "VAD minimum silence duration must be a positive number of milliseconds".to_string(),
            ));
        }
        if !(0.1..=1.0).contains(&self.vad_threshold) {
            return Err(SubtransError::Input(format!(
                "VAD threshold must be between 0.1 and 1.0, got {}",
                self.vad_threshold
            )));
        }
        if self.beam_size == 0 {
            return Err(SubtransError::Input("Beam size must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: None,
            vad_enabled: true,
            vad_min_silence_ms: 500,
            vad_threshold: 0.5,
            beam_size: 5,
        }
    }
}

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a mono PCM WAV file into ordered segments
    async fn transcribe(&self, audio_path: &Path, options: &TranscribeOptions) -> Result<Transcript>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_validation() {
        assert!(TranscribeOptions::default().validate().is_ok());

        let bounds = TranscribeOptions { vad_threshold: 0.1, ..Default::default() };
        assert!(bounds.validate().is_ok());
        let bounds = TranscribeOptions { vad_threshold: 1.0, ..Default::default() };
        assert!(bounds.validate().is_ok());

        for invalid in [
            TranscribeOptions { vad_threshold: 0.05, ..Default::default() },
            TranscribeOptions { vad_threshold: 1.5, ..Default::default() },
            TranscribeOptions { vad_min_silence_ms: 0, ..Default::default() },
            TranscribeOptions { beam_size: 0, ..Default::default() },
        ] {
            assert!(matches!(invalid.validate(), Err(SubtransError::Input(_))));
        }
    }
}
