// faster-whisper implementation
// Drives the whisper-ctranslate2 command-line tool and reads its JSON output.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, SubtransError};
use super::{TranscribeOptions, Transcriber, Transcript, common::WhisperJsonOutput};

pub struct FasterWhisperTranscriber {
    config: TranscriberConfig,
}

impl FasterWhisperTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    /// Command-line arguments for one transcription run
    pub fn build_args(&self, audio_path: &Path, output_dir: &Path, options: &TranscribeOptions) -> Vec<String> {
        let mut args = vec![
            audio_path.to_string_lossy().to_string(),
            "--model".to_string(),
            self.config.model.clone(),
            "--device".to_string(),
            self.config.device.clone(),
            "--compute_type".to_string(),
            self.config.compute_type.clone(),
            "--beam_size".to_string(),
            options.beam_size.to_string(),
            "--temperature".to_string(),
            self.config.temperature.to_string(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
        ];

        if let Some(language) = &options.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }

        if options.vad_enabled {
            args.extend([
                "--vad_filter".to_string(),
                "True".to_string(),
                "--vad_min_silence_duration_ms".to_string(),
                options.vad_min_silence_ms.to_string(),
                "--vad_speech_pad_ms".to_string(),
                self.config.vad_speech_pad_ms.to_string(),
                "--vad_threshold".to_string(),
                options.vad_threshold.to_string(),
            ]);
        }

        args
    }
}

#[async_trait]
impl Transcriber for FasterWhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path, options: &TranscribeOptions) -> Result<Transcript> {
        info!(
            "Transcribing with faster-whisper [{}] on {} ({})...",
            self.config.model, self.config.device, self.config.compute_type
        );

        let output_dir = tempfile::tempdir()
            .map_err(|e| SubtransError::Transcription(format!("Failed to create temp directory: {}", e)))?;
        let args = self.build_args(audio_path, output_dir.path(), options);

        debug!("Executing transcriber: {} {:?}", self.config.binary_path, args);

        let output = Command::new(&self.config.binary_path)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                SubtransError::Transcription(format!("Failed to execute {}: {}", self.config.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubtransError::Transcription(format!(
                "{} exited with {}: {}",
                self.config.binary_path,
                output.status,
                stderr.trim()
            )));
        }

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| SubtransError::Transcription("Invalid audio filename".to_string()))?;
        let json_file = output_dir.path().join(format!("{}.json", audio_stem.to_string_lossy()));

        let json_content = tokio::fs::read_to_string(&json_file).await.map_err(|e| {
            SubtransError::Transcription(format!("Failed to read {}: {}", json_file.display(), e))
        })?;
        let parsed: WhisperJsonOutput = serde_json::from_str(&json_content)
            .map_err(|e| SubtransError::Transcription(format!("Failed to parse transcriber JSON: {}", e)))?;

        let transcript = Transcript::from(parsed);
        info!(
            "Detected language: {} | Duration: {:.1}s | {} segments",
            transcript.detected_language.as_deref().unwrap_or("unknown"),
            transcript.duration.as_secs_f64(),
            transcript.segments.len()
        );
        Ok(transcript)
    }
}
