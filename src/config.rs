use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SubtransError};
use crate::translate::BackendKind;

/// Package index published by the Argos Translate project
pub const DEFAULT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/argosopentech/argospm-index/main/index.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub provision: ProvisionConfig,
    pub media: MediaConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Path to the faster-whisper command-line tool
    pub binary_path: String,
    /// Whisper model (e.g., large-v3, distil-large-v3, medium, small)
    pub model: String,
    /// Inference device: cuda or cpu
    pub device: String,
    /// CTranslate2 compute type (e.g., float16, int8_float16)
    pub compute_type: String,
    pub beam_size: u32,
    pub vad_min_silence_ms: u32,
    pub vad_threshold: f32,
    /// Padding kept around detected speech
    pub vad_speech_pad_ms: u32,
    pub temperature: f32,
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper-ctranslate2".to_string(),
            model: "large-v3".to_string(),
            device: "cuda".to_string(),
            compute_type: "float16".to_string(),
            beam_size: 5,
            vad_min_silence_ms: 500,
            vad_threshold: 0.5,
            vad_speech_pad_ms: 100,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Translation engine used for a run
    pub backend: BackendKind,
    /// Lines per request for the multilingual backend
    pub batch_size: usize,
    /// Draw a progress bar while translating
    pub show_progress: bool,
    /// Path to the argos-translate command-line tool
    pub argos_binary: String,
    /// Argos device type: cpu, cuda or auto
    pub argos_device: String,
    /// EasyNMT service serving the Opus-MT model
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub beam_size: u32,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::PairModel,
            batch_size: 32,
            show_progress: true,
            argos_binary: "argos-translate".to_string(),
            argos_device: "auto".to_string(),
            endpoint: "http://localhost:24080".to_string(),
            request_timeout_secs: 300,
            beam_size: 5,
        }
    }
}

impl TranslateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(SubtransError::Input("Batch size must be at least 1".to_string()));
        }
        if self.beam_size == 0 {
            return Err(SubtransError::Input("Translation beam size must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Catalog of downloadable language-pair packages
    pub index_url: String,
    /// Root of the local package registry; defaults to the Argos data directory
    pub data_dir: Option<PathBuf>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            data_dir: None,
        }
    }
}

impl ProvisionConfig {
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("argos-translate"))
                .ok_or_else(|| SubtransError::Config("Cannot determine the user data directory".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Sample rate of the extracted speech track
    pub sample_rate: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            sample_rate: 16_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the daily rolling log file
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".subtrans").join("log"),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubtransError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubtransError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtransError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubtransError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
