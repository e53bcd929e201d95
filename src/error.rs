use thiserror::Error;

use crate::language::LanguagePair;

#[derive(Error, Debug)]
pub enum SubtransError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Malformed SRT in block {block}: {reason}")]
    Format { block: usize, reason: String },

    #[error("Audio extraction error: {0}")]
    Extraction(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures of the language-pair provisioning protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("no package in the catalog translates {0}")]
    PairNotFound(LanguagePair),

    #[error("failed to install package for {pair}: {cause}")]
    InstallFailed { pair: LanguagePair, cause: String },

    #[error("translator for {0} is still unavailable after install")]
    StillUnavailable(LanguagePair),
}

impl ProvisioningError {
    pub fn pair(&self) -> &LanguagePair {
        match self {
            Self::PairNotFound(pair) | Self::StillUnavailable(pair) => pair,
            Self::InstallFailed { pair, .. } => pair,
        }
    }
}

pub type Result<T> = std::result::Result<T, SubtransError>;
