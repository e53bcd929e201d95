use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SubtransError};

/// Source language selector for transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLanguage {
    /// Let the transcriber detect the spoken language
    Auto,
    /// Explicit code as given by the user, not yet normalized
    Code(String),
}

impl SourceLanguage {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SubtransError::Input("Source language cannot be empty".to_string()));
        }
        if value.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Ok(Self::Code(value.to_string()))
        }
    }

    /// Code handed to the transcriber, `None` for detection
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Auto => None,
            Self::Code(code) => Some(code),
        }
    }

    /// Pick the explicit code, or the detected one when set to auto
    pub fn resolve(&self, detected: Option<&str>) -> Result<String> {
        let raw = match self {
            Self::Code(code) => code.as_str(),
            Self::Auto => detected.ok_or_else(|| {
                SubtransError::Transcription(
                    "Source language is 'auto' but the transcriber detected none".to_string(),
                )
            })?,
        };
        normalize_code(raw)
    }
}

/// Normalize a language code: lowercase and drop everything after the first hyphen.
///
/// Only `xx`, `xxx`, `xx-YY` style codes are accepted; anything else
/// (several subtags, underscores, digits in the primary subtag) is rejected
/// rather than guessed at.
pub fn normalize_code(code: &str) -> Result<String> {
    let code = code.trim();
    let invalid = |why: &str| SubtransError::Input(format!("Invalid language code '{}': {}", code, why));

    if code.is_empty() {
        return Err(invalid("empty"));
    }

    let (primary, region) = match code.split_once('-') {
        Some((primary, region)) => (primary, Some(region)),
        None => (code, None),
    };

    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("primary subtag must be 2 or 3 letters"));
    }

    if let Some(region) = region {
        if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("expected a single subtag after the hyphen"));
        }
    }

    Ok(primary.to_ascii_lowercase())
}

/// Normalized source→target pair used to look up packages and backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguagePair {
    pub from_code: String,
    pub to_code: String,
}

impl LanguagePair {
    pub fn new(from_code: &str, to_code: &str) -> Result<Self> {
        Ok(Self {
            from_code: normalize_code(from_code)?,
            to_code: normalize_code(to_code)?,
        })
    }

    pub fn matches(&self, from_code: &str, to_code: &str) -> bool {
        self.from_code == from_code && self.to_code == to_code
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}→{}", self.from_code, self.to_code)
    }
}
