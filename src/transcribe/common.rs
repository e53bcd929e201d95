use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Segment, Transcript};

/// JSON document written by whisper-style command-line tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperJsonOutput {
    #[serde(default)]
    pub text: String,
    pub segments: Vec<WhisperJsonSegment>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperJsonSegment {
    #[serde(default)]
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub avg_logprob: Option<f64>,
    #[serde(default)]
    pub no_speech_prob: Option<f64>,
}

impl From<WhisperJsonOutput> for Transcript {
    fn from(output: WhisperJsonOutput) -> Self {
        let segments: Vec<Segment> = output
            .segments
            .into_iter()
            .map(|seg| Segment::new(seconds_to_duration(seg.start), seconds_to_duration(seg.end), seg.text.trim()))
            .collect();

        let duration = segments.iter().map(|seg| seg.end).max().unwrap_or_default();

        Transcript {
            segments,
            detected_language: output.language.filter(|lang| !lang.trim().is_empty()),
            duration,
        }
    }
}

/// Convert fractional seconds to a millisecond-rounded duration
pub fn seconds_to_duration(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_millis((seconds * 1000.0).round() as u64)
}
