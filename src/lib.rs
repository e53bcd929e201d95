//! subtrans - speech-to-subtitle translation
//!
//! Extracts a video's speech track, transcribes it into time-coded
//! subtitles and machine-translates them, provisioning translation models
//! on demand.

pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod media;
pub mod pipeline;
pub mod provision;
pub mod subtitle;
pub mod transcribe;
pub mod translate;
