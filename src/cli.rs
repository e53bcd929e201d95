use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::translate::BackendKind;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe a video and write original and translated subtitles
    Run {
        /// Input video file
        video: PathBuf,

        /// Spoken language code, or auto to detect it
        #[arg(short, long, default_value = "auto")]
        language: String,

        /// Target language code
        #[arg(short, long)]
        to: String,

        /// Minimum silence (ms) that splits speech segments
        #[arg(long)]
        vad_ms: Option<u32>,

        /// Speech probability threshold (0.1-1.0)
        #[arg(long)]
        vad_threshold: Option<f32>,

        /// Disable voice activity detection
        #[arg(long)]
        no_vad: bool,

        #[arg(long)]
        beam_size: Option<u32>,

        #[command(flatten)]
        translation: TranslationArgs,

        /// Whisper model (e.g., large-v3, medium)
        #[arg(long)]
        model: Option<String>,

        /// Inference device: cuda or cpu
        #[arg(long)]
        device: Option<String>,

        /// CTranslate2 compute type (e.g., float16, int8)
        #[arg(long)]
        compute_type: Option<String>,
    },

    /// Translate an existing SRT file
    Translate {
        /// Input subtitle file
        input: PathBuf,

        /// Source language code
        #[arg(short, long)]
        from: String,

        /// Target language code
        #[arg(short, long)]
        to: String,

        /// Output file (defaults to <base>.<to>.srt next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        translation: TranslationArgs,
    },

    /// List installed language pairs
    Pairs {
        /// List pairs offered by the package index instead
        #[arg(long)]
        available: bool,
    },

    /// Download and install the package for a language pair
    Install {
        /// Source language code
        #[arg(short, long)]
        from: String,

        /// Target language code
        #[arg(short, long)]
        to: String,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct TranslationArgs {
    /// Translation backend: argos (per-pair packages) or opus (batched multilingual)
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Lines per request for the opus backend
    #[arg(long)]
    pub batch_size: Option<usize>,
}
