use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::error::{Result, SubtransError};
use crate::language::{LanguagePair, SourceLanguage, normalize_code};
use crate::media::AudioExtractor;
use crate::subtitle::{self, SubtitleDocument};
use crate::transcribe::{TranscribeOptions, Transcriber};
use crate::translate::BackendFactory;

/// One fully validated run: everything the pipeline needs, fixed up front
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub video_path: PathBuf,
    pub source_language: SourceLanguage,
    /// Normalized target code
    pub target_code: String,
    pub transcribe: TranscribeOptions,
    pub sample_rate: u32,
}

impl Job {
    pub fn new(
        video_path: impl Into<PathBuf>,
        source_language: &str,
        target_code: &str,
        mut transcribe: TranscribeOptions,
        sample_rate: u32,
    ) -> Result<Self> {
        let video_path = video_path.into();
        if !video_path.is_file() {
            return Err(SubtransError::Input(format!(
                "Video file not found: {}",
                video_path.display()
            )));
        }
        if target_code.trim().is_empty() {
            return Err(SubtransError::Input("Target language is required".to_string()));
        }
        if sample_rate == 0 {
            return Err(SubtransError::Input("Sample rate must be positive".to_string()));
        }

        let source_language = SourceLanguage::parse(source_language)?;
        let target_code = normalize_code(target_code)?;

        // the transcriber only knows primary subtags
        transcribe.language = source_language.hint().map(normalize_code).transpose()?;
        transcribe.validate()?;

        Ok(Self {
            video_path,
            source_language,
            target_code,
            transcribe,
            sample_rate,
        })
    }

    /// `<base>.orig.srt`
    pub fn original_path(&self) -> PathBuf {
        append_suffix(&self.video_path.with_extension(""), "orig.srt")
    }

    /// `<base>.<to_code>.srt`
    pub fn translated_path(&self) -> PathBuf {
        append_suffix(&self.video_path.with_extension(""), &format!("{}.srt", self.target_code))
    }
}

fn append_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Init,
    AudioExtracted,
    Transcribed,
    OriginalWritten,
    TranslatorReady,
    Translated,
    Done,
    Failed(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Init => write!(f, "init"),
            Stage::AudioExtracted => write!(f, "audio extracted"),
            Stage::Transcribed => write!(f, "transcribed"),
            Stage::OriginalWritten => write!(f, "original written"),
            Stage::TranslatorReady => write!(f, "translator ready"),
            Stage::Translated => write!(f, "translated"),
            Stage::Done => write!(f, "done"),
            Stage::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Records every stage a run passes through
#[derive(Debug, Clone)]
pub struct StageTracker {
    history: Vec<Stage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            history: vec![Stage::Init],
        }
    }

    pub fn current(&self) -> &Stage {
        // history always starts with Init
        &self.history[self.history.len() - 1]
    }

    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    fn advance(&mut self, stage: Stage) {
        info!("Stage: {}", stage);
        self.history.push(stage);
    }

    fn fail(&mut self, reason: String) {
        error!("Stage {} failed: {}", self.current(), reason);
        self.history.push(Stage::Failed(reason));
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub pair: LanguagePair,
    pub original_path: PathBuf,
    pub translated_path: PathBuf,
    pub entries: usize,
    pub duration: Duration,
    pub detected_language: Option<String>,
}

/// Video in, original and translated subtitle files out.
///
/// Each run owns a temporary workspace that is removed when the run ends,
/// whether it succeeds, fails or is dropped mid-flight.
pub struct Pipeline {
    extractor: Box<dyn AudioExtractor>,
    transcriber: Box<dyn Transcriber>,
    backends: Box<dyn BackendFactory>,
}

impl Pipeline {
    pub fn new(
        extractor: Box<dyn AudioExtractor>,
        transcriber: Box<dyn Transcriber>,
        backends: Box<dyn BackendFactory>,
    ) -> Self {
        Self {
            extractor,
            transcriber,
            backends,
        }
    }

    pub async fn run(&self, job: &Job) -> Result<PipelineReport> {
        let mut tracker = StageTracker::new();
        self.run_with_tracker(job, &mut tracker).await
    }

    pub async fn run_with_tracker(&self, job: &Job, tracker: &mut StageTracker) -> Result<PipelineReport> {
        info!("Processing {}", job.video_path.display());
        match self.execute(job, tracker).await {
            Ok(report) => {
                tracker.advance(Stage::Done);
                Ok(report)
            }
            Err(e) => {
                tracker.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn execute(&self, job: &Job, tracker: &mut StageTracker) -> Result<PipelineReport> {
        let workspace = tempfile::Builder::new().prefix("subtrans-").tempdir()?;

        let audio_path = self
            .extractor
            .extract(&job.video_path, workspace.path(), job.sample_rate)
            .await?;
        tracker.advance(Stage::AudioExtracted);

        let transcript = self.transcriber.transcribe(&audio_path, &job.transcribe).await?;
        tracker.advance(Stage::Transcribed);

        let document = SubtitleDocument::from_segments(&transcript.segments);
        let original_path = job.original_path();
        subtitle::write_srt(&original_path, &document).await?;
        tracker.advance(Stage::OriginalWritten);

        let from_code = job
            .source_language
            .resolve(transcript.detected_language.as_deref())?;
        let pair = LanguagePair::new(&from_code, &job.target_code)?;
        let backend = self.backends.create_backend(&pair).await?;
        tracker.advance(Stage::TranslatorReady);

        let entries = document.len();
        let translated = backend
            .translate(document, &pair.from_code, &pair.to_code)
            .await?;
        tracker.advance(Stage::Translated);

        let translated_path = job.translated_path();
        subtitle::write_srt(&translated_path, &translated).await?;
        info!(
            "Wrote {} and {} ({} entries, {} backend)",
            original_path.display(),
            translated_path.display(),
            entries,
            backend.name()
        );

        Ok(PipelineReport {
            pair,
            original_path,
            translated_path,
            entries,
            duration: transcript.duration,
            detected_language: transcript.detected_language,
        })
    }
}

/// Default output for translating an existing SRT: `<base>.<to_code>.srt`,
/// where a trailing `.orig` is dropped from the base
pub fn translated_srt_path(input: &Path, to_code: &str) -> PathBuf {
    let base = input.with_extension("");
    let base = match base.extension() {
        Some(ext) if ext == "orig" => base.with_extension(""),
        _ => base,
    };
    append_suffix(&base, &format!("{}.srt", to_code))
}

/// Translate an existing subtitle file without the audio stages
pub async fn translate_srt(
    backends: &dyn BackendFactory,
    input: &Path,
    pair: &LanguagePair,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let document = subtitle::read_srt(input).await?;
    let backend = backends.create_backend(pair).await?;
    let translated = backend
        .translate(document, &pair.from_code, &pair.to_code)
        .await?;

    let output = output.unwrap_or_else(|| translated_srt_path(input, &pair.to_code));
    subtitle::write_srt(&output, &translated).await?;
    info!("Wrote {} ({} entries)", output.display(), translated.len());
    Ok(output)
}
