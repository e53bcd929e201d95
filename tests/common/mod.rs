#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use subtrans::error::{Result, SubtransError};
use subtrans::language::LanguagePair;
use subtrans::media::AudioExtractor;
use subtrans::provision::{ModelCatalog, ModelPackage};
use subtrans::subtitle::SubtitleDocument;
use subtrans::transcribe::{Segment, TranscribeOptions, Transcriber, Transcript};
use subtrans::translate::{BackendFactory, TranslationBackend};

pub fn pair(from: &str, to: &str) -> LanguagePair {
    LanguagePair::new(from, to).unwrap()
}

/// Write an `.argosmodel`-style zip: one top-level directory holding
/// `metadata.json` and a dummy model file
pub fn write_package_archive(path: &Path, from: &str, to: &str) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    let top = format!("translate-{}_{}-1_0", from, to);

    zip.start_file(format!("{}/metadata.json", top), options).unwrap();
    write!(
        zip,
        r#"{{"package_version":"1.0","from_code":"{}","to_code":"{}","type":"translate"}}"#,
        from, to
    )
    .unwrap();
    zip.start_file(format!("{}/model/model.bin", top), options).unwrap();
    zip.write_all(b"weights").unwrap();
    zip.finish().unwrap();
}

/// Catalog serving local fixture archives and counting every call
#[derive(Clone, Default)]
pub struct CountingCatalog {
    pairs: Vec<LanguagePair>,
    pub listings: Arc<AtomicUsize>,
    pub downloads: Arc<AtomicUsize>,
}

impl CountingCatalog {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            pairs: pairs.iter().map(|(from, to)| pair(from, to)).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.listings.load(Ordering::SeqCst) + self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelCatalog for CountingCatalog {
    async fn available_packages(&self) -> Result<Vec<ModelPackage>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .pairs
            .iter()
            .map(|pair| ModelPackage {
                pair: pair.clone(),
                links: vec![format!("https://packages.invalid/translate-{}_{}-1_0.argosmodel", pair.from_code, pair.to_code)],
                package_version: "1.0".to_string(),
            })
            .collect())
    }

    async fn download(&self, package: &ModelPackage, dest_dir: &Path) -> Result<PathBuf> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let archive = dest_dir.join(format!("{}_{}.argosmodel", package.pair.from_code, package.pair.to_code));
        write_package_archive(&archive, &package.pair.from_code, &package.pair.to_code);
        Ok(archive)
    }
}

/// Writes a placeholder WAV into the workspace and remembers where
#[derive(Clone, Default)]
pub struct StubExtractor {
    pub workspace: Arc<std::sync::Mutex<Option<PathBuf>>>,
}

#[async_trait]
impl AudioExtractor for StubExtractor {
    async fn extract(&self, video_path: &Path, workspace: &Path, _sample_rate: u32) -> Result<PathBuf> {
        if !video_path.is_file() {
            return Err(SubtransError::Extraction(format!("Cannot read video {}", video_path.display())));
        }
        let audio = workspace.join("audio.wav");
        fs::write(&audio, b"RIFF")?;
        *self.workspace.lock().unwrap() = Some(workspace.to_path_buf());
        Ok(audio)
    }
}

/// Returns fixed segments and a fixed detected language
pub struct StubTranscriber {
    pub segments: Vec<Segment>,
    pub detected_language: Option<String>,
}

impl StubTranscriber {
    pub fn scenario(detected_language: Option<&str>) -> Self {
        let ms = Duration::from_millis;
        Self {
            segments: vec![
                Segment::new(ms(0), ms(1200), "Hi"),
                Segment::new(ms(1200), ms(2000), "Bye"),
                Segment::new(ms(2000), ms(3500), "End"),
            ],
            detected_language: detected_language.map(str::to_string),
        }
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, audio_path: &Path, _options: &TranscribeOptions) -> Result<Transcript> {
        if !audio_path.is_file() {
            return Err(SubtransError::Transcription(format!("{} is missing", audio_path.display())));
        }
        Ok(Transcript {
            segments: self.segments.clone(),
            detected_language: self.detected_language.clone(),
            duration: self.segments.last().map(|s| s.end).unwrap_or_default(),
        })
    }
}

pub struct UppercaseBackend;

#[async_trait]
impl TranslationBackend for UppercaseBackend {
    fn name(&self) -> &'static str {
        "uppercase"
    }

    async fn translate(&self, document: SubtitleDocument, _from: &str, _to: &str) -> Result<SubtitleDocument> {
        let contents = document.contents().into_iter().map(|c| c.to_uppercase()).collect();
        document.replace_contents(contents)
    }
}

pub struct UppercaseFactory;

#[async_trait]
impl BackendFactory for UppercaseFactory {
    async fn create_backend(&self, _pair: &LanguagePair) -> Result<Box<dyn TranslationBackend>> {
        Ok(Box::new(UppercaseBackend))
    }
}
