mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use std::time::Duration;

use common::{CountingCatalog, StubExtractor, StubTranscriber, UppercaseFactory};
use subtrans::error::{ProvisioningError, SubtransError};
use subtrans::language::LanguagePair;
use subtrans::pipeline::{Job, Pipeline, Stage, StageTracker};
use subtrans::provision::{LocalRegistry, ModelProvisioner};
use subtrans::subtitle;
use subtrans::transcribe::TranscribeOptions;
use subtrans::translate::{BackendKind, TranslatorFactory};
use subtrans::config::TranslateConfig;

fn video(dir: &TempDir) -> std::path::PathBuf {
    let video = dir.child("lecture.mkv");
    video.write_binary(b"\x1a\x45\xdf\xa3").unwrap();
    video.path().to_path_buf()
}

#[tokio::test]
async fn writes_original_and_translated_subtitles() {
    let dir = TempDir::new().unwrap();
    let job = Job::new(video(&dir), "auto", "fr", TranscribeOptions::default(), 16_000).unwrap();
    let extractor = StubExtractor::default();

    let pipeline = Pipeline::new(
        Box::new(extractor.clone()),
        Box::new(StubTranscriber::scenario(Some("en"))),
        Box::new(UppercaseFactory),
    );
    let report = pipeline.run(&job).await.unwrap();

    assert_eq!(report.original_path, dir.path().join("lecture.orig.srt"));
    assert_eq!(report.translated_path, dir.path().join("lecture.fr.srt"));
    assert_eq!(report.duration, Duration::from_millis(3500));

    let original = std::fs::read_to_string(&report.original_path).unwrap();
    assert_eq!(
        original,
        "1\n00:00:00,000 --> 00:00:01,200\nHi\n\n2\n00:00:01,200 --> 00:00:02,000\nBye\n\n3\n00:00:02,000 --> 00:00:03,500\nEnd\n"
    );
    let translated = subtitle::read_srt(&report.translated_path).await.unwrap();
    assert_eq!(translated.contents(), vec!["HI", "BYE", "END"]);

    let workspace = extractor.workspace.lock().unwrap().clone().unwrap();
    assert!(!workspace.exists(), "workspace should be removed after the run");
}

#[tokio::test]
async fn missing_pair_fails_after_original_is_written() {
    let dir = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let job = Job::new(video(&dir), "fr", "xx", TranscribeOptions::default(), 16_000).unwrap();

    let catalog = CountingCatalog::new(&[("fr", "en")]);
    let provisioner = ModelProvisioner::new(Box::new(catalog.clone()), Box::new(LocalRegistry::new(data.path())));
    let config = TranslateConfig {
        backend: BackendKind::PairModel,
        show_progress: false,
        ..Default::default()
    };
    let extractor = StubExtractor::default();
    let pipeline = Pipeline::new(
        Box::new(extractor.clone()),
        Box::new(StubTranscriber::scenario(None)),
        Box::new(TranslatorFactory::new(config, provisioner)),
    );

    let mut tracker = StageTracker::new();
    let result = pipeline.run_with_tracker(&job, &mut tracker).await;

    match result {
        Err(SubtransError::Provisioning(ProvisioningError::PairNotFound(pair))) => {
            assert_eq!(pair, LanguagePair::new("fr", "xx").unwrap());
        }
        other => panic!("expected PairNotFound, got {:?}", other),
    }
    assert!(matches!(tracker.current(), Stage::Failed(_)));
    assert_eq!(catalog.downloads.load(std::sync::atomic::Ordering::SeqCst), 0);

    let original = subtitle::read_srt(job.original_path()).await.unwrap();
    assert_eq!(original.len(), 3);
    assert!(!job.translated_path().exists());
    let workspace = extractor.workspace.lock().unwrap().clone().unwrap();
    assert!(!workspace.exists());
}

#[test]
fn job_rejects_missing_video() {
    let dir = TempDir::new().unwrap();
    let result = Job::new(dir.path().join("none.mp4"), "auto", "fr", TranscribeOptions::default(), 16_000);
    assert!(matches!(result, Err(SubtransError::Input(_))));
}
