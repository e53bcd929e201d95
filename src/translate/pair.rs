use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Result, SubtransError};
use crate::language::LanguagePair;
use crate::provision::TranslatorHandle;
use crate::subtitle::SubtitleDocument;
use super::{TranslationBackend, progress_bar};

/// A model bound to a single language pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PairTranslator: Send + Sync {
    async fn translate_text(&self, text: &str) -> Result<String>;
}

/// Pair-model backend: translates entry by entry with one installed package.
///
/// It is only ever built from a `TranslatorHandle`, which comes out of the
/// provisioner.
pub struct PairModelBackend {
    handle: TranslatorHandle,
    translator: Box<dyn PairTranslator>,
    show_progress: bool,
}

impl PairModelBackend {
    pub fn new(handle: TranslatorHandle, translator: Box<dyn PairTranslator>) -> Self {
        Self {
            handle,
            translator,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn pair(&self) -> &LanguagePair {
        &self.handle.pair
    }
}

#[async_trait]
impl TranslationBackend for PairModelBackend {
    fn name(&self) -> &'static str {
        "argos"
    }

    async fn translate(&self, document: SubtitleDocument, from_code: &str, to_code: &str) -> Result<SubtitleDocument> {
        if !self.handle.pair.matches(from_code, to_code) {
            return Err(SubtransError::Translation(format!(
                "Translator for {} cannot translate {}→{}",
                self.handle.pair, from_code, to_code
            )));
        }

        info!("Translating {} entries {}", document.len(), self.handle.pair);
        let pb = progress_bar(document.len(), self.show_progress);

        let mut translated = Vec::with_capacity(document.len());
        for entry in document.entries() {
            if entry.content.trim().is_empty() {
                translated.push(entry.content.clone());
            } else {
                let text = self.translator.translate_text(&entry.content).await?;
                debug!("#{} {:?} -> {:?}", entry.index, entry.content, text);
                translated.push(text);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        document.replace_contents(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    struct Uppercase;

    #[async_trait]
    impl PairTranslator for Uppercase {
        async fn translate_text(&self, text: &str) -> Result<String> {
            Ok(text.to_uppercase())
        }
    }

    fn handle(from: &str, to: &str) -> TranslatorHandle {
        TranslatorHandle {
            pair: LanguagePair::new(from, to).unwrap(),
            install_path: PathBuf::from("/data/packages/en_fr"),
            packages_dir: PathBuf::from("/data/packages"),
        }
    }

    fn secs(seconds: f64) -> Duration {
        Duration::from_millis((seconds * 1000.0) as u64)
    }

    fn scenario() -> SubtitleDocument {
        let mut document = SubtitleDocument::new();
        document.push(secs(0.0), secs(1.2), "Hi");
        document.push(secs(1.2), secs(2.0), "Bye");
        document.push(secs(2.0), secs(3.5), "End");
        document
    }

    #[tokio::test]
    async fn test_uppercase_stub_keeps_timing() {
        let backend = PairModelBackend::new(handle("en", "fr"), Box::new(Uppercase));
        let source = scenario();
        let translated = backend.translate(source.clone(), "en", "fr").await.unwrap();

        assert_eq!(translated.contents(), vec!["HI", "BYE", "END"]);
        for (before, after) in source.entries().iter().zip(translated.entries()) {
            assert_eq!(before.index, after.index);
            assert_eq!(before.start, after.start);
            assert_eq!(before.end, after.end);
        }
    }

    #[tokio::test]
    async fn test_rejects_other_pairs() {
        let backend = PairModelBackend::new(handle("en", "fr"), Box::new(Uppercase));
        let result = backend.translate(scenario(), "fr", "en").await;
        assert!(matches!(result, Err(SubtransError::Translation(_))));
    }

    #[tokio::test]
    async fn test_blank_entries_skip_the_model() {
        let mut translator = MockPairTranslator::new();
        translator
            .expect_translate_text()
            .times(1)
            .returning(|text| Ok(format!("[{}]", text)));

        let mut document = SubtitleDocument::new();
        document.push(secs(0.0), secs(1.0), "");
        document.push(secs(1.0), secs(2.0), "Bonjour");

        let backend = PairModelBackend::new(handle("fr", "en"), Box::new(translator));
        let translated = backend.translate(document, "fr", "en").await.unwrap();
        assert_eq!(translated.contents(), vec!["", "[Bonjour]"]);
    }

    #[tokio::test]
    async fn test_engine_failure_aborts() {
        let mut translator = MockPairTranslator::new();
        translator
            .expect_translate_text()
            .returning(|_| Err(SubtransError::Translation("model crashed".to_string())));

        let backend = PairModelBackend::new(handle("en", "fr"), Box::new(translator));
        assert!(matches!(
            backend.translate(scenario(), "en", "fr").await,
            Err(SubtransError::Translation(message)) if message == "model crashed"
        ));
    }
}
