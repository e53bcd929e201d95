use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{Result, SubtransError};
use crate::subtitle::SubtitleDocument;
use super::{TranslationBackend, progress_bar};

/// One model serving many language pairs, addressed per request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MultilingualModel: Send + Sync {
    async fn translate_batch(&self, texts: &[String], from_code: &str, to_code: &str) -> Result<Vec<String>>;
}

/// Splits the document text into consecutive batches and reassembles the
/// results in order
pub struct BatchMultilingualBackend {
    model: Box<dyn MultilingualModel>,
    batch_size: usize,
    show_progress: bool,
}

impl BatchMultilingualBackend {
    pub fn new(model: Box<dyn MultilingualModel>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(SubtransError::Input("Batch size must be at least 1".to_string()));
        }

        Ok(Self {
            model,
            batch_size,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

#[async_trait]
impl TranslationBackend for BatchMultilingualBackend {
    fn name(&self) -> &'static str {
        "opus"
    }

    async fn translate(&self, document: SubtitleDocument, from_code: &str, to_code: &str) -> Result<SubtitleDocument> {
        let contents = document.contents();
        info!(
            "Translating {} entries {}→{} in batches of {}",
            contents.len(),
            from_code,
            to_code,
            self.batch_size
        );
        let pb = progress_bar(contents.len(), self.show_progress);

        let mut translated = Vec::with_capacity(contents.len());
        for (number, chunk) in contents.chunks(self.batch_size).enumerate() {
            let batch = self.model.translate_batch(chunk, from_code, to_code).await?;
            if batch.len() != chunk.len() {
                return Err(SubtransError::Translation(format!(
                    "Batch {} returned {} lines for {} inputs",
                    number + 1,
                    batch.len(),
                    chunk.len()
                )));
            }
            debug!("Batch {} translated ({} lines)", number + 1, batch.len());
            pb.inc(chunk.len() as u64);
            translated.extend(batch);
        }
        pb.finish_and_clear();

        document.replace_contents(translated)
    }
}
