// EasyNMT client
// Talks to an EasyNMT service hosting the Opus-MT model family.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, SubtransError};
use super::MultilingualModel;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a [String],
    source_lang: &'a str,
    target_lang: &'a str,
    beam_size: u32,
    perform_sentence_splitting: bool,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated: Vec<String>,
}

pub struct EasyNmtClient {
    client: Client,
    endpoint: String,
    beam_size: u32,
}

impl EasyNmtClient {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            beam_size: config.beam_size,
        })
    }

    pub fn translate_url(&self) -> String {
        format!("{}/translate", self.endpoint)
    }
}

#[async_trait]
impl MultilingualModel for EasyNmtClient {
    async fn translate_batch(&self, texts: &[String], from_code: &str, to_code: &str) -> Result<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = TranslateRequest {
            text: texts,
            source_lang: from_code,
            target_lang: to_code,
            beam_size: self.beam_size,
            perform_sentence_splitting: true,
        };

        debug!("POST {} ({} lines {}→{})", self.translate_url(), texts.len(), from_code, to_code);
        let response = self
            .client
            .post(self.translate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| SubtransError::Translation(format!("EasyNMT request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubtransError::Translation(format!(
                "EasyNMT returned {}: {}",
                status,
                body.trim()
            )));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| SubtransError::Translation(format!("Invalid EasyNMT response: {}", e)))?;
        Ok(body.translated)
    }
}
