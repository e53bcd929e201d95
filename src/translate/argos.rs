// Argos Translate engine
// Runs the argos-translate command-line tool against the installed package tree.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, SubtransError};
use crate::language::LanguagePair;
use crate::provision::TranslatorHandle;
use super::PairTranslator;

pub struct ArgosCliTranslator {
    binary_path: String,
    device: String,
    pair: LanguagePair,
    packages_dir: PathBuf,
}

impl ArgosCliTranslator {
    pub fn new(handle: &TranslatorHandle, config: &TranslateConfig) -> Self {
        Self {
            binary_path: config.argos_binary.clone(),
            device: config.argos_device.clone(),
            pair: handle.pair.clone(),
            packages_dir: handle.packages_dir.clone(),
        }
    }

    /// Text is fed on stdin so lines starting with '-' are never read as flags
    pub fn build_args(&self) -> Vec<String> {
        vec![
            "--from-lang".to_string(),
            self.pair.from_code.clone(),
            "--to-lang".to_string(),
            self.pair.to_code.clone(),
        ]
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .args(self.build_args())
            .env("ARGOS_PACKAGES_DIR", &self.packages_dir)
            .env("ARGOS_DEVICE_TYPE", &self.device)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl PairTranslator for ArgosCliTranslator {
    async fn translate_text(&self, text: &str) -> Result<String> {
        let mut child = self.command().spawn().map_err(|e| {
            SubtransError::Translation(format!("Failed to execute {}: {}", self.binary_path, e))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubtransError::Translation(format!(
                "{} ({}) exited with {}: {}",
                self.binary_path,
                self.pair,
                output.status,
                stderr.trim()
            )));
        }

        let translated = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("argos {} {:?} -> {:?}", self.pair, text, translated);
        Ok(translated)
    }
}
