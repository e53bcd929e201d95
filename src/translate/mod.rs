// Modular translation architecture
//
// One `TranslationBackend` is built per run through the factory:
// - Pair: a dedicated model per language pair, provisioned on demand
// - Batch: one multilingual model fed fixed-size batches

pub mod argos;
pub mod batch;
pub mod easynmt;
pub mod pair;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

pub use argos::ArgosCliTranslator;
pub use batch::{BatchMultilingualBackend, MultilingualModel};
pub use easynmt::EasyNmtClient;
pub use pair::{PairModelBackend, PairTranslator};
use crate::config::{Config, TranslateConfig};
use crate::error::{Result, SubtransError};
use crate::language::LanguagePair;
use crate::provision::ModelProvisioner;
use crate::subtitle::SubtitleDocument;

/// Translates subtitle text; index and timing of every entry are left untouched
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate(&self, document: SubtitleDocument, from_code: &str, to_code: &str) -> Result<SubtitleDocument>;
}

/// Translation engine family, chosen once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Argos Translate: one installed package per language pair
    #[serde(rename = "argos", alias = "pair")]
    PairModel,
    /// Opus-MT through EasyNMT: one model for many pairs, batched
    #[serde(rename = "opus", alias = "batch")]
    BatchMultilingual,
}

impl FromStr for BackendKind {
    type Err = SubtransError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "argos" | "pair" => Ok(Self::PairModel),
            "opus" | "batch" => Ok(Self::BatchMultilingual),
            _ => Err(SubtransError::Input(format!(
                "Invalid translation backend '{}'. Valid backends: argos, opus",
                s
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PairModel => write!(f, "argos"),
            Self::BatchMultilingual => write!(f, "opus"),
        }
    }
}

/// Builds the run's backend once the language pair is known
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn create_backend(&self, pair: &LanguagePair) -> Result<Box<dyn TranslationBackend>>;
}

/// Factory for the two real backends
pub struct TranslatorFactory {
    config: TranslateConfig,
    /// Only the pair-model backend provisions packages
    provisioner: Option<ModelProvisioner>,
}

impl TranslatorFactory {
    pub fn new(config: TranslateConfig, provisioner: ModelProvisioner) -> Self {
        Self {
            config,
            provisioner: Some(provisioner),
        }
    }

    /// Validate the translation settings and set up what the selected backend needs
    pub fn from_config(config: &Config) -> Result<Self> {
        config.translate.validate()?;

        let provisioner = match config.translate.backend {
            BackendKind::PairModel => Some(ModelProvisioner::from_config(
                &config.provision,
                config.translate.show_progress,
            )?),
            BackendKind::BatchMultilingual => None,
        };

        Ok(Self {
            config: config.translate.clone(),
            provisioner,
        })
    }
}

#[async_trait]
impl BackendFactory for TranslatorFactory {
    async fn create_backend(&self, pair: &LanguagePair) -> Result<Box<dyn TranslationBackend>> {
        match self.config.backend {
            BackendKind::PairModel => {
                info!("Preparing Argos translator {} ...", pair);
                let provisioner = self.provisioner.as_ref().ok_or_else(|| {
                    SubtransError::Config("Argos backend selected without a package registry".to_string())
                })?;
                let handle = provisioner.ensure(pair).await?;
                let engine = ArgosCliTranslator::new(&handle, &self.config);
                Ok(Box::new(
                    PairModelBackend::new(handle, Box::new(engine)).with_progress(self.config.show_progress),
                ))
            }
            BackendKind::BatchMultilingual => {
                info!("Preparing Opus-MT translator {} ...", pair);
                let model = EasyNmtClient::new(&self.config)?;
                Ok(Box::new(
                    BatchMultilingualBackend::new(Box::new(model), self.config.batch_size)?
                        .with_progress(self.config.show_progress),
                ))
            }
        }
    }
}

/// Console progress bar, hidden when disabled
pub(crate) fn progress_bar(length: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(length as u64);
    let style = ProgressStyle::with_template("Translating [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("argos".parse::<BackendKind>().unwrap(), BackendKind::PairModel);
        assert_eq!(" Opus ".parse::<BackendKind>().unwrap(), BackendKind::BatchMultilingual);
        assert_eq!("batch".parse::<BackendKind>().unwrap(), BackendKind::BatchMultilingual);
        assert!(matches!("marian".parse::<BackendKind>(), Err(SubtransError::Input(_))));
    }

    #[test]
    fn test_batch_factory_skips_provisioning() {
        let mut config = Config::default();
        config.translate.backend = BackendKind::BatchMultilingual;

        let factory = TranslatorFactory::from_config(&config).unwrap();
        assert!(factory.provisioner.is_none());
    }

    #[test]
    fn test_pair_factory_provisions() {
        let mut config = Config::default();
        config.provision.data_dir = Some(std::path::PathBuf::from("/srv/argos"));

        let factory = TranslatorFactory::from_config(&config).unwrap();
        assert!(factory.provisioner.is_some());
    }

    #[test]
    fn test_zero_batch_size_rejected_up_front() {
        let mut config = Config::default();
        config.translate.backend = BackendKind::BatchMultilingual;
        config.translate.batch_size = 0;

        assert!(matches!(TranslatorFactory::from_config(&config), Err(SubtransError::Input(_))));
    }

    #[test]
    fn test_backend_kind_round_trips_through_display() {
        for kind in [BackendKind::PairModel, BackendKind::BatchMultilingual] {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }
}
