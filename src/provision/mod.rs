// Language-pair model provisioning
//
// `ModelProvisioner::ensure` guarantees a pair-model package is installed
// before a pair-model translator is built:
// - Catalog: remote list of downloadable packages
// - Registry: local installed-package store with atomic publish

pub mod catalog;
pub mod registry;

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

pub use catalog::ArgosIndexCatalog;
pub use registry::LocalRegistry;
use crate::config::ProvisionConfig;
use crate::error::{ProvisioningError, Result, SubtransError};
use crate::language::LanguagePair;

/// A downloadable language-pair package listed in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPackage {
    pub pair: LanguagePair,
    /// Mirrors the package archive can be fetched from, in preference order
    pub links: Vec<String>,
    pub package_version: String,
}

/// Reference to an installed pair model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorHandle {
    pub pair: LanguagePair,
    /// Directory holding the installed package
    pub install_path: PathBuf,
    /// Registry directory the translation engine loads packages from
    pub packages_dir: PathBuf,
}

/// Remote list of packages that can be installed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn available_packages(&self) -> Result<Vec<ModelPackage>>;

    /// Fetch the package archive into `dest_dir`, returning the file path
    async fn download(&self, package: &ModelPackage, dest_dir: &Path) -> Result<PathBuf>;
}

/// Locally installed packages
#[cfg_attr(test, mockall::automock)]
pub trait PackageRegistry: Send + Sync {
    fn find(&self, pair: &LanguagePair) -> Result<Option<TranslatorHandle>>;

    fn installed_pairs(&self) -> Result<Vec<LanguagePair>>;

    /// Install a downloaded archive; either the whole package appears or nothing does
    fn install(&self, archive: &Path, package: &ModelPackage) -> Result<()>;
}

pub struct ModelProvisioner {
    catalog: Box<dyn ModelCatalog>,
    registry: Box<dyn PackageRegistry>,
}

impl ModelProvisioner {
    pub fn new(catalog: Box<dyn ModelCatalog>, registry: Box<dyn PackageRegistry>) -> Self {
        Self { catalog, registry }
    }

    /// Argos package index and the on-disk registry under the configured data dir
    pub fn from_config(config: &ProvisionConfig, show_progress: bool) -> Result<Self> {
        let catalog = ArgosIndexCatalog::new(config.index_url.clone(), show_progress)?;
        let registry = LocalRegistry::new(config.resolve_data_dir()?);
        Ok(Self::new(Box::new(catalog), Box::new(registry)))
    }

    /// Return a handle for `pair`, downloading and installing it first if needed.
    ///
    /// Already-installed pairs are answered from the registry without touching
    /// the catalog.
    pub async fn ensure(&self, pair: &LanguagePair) -> Result<TranslatorHandle> {
        if let Some(handle) = self.registry.find(pair)? {
            info!("Translation package {} already installed at {}", pair, handle.install_path.display());
            return Ok(handle);
        }

        info!("Translation package {} not installed; downloading...", pair);
        let install_failed = |e: SubtransError| ProvisioningError::InstallFailed {
            pair: pair.clone(),
            cause: e.to_string(),
        };

        let packages = self.catalog.available_packages().await.map_err(install_failed)?;
        let package = packages
            .into_iter()
            .find(|package| package.pair == *pair)
            .ok_or_else(|| ProvisioningError::PairNotFound(pair.clone()))?;

        let download_dir = tempfile::tempdir().map_err(|e| install_failed(e.into()))?;
        let archive = self
            .catalog
            .download(&package, download_dir.path())
            .await
            .map_err(install_failed)?;
        self.registry.install(&archive, &package).map_err(install_failed)?;
        info!("Installed translation package {} (version {})", pair, package.package_version);

        match self.registry.find(pair)? {
            Some(handle) => Ok(handle),
            None => Err(ProvisioningError::StillUnavailable(pair.clone()).into()),
        }
    }

    pub fn installed_pairs(&self) -> Result<Vec<LanguagePair>> {
        self.registry.installed_pairs()
    }

    /// Pairs offered by the catalog
    pub async fn available_pairs(&self) -> Result<BTreeSet<LanguagePair>> {
        let packages = self.catalog.available_packages().await?;
        Ok(packages.into_iter().map(|package| package.pair).collect())
    }
}
