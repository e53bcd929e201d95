use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Result, SubtransError};
use crate::language::LanguagePair;
use super::{ModelCatalog, ModelPackage};

/// One entry of the Argos package index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgosIndexEntry {
    pub from_code: String,
    pub to_code: String,
    #[serde(default)]
    pub package_version: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, rename = "type")]
    pub package_type: Option<String>,
}

impl ArgosIndexEntry {
    /// Translation packages with at least one link; codes are taken verbatim
    pub fn into_package(self) -> Option<ModelPackage> {
        let is_translation = self.package_type.as_deref().is_none_or(|kind| kind == "translate");
        if !is_translation || self.links.is_empty() {
            return None;
        }

        Some(ModelPackage {
            pair: LanguagePair {
                from_code: self.from_code.trim().to_ascii_lowercase(),
                to_code: self.to_code.trim().to_ascii_lowercase(),
            },
            links: self.links,
            package_version: self.package_version,
        })
    }
}

/// Catalog backed by the Argos Translate package index
pub struct ArgosIndexCatalog {
    client: Client,
    index_url: String,
    show_progress: bool,
}

impl ArgosIndexCatalog {
    pub fn new(index_url: impl Into<String>, show_progress: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("subtrans/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            index_url: index_url.into(),
            show_progress,
        })
    }

    fn progress_bar(&self, length: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(length.unwrap_or(0));
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        pb.set_style(style);
        pb
    }

    /// Stream one link into `dest`
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let pb = self.progress_bar(response.content_length());
        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }
        file.flush().await?;
        pb.finish_and_clear();

        Ok(())
    }
}

/// File name of a package archive, taken from its link when possible
pub fn archive_file_name(package: &ModelPackage, link: &str) -> String {
    link.rsplit('/')
        .next()
        .map(|name| name.split(['?', '#']).next().unwrap_or(name))
        .filter(|name| name.ends_with(".argosmodel"))
        .map(str::to_string)
        .unwrap_or_else(|| format!("translate-{}_{}.argosmodel", package.pair.from_code, package.pair.to_code))
}

#[async_trait]
impl ModelCatalog for ArgosIndexCatalog {
    async fn available_packages(&self) -> Result<Vec<ModelPackage>> {
        debug!("Fetching package index from {}", self.index_url);

        let entries: Vec<ArgosIndexEntry> = self
            .client
            .get(&self.index_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let packages: Vec<ModelPackage> = entries.into_iter().filter_map(ArgosIndexEntry::into_package).collect();
        debug!("Package index lists {} translation packages", packages.len());
        Ok(packages)
    }

    async fn download(&self, package: &ModelPackage, dest_dir: &Path) -> Result<PathBuf> {
        let mut failures = Vec::new();

        for link in &package.links {
            let dest = dest_dir.join(archive_file_name(package, link));
            info!("Downloading {} package from {}", package.pair, link);

            match self.fetch(link, &dest).await {
                Ok(()) => return Ok(dest),
                Err(e) => {
                    warn!("Download from {} failed: {}", link, e);
                    failures.push(format!("{}: {}", link, e));
                }
            }
        }

        Err(SubtransError::Io(std::io::Error::other(format!(
            "no working download link for {}: [{}]",
            package.pair,
            failures.join("; ")
        ))))
    }
}
