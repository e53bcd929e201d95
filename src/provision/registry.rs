use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, SubtransError};
use crate::language::LanguagePair;
use super::{ModelPackage, PackageRegistry, TranslatorHandle};

const METADATA_FILE: &str = "metadata.json";

/// The part of a package's `metadata.json` the registry relies on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub from_code: String,
    pub to_code: String,
    #[serde(default)]
    pub package_version: Option<String>,
}

/// On-disk registry laid out the way Argos Translate expects:
/// `<root>/packages/<name>/metadata.json`.
///
/// Packages are unpacked under `<root>/staging` and moved into `packages`
/// with a single rename, so a reader never sees a partly extracted package.
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    fn read_metadata(package_dir: &Path) -> Option<PackageMetadata> {
        let path = package_dir.join(METADATA_FILE);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("Ignoring package with unreadable {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Installed package directories with their metadata
    fn installed(&self) -> Result<Vec<(PathBuf, PackageMetadata)>> {
        let packages_dir = self.packages_dir();
        if !packages_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&packages_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| SubtransError::Io(e.into()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(metadata) = Self::read_metadata(entry.path()) {
                found.push((entry.into_path(), metadata));
            }
        }
        Ok(found)
    }

    /// Locate the unpacked package root: the staging dir itself or one level below
    fn locate_package_root(unpacked: &Path) -> Result<PathBuf> {
        WalkDir::new(unpacked)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .find(|entry| entry.file_type().is_file() && entry.file_name() == METADATA_FILE)
            .and_then(|entry| entry.path().parent().map(Path::to_path_buf))
            .ok_or_else(|| SubtransError::Io(std::io::Error::other(format!("archive has no {}", METADATA_FILE))))
    }

    fn unpack(archive: &Path, dest: &Path) -> Result<()> {
        let file = fs::File::open(archive)?;
        let mut zip = zip::ZipArchive::new(file)
            .map_err(|e| SubtransError::Io(std::io::Error::other(format!("{}: {}", archive.display(), e))))?;
        zip.extract(dest)
            .map_err(|e| SubtransError::Io(std::io::Error::other(format!("{}: {}", archive.display(), e))))?;
        Ok(())
    }
}

impl PackageRegistry for LocalRegistry {
    fn find(&self, pair: &LanguagePair) -> Result<Option<TranslatorHandle>> {
        let handle = self
            .installed()?
            .into_iter()
            .find(|(_, metadata)| pair.matches(&metadata.from_code, &metadata.to_code))
            .map(|(install_path, _)| TranslatorHandle {
                pair: pair.clone(),
                install_path,
                packages_dir: self.packages_dir(),
            });
        Ok(handle)
    }

    fn installed_pairs(&self) -> Result<Vec<LanguagePair>> {
        let mut pairs: Vec<LanguagePair> = self
            .installed()?
            .into_iter()
            .map(|(_, metadata)| LanguagePair {
                from_code: metadata.from_code,
                to_code: metadata.to_code,
            })
            .collect();
        pairs.sort();
        pairs.dedup();
        Ok(pairs)
    }

    fn install(&self, archive: &Path, package: &ModelPackage) -> Result<()> {
        let pair = &package.pair;
        let staging_root = self.staging_dir();
        let packages_dir = self.packages_dir();
        fs::create_dir_all(&staging_root)?;
        fs::create_dir_all(&packages_dir)?;

        // Private per-install directory, removed on every exit path
        let staging = tempfile::Builder::new()
            .prefix("install-")
            .tempdir_in(&staging_root)?;
        debug!("Unpacking {} into {}", archive.display(), staging.path().display());
        Self::unpack(archive, staging.path())?;

        let unpacked = Self::locate_package_root(staging.path())?;
        let metadata = Self::read_metadata(&unpacked)
            .ok_or_else(|| SubtransError::Io(std::io::Error::other("package metadata is unreadable")))?;
        if !pair.matches(&metadata.from_code, &metadata.to_code) {
            return Err(SubtransError::Io(std::io::Error::other(format!(
                "archive contains {}→{}, expected {}",
                metadata.from_code, metadata.to_code, pair
            ))));
        }

        let target = packages_dir.join(format!("{}_{}", pair.from_code, pair.to_code));
        let publish_from = if unpacked == staging.path() {
            // Package files sit at the archive root; move them one level down first
            let nested = staging.path().join("package");
            fs::create_dir(&nested)?;
            for entry in fs::read_dir(staging.path())? {
                let entry = entry?;
                if entry.path() != nested {
                    fs::rename(entry.path(), nested.join(entry.file_name()))?;
                }
            }
            nested
        } else {
            unpacked
        };

        match fs::rename(&publish_from, &target) {
            Ok(()) => {
                info!("Published package {} at {}", pair, target.display());
                Ok(())
            }
            Err(e) => match Self::read_metadata(&target) {
                Some(existing) if pair.matches(&existing.from_code, &existing.to_code) => {
                    info!("Package {} was installed concurrently, discarding staged copy", pair);
                    Ok(())
                }
                _ => Err(SubtransError::Io(std::io::Error::other(format!(
                    "cannot publish package into {}: {}",
                    target.display(),
                    e
                )))),
            },
        }
    }
}
