use crate::error::{UpdateError, UpdateResult};
use crate::store::VersionId;
use fs_err as fs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Raw `pending-update.json` as written by the updater.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RawManifest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "zipPath")]
    pub zip_path: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

/// A validated pending update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub version: VersionId,
    pub archive: PathBuf,
    pub sha256: Option<String>,
}

impl PendingUpdate {
    /// A relative `zipPath` is taken relative to the manifest's directory.
    pub fn load(path: &Path) -> UpdateResult<Self> {
        let data = fs::read_to_string(path)?;
        let mut update = Self::parse(&data)?;
        if update.archive.is_relative() {
            if let Some(dir) = path.parent() {
                update.archive = dir.join(&update.archive);
            }
        }
        Ok(update)
    }

    pub fn parse(data: &str) -> UpdateResult<Self> {
        let raw: RawManifest =
            serde_json::from_str(data).map_err(|e| UpdateError::ManifestInvalid(e.to_string()))?;
        let version = raw
            .version
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| UpdateError::ManifestInvalid("missing \"version\"".into()))?;
        let version = VersionId::parse(&version)
            .map_err(|e| UpdateError::ManifestInvalid(e.to_string()))?;
        let archive = raw
            .zip_path
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| UpdateError::ManifestInvalid("missing \"zipPath\"".into()))?;
        let sha256 = raw
            .sha256
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(Self {
            version,
            archive,
            sha256,
        })
    }
}
