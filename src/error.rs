use std::path::PathBuf;
use thiserror::Error;

use crate::store::VersionId;

/// Fatal errors on the launch path. Every one of these ends the invocation with status 1.
#[derive(Error, Debug)]
pub enum ShimError {
    #[error(
        "no version selected: no --use-version flag, no {env_var} override and no current version in {}. \
         Reinstall to repair the installation.",
        .store.display()
    )]
    NoVersionResolved { env_var: &'static str, store: PathBuf },

    #[error("version '{version}' is not installed (available: {available})")]
    VersionNotInstalled { version: String, available: String },

    #[error("no runnable binary for version '{version}' in {}", .dir.display())]
    BinaryNotFound { version: String, dir: PathBuf },

    #[error("invalid version identifier '{0}'")]
    InvalidVersionId(String),

    #[error("--switch-version requires a version, e.g. --switch-version=1.2.0")]
    MissingSwitchTarget,

    #[error("failed to execute {}: {source}", .path.display())]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ShimError {
    pub fn not_installed(version: &str, available: &[VersionId]) -> Self {
        let available = if available.is_empty() {
            "none".to_string()
        } else {
            available
                .iter()
                .map(VersionId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        ShimError::VersionNotInstalled {
            version: version.to_string(),
            available,
        }
    }
}

/// Failures while applying a staged update. Never fatal: the applier logs them,
/// discards the staged files and the launch continues with the current version.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("invalid update manifest: {0}")]
    ManifestInvalid(String),

    #[error("staged archive {} does not exist", .0.display())]
    StagedArchiveMissing(PathBuf),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("extraction failed: {0}")]
    ExtractionFailure(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type UpdateResult<T> = Result<T, UpdateError>;
