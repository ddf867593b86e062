//! On-disk store: installed versions, the current-version pointer and the pending-update area.
//!
//! ```text
//! <store>/versions/<versionId>/...
//! <store>/current                      -> versions/<versionId>
//! <store>/updates/pending-update.json
//! ```

use crate::error::ShimError;
use crate::platform::PlatformOps;
use fs_err as fs;
use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub const VERSIONS_DIR: &str = "versions";
pub const CURRENT_POINTER: &str = "current";
pub const UPDATES_DIR: &str = "updates";
pub const PENDING_MANIFEST: &str = "pending-update.json";
pub const APPLY_LOCK: &str = ".apply.lock";
pub const CONFIG_FILE: &str = "shim.toml";

/// Opaque version identifier, safe to use as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionId(String);

impl VersionId {
    pub fn parse(raw: &str) -> Result<Self, ShimError> {
        let id = raw.trim();
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\'])
            && !id.chars().any(char::is_control);
        if valid {
            Ok(Self(id.to_string()))
        } else {
            Err(ShimError::InvalidVersionId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Semver-aware ordering; ids that are not semver fall back to string order.
    pub fn cmp_versions(&self, other: &Self) -> Ordering {
        let parse = |s: &str| semver::Version::parse(s.trim_start_matches('v')).ok();
        match (parse(&self.0), parse(&other.0)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join(VERSIONS_DIR)
    }

    pub fn version_dir(&self, id: &VersionId) -> PathBuf {
        self.versions_dir().join(id.as_str())
    }

    pub fn updates_dir(&self) -> PathBuf {
        self.root.join(UPDATES_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.updates_dir().join(PENDING_MANIFEST)
    }

    pub fn apply_lock_path(&self) -> PathBuf {
        self.updates_dir().join(APPLY_LOCK)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn is_installed(&self, id: &VersionId) -> bool {
        self.version_dir(id).is_dir()
    }

    /// Installed versions in ascending order. Staging leftovers (dot-prefixed) are skipped.
    pub fn list_versions(&self) -> io::Result<Vec<VersionId>> {
        let dir = self.versions_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(|n| VersionId::parse(n).ok()) {
                out.push(id);
            }
        }
        out.sort_by(VersionId::cmp_versions);
        Ok(out)
    }

    pub fn current<'a>(&'a self, platform: &'a dyn PlatformOps) -> CurrentPointer<'a> {
        CurrentPointer {
            store: self,
            platform,
        }
    }
}

/// The store's reference to the version that runs when nothing overrides it.
pub struct CurrentPointer<'a> {
    store: &'a Store,
    platform: &'a dyn PlatformOps,
}

impl CurrentPointer<'_> {
    fn path(&self) -> PathBuf {
        self.store.root.join(CURRENT_POINTER)
    }

    pub fn read(&self) -> io::Result<Option<VersionId>> {
        let path = self.path();
        let meta = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let name = if meta.file_type().is_symlink() {
            let target = fs::read_link(&path)?;
            target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        } else if meta.is_file() {
            Some(fs::read_to_string(&path)?.trim().to_string())
        } else {
            // directory-equivalent pointer (e.g. a junction)
            let resolved = fs::canonicalize(&path)?;
            let versions = fs::canonicalize(self.store.versions_dir()).ok();
            match versions {
                Some(v) if resolved.parent() == Some(v.as_path()) => resolved
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()),
                _ => None,
            }
        };
        Ok(name.and_then(|n| VersionId::parse(&n).ok()))
    }

    /// Repoint to `id` in a single rename. The previous pointer is untouched on failure.
    ///
    /// A real directory at `current` cannot be renamed over, so it is reported instead of replaced.
    pub fn write(&self, id: &VersionId) -> io::Result<()> {
        let path = self.path();
        if fs::symlink_metadata(&path).is_ok_and(|m| m.is_dir()) {
            log::warn!("refusing to replace directory {}", path.display());
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "{} is a directory, not a version pointer; remove it and switch again",
                    path.display()
                ),
            ));
        }
        let tmp = self
            .store
            .root
            .join(format!(".{CURRENT_POINTER}.tmp-{}", std::process::id()));
        let rel = Path::new(VERSIONS_DIR).join(id.as_str());
        self.platform.replace_pointer(&path, &tmp, &rel)
    }
}
