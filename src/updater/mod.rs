//! Applies an update staged by the background updater before the launcher resolves a version.
//!
//! Nothing in here is fatal to the launch. A broken manifest or archive is logged and thrown
//! away, so the same bad update is never retried, and the previously current version runs.

pub mod archive;
pub mod lock;
pub mod manifest;

use crate::error::{UpdateError, UpdateResult};
use crate::locator::BinaryLocator;
use crate::platform::PlatformOps;
use crate::store::{Store, VersionId};
use fs_err as fs;
use std::path::Path;

use self::lock::ApplyLock;
use self::manifest::PendingUpdate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(VersionId),
    NoOp,
}

pub struct UpdateApplier<'a> {
    store: &'a Store,
    locator: &'a BinaryLocator<'a>,
    platform: &'a dyn PlatformOps,
}

impl<'a> UpdateApplier<'a> {
    pub fn new(store: &'a Store, locator: &'a BinaryLocator<'a>, platform: &'a dyn PlatformOps) -> Self {
        Self {
            store,
            locator,
            platform,
        }
    }

    pub fn apply(&self) -> ApplyOutcome {
        let manifest_path = self.store.manifest_path();
        if !manifest_path.exists() {
            return ApplyOutcome::NoOp;
        }
        let _guard = match ApplyLock::try_acquire(&self.store.apply_lock_path()) {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                log::info!("another launcher is applying the staged update; skipping");
                return ApplyOutcome::NoOp;
            }
            Err(e) => {
                log::warn!("cannot lock update area, skipping staged update: {e}");
                return ApplyOutcome::NoOp;
            }
        };
        // the previous holder may have consumed it
        if !manifest_path.exists() {
            return ApplyOutcome::NoOp;
        }

        let update = match PendingUpdate::load(&manifest_path) {
            Ok(update) => update,
            Err(e) => {
                log::warn!("discarding staged update: {e}");
                discard(&manifest_path);
                return ApplyOutcome::NoOp;
            }
        };

        let outcome = match self.install(&update) {
            Ok(()) => {
                log::info!("applied update to version {}", update.version);
                ApplyOutcome::Applied(update.version.clone())
            }
            Err(e) => {
                log::warn!("discarding staged update {}: {e}", update.version);
                ApplyOutcome::NoOp
            }
        };
        discard(&update.archive);
        discard(&manifest_path);
        outcome
    }

    fn install(&self, update: &PendingUpdate) -> UpdateResult<()> {
        if !update.archive.is_file() {
            return Err(UpdateError::StagedArchiveMissing(update.archive.clone()));
        }
        if let Some(expected) = &update.sha256 {
            archive::verify_sha256(&update.archive, expected)?;
        }

        let target = self.store.version_dir(&update.version);
        if target.exists() {
            self.adopt_installed(update, &target)?;
        } else {
            self.unpack_into(update, &target)?;
        }
        self.store.current(self.platform).write(&update.version)?;
        Ok(())
    }

    /// An installed version directory is never rewritten. It is only repointed to when it can launch.
    fn adopt_installed(&self, update: &PendingUpdate, target: &Path) -> UpdateResult<()> {
        match self.locator.locate(target) {
            Some(binary) => {
                log::info!(
                    "version {} is already installed; keeping {}",
                    update.version,
                    binary.path.display()
                );
                Ok(())
            }
            None => Err(UpdateError::ExtractionFailure(format!(
                "{} already exists without a launchable binary",
                target.display()
            ))),
        }
    }

    fn unpack_into(&self, update: &PendingUpdate, target: &Path) -> UpdateResult<()> {
        let versions = self.store.versions_dir();
        fs::create_dir_all(&versions)?;
        let staging = versions.join(format!(".staging-{}-{}", update.version, std::process::id()));
        remove_dir_if_exists(&staging)?;
        fs::create_dir_all(&staging)?;

        let staged = self
            .stage(update, &staging)
            .and_then(|()| fs::rename(&staging, target).map_err(UpdateError::from));
        if staged.is_err() {
            let _ = fs::remove_dir_all(&staging);
        }
        staged
    }

    /// Extract into `staging` and prepare the executable. Leaves `versions/<id>` untouched.
    fn stage(&self, update: &PendingUpdate, staging: &Path) -> UpdateResult<()> {
        archive::extract(&update.archive, staging)?;
        let Some(binary) = self.locator.locate(staging) else {
            return Err(UpdateError::ExtractionFailure(format!(
                "{} contains no launchable binary",
                update.archive.display()
            )));
        };
        log::debug!("staged {:?} binary at {}", binary.layout, binary.path.display());
        self.platform.make_executable(&binary.path)?;
        self.platform.clear_quarantine(staging);
        Ok(())
    }
}

fn remove_dir_if_exists(path: &Path) -> std::io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove {}: {e}", path.display()),
    }
}
