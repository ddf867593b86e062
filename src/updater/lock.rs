use fs4::fs_std::FileExt;
use fs_err as fs;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Advisory exclusive lock around applying a staged update.
/// Released when dropped or when the holding process exits.
pub struct ApplyLock {
    file: File,
    path: PathBuf,
}

impl ApplyLock {
    /// `Ok(None)` when another invocation already holds the lock.
    pub fn try_acquire(path: &Path) -> io::Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        if !FileExt::try_lock_exclusive(&file)? {
            return Ok(None);
        }
        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
        }))
    }
}

impl Drop for ApplyLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::debug!("failed to unlock {}: {e}", self.path.display());
        }
    }
}
