use crate::platform::PlatformOps;
use fs_err as fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub static UNIX_PLATFORM: Unix = Unix;

pub struct Unix;

impl PlatformOps for Unix {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir().or_else(|| std::env::var_os("HOME").map(PathBuf::from))
    }
    fn final_binary_name(&self, base: &str) -> String {
        base.to_string()
    }
    fn make_executable(&self, path: &Path) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode((perms.mode() & 0o7777) | 0o755);
        fs::set_permissions(path, perms)?;
        Ok(())
    }
    fn clear_quarantine(&self, dir: &Path) {
        if !cfg!(target_os = "macos") {
            return;
        }
        match Command::new("xattr")
            .args(["-dr", "com.apple.quarantine"])
            .arg(dir)
            .output()
        {
            Ok(out) if !out.status.success() => {
                log::debug!("xattr exited with {} for {}", out.status, dir.display())
            }
            Ok(_) => {}
            Err(e) => log::debug!("xattr unavailable: {e}"),
        }
    }
    fn replace_pointer(&self, pointer: &Path, tmp: &Path, version_rel: &Path) -> io::Result<()> {
        let _ = fs::remove_file(tmp);
        std::os::unix::fs::symlink(version_rel, tmp)?;
        // rename(2) swaps the link in one step; readers see the old or the new target
        if let Err(e) = fs::rename(tmp, pointer) {
            let _ = fs::remove_file(tmp);
            return Err(e);
        }
        Ok(())
    }
    fn exec(&self, cmd: &mut Command) -> io::Error {
        use std::os::unix::process::CommandExt;
        cmd.exec()
    }
}
