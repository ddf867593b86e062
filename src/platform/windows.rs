use crate::platform::PlatformOps;
use fs_err as fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub static WINDOWS_PLATFORM: Windows = Windows;

pub struct Windows;

impl PlatformOps for Windows {
    fn home_dir(&self) -> Option<PathBuf> { dirs::home_dir().or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from)) }
    fn final_binary_name(&self, base: &str) -> String { if base.ends_with(".exe") { base.to_string() } else { format!("{base}.exe") } }
    fn make_executable(&self, _path: &Path) -> io::Result<()> { Ok(()) }
    fn clear_quarantine(&self, _dir: &Path) {}
    fn replace_pointer(&self, pointer: &Path, tmp: &Path, version_rel: &Path) -> io::Result<()> {
        // Symlinks need elevated rights on Windows; `current` is a pointer file naming the version.
        let id = version_rel.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        fs::write(tmp, id)?;
        if let Err(e) = fs::rename(tmp, pointer) {
            let _ = fs::remove_file(tmp);
            return Err(e);
        }
        Ok(())
    }
    fn exec(&self, cmd: &mut Command) -> io::Error {
        match cmd.status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(e) => e,
        }
    }
}
