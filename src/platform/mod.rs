pub fn platform() -> &'static dyn PlatformOps {
    &ConcretePlatform
}

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub trait PlatformOps: Sync + Send {
    fn home_dir(&self) -> Option<PathBuf>;
    fn final_binary_name(&self, base: &str) -> String;
    fn make_executable(&self, path: &Path) -> io::Result<()>;
    /// Best effort; platforms without an execution quarantine do nothing.
    fn clear_quarantine(&self, dir: &Path);
    /// Atomically replace `pointer` so that it names `version_rel` (relative to the pointer's directory).
    /// `tmp` is a scratch path in the same directory used to stage the new pointer.
    fn replace_pointer(&self, pointer: &Path, tmp: &Path, version_rel: &Path) -> io::Result<()>;
    /// Replace the current process with `cmd`. Only returns if that was impossible.
    fn exec(&self, cmd: &mut Command) -> io::Error;
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::UNIX_PLATFORM as ConcretePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WINDOWS_PLATFORM as ConcretePlatform;
