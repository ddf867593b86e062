#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use sha2::{Digest, Sha256};
use tempfile::TempDir;

pub const PRODUCT: &str = "acme";

/// A scratch store plus a configured launcher command.
pub struct TestStore {
    pub dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("store").join("versions")).unwrap();
        TestStore { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root().join("versions").join(version)
    }

    /// Install `version` with a flat-layout fake application.
    pub fn install(&self, version: &str, exit_code: i32) -> PathBuf {
        let bin = self.version_dir(version).join(PRODUCT);
        write_fake_app(&bin, version, exit_code);
        bin
    }

    pub fn install_empty(&self, version: &str) {
        std::fs::create_dir_all(self.version_dir(version)).unwrap();
    }

    pub fn set_current(&self, version: &str) {
        let link = self.root().join("current");
        let _ = std::fs::remove_file(&link);
        #[cfg(unix)]
        std::os::unix::fs::symlink(Path::new("versions").join(version), &link).unwrap();
        #[cfg(not(unix))]
        std::fs::write(&link, version).unwrap();
    }

    pub fn current(&self) -> Option<String> {
        let link = self.root().join("current");
        let meta = std::fs::symlink_metadata(&link).ok()?;
        if meta.file_type().is_symlink() {
            let target = std::fs::read_link(&link).ok()?;
            return Some(target.file_name()?.to_string_lossy().into_owned());
        }
        Some(std::fs::read_to_string(&link).ok()?.trim().to_string())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root().join("updates").join("pending-update.json")
    }

    /// Stage a zip holding a nested-layout fake application for `version`.
    /// Returns the archive path; the manifest carries `sha256` when given.
    pub fn stage_update(&self, version: &str, exit_code: i32, sha256: Option<&str>) -> PathBuf {
        let archive = self.dir.path().join(format!("{PRODUCT}-{version}.zip"));
        let file = std::fs::File::create(&archive).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(
            format!("{PRODUCT}/bin/{PRODUCT}"),
            zip::write::FileOptions::default().unix_permissions(0o644),
        )
        .unwrap();
        zip.write_all(fake_app_script(version, exit_code).as_bytes())
            .unwrap();
        zip.finish().unwrap();

        let sha = match sha256 {
            Some(s) => s.to_string(),
            None => sha256_hex(&archive),
        };
        let manifest = serde_json::json!({
            "version": version,
            "zipPath": archive.to_string_lossy(),
            "sha256": sha,
        });
        std::fs::create_dir_all(self.root().join("updates")).unwrap();
        std::fs::write(self.manifest_path(), manifest.to_string()).unwrap();
        archive
    }

    /// Launcher command isolated from the caller's environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = assert_cmd::cargo_bin_cmd!("vshim");
        cmd.env("VSHIM_HOME", self.root())
            .env("VSHIM_PRODUCT", PRODUCT)
            .env_remove("VSHIM_VERSION")
            .env_remove("VSHIM_RUNNER_CWD")
            .env_remove("VSHIM_LOG");
        cmd
    }

    /// Every path under the store, sorted, for before/after comparisons.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        walk(&self.root(), &mut out);
        out.sort();
        out
    }
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        out.push(path.clone());
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            walk(&path, out);
        }
    }
}

pub fn sha256_hex(path: &Path) -> String {
    let data = std::fs::read(path).unwrap();
    hex::encode(Sha256::digest(&data))
}

/// Shell script that reports what it was started with, then exits with `exit_code`.
pub fn fake_app_script(version: &str, exit_code: i32) -> String {
    format!(
        "#!/bin/sh\n\
         echo \"version={version}\"\n\
         for a in \"$@\"; do echo \"arg=$a\"; done\n\
         echo \"runner_cwd=$VSHIM_RUNNER_CWD\"\n\
         echo \"home=$VSHIM_HOME\"\n\
         exit {exit_code}\n"
    )
}

fn write_fake_app(path: &Path, version: &str, exit_code: i32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, fake_app_script(version, exit_code)).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
