use crate::error::{UpdateError, UpdateResult};
use flate2::read::GzDecoder;
use fs_err as fs;
use sha2::{Digest, Sha256};
use std::io::{self, Read};
use std::path::{Component, Path};
use tar::Archive;
use zip::ZipArchive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

impl ArchiveKind {
    /// By extension first, then by magic bytes.
    pub fn detect(path: &Path) -> UpdateResult<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".zip") {
            return Ok(Self::Zip);
        }
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            return Ok(Self::TarGz);
        }
        let mut magic = [0u8; 4];
        let mut file = fs::File::open(path)?;
        let n = file.read(&mut magic)?;
        match &magic[..n] {
            [b'P', b'K', 3, 4] => Ok(Self::Zip),
            [0x1f, 0x8b, ..] => Ok(Self::TarGz),
            _ => Err(UpdateError::ExtractionFailure(format!(
                "unsupported archive type for {}",
                path.display()
            ))),
        }
    }
}

pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

pub fn verify_sha256(path: &Path, expected: &str) -> UpdateResult<()> {
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(UpdateError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Unpack `archive` into `dest`, which must already exist.
pub fn extract(archive: &Path, dest: &Path) -> UpdateResult<()> {
    match ArchiveKind::detect(archive)? {
        ArchiveKind::Zip => extract_zip(archive, dest),
        ArchiveKind::TarGz => extract_tar_gz(archive, dest),
    }
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> UpdateResult<()> {
    let file = fs::File::open(archive)?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    tar.unpack(dest)
        .map_err(|e| UpdateError::ExtractionFailure(format!("{}: {e}", archive.display())))
}

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

fn extract_zip(archive: &Path, dest: &Path) -> UpdateResult<()> {
    let file = fs::File::open(archive)?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| UpdateError::ExtractionFailure(format!("{}: {e}", archive.display())))?;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| UpdateError::ExtractionFailure(e.to_string()))?;
        let Some(rel) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(UpdateError::ExtractionFailure(format!(
                "entry '{}' escapes the destination",
                entry.name()
            )));
        };
        let out = dest.join(&rel);
        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mode = entry.unix_mode();
        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            let mut target = String::new();
            entry.read_to_string(&mut target)?;
            write_symlink(&rel, &target, &out)?;
            continue;
        }
        let mut f = fs::File::create(&out)?;
        io::copy(&mut entry, &mut f)?;
        drop(f);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(m) = mode {
                fs::set_permissions(&out, std::fs::Permissions::from_mode(m & 0o7777))?;
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_symlink(rel: &Path, target: &str, out: &Path) -> UpdateResult<()> {
    if !link_stays_within(rel, Path::new(target)) {
        return Err(UpdateError::ExtractionFailure(format!(
            "symlink '{}' -> '{target}' escapes the destination",
            rel.display()
        )));
    }
    let _ = fs::remove_file(out);
    std::os::unix::fs::symlink(target, out)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_symlink(rel: &Path, target: &str, _out: &Path) -> UpdateResult<()> {
    log::debug!("skipping symlink {} -> {target}", rel.display());
    Ok(())
}

/// Whether a link at `entry` (relative to the extraction root) pointing at `target` resolves inside the root.
fn link_stays_within(entry: &Path, target: &Path) -> bool {
    let mut depth: isize = entry.parent().map_or(0, |p| p.components().count() as isize);
    for c in target.components() {
        match c {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8], u32)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data, mode) in entries {
            zip.start_file(*name, FileOptions::default().unix_permissions(*mode))
                .unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn sha256_of_known_content() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("blob");
        std::fs::write(&p, b"hello world").unwrap();
        assert_eq!(
            sha256_file(&p).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn checksum_comparison_ignores_case() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("blob");
        std::fs::write(&p, b"hello world").unwrap();
        verify_sha256(&p, "B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9")
            .unwrap();
        match verify_sha256(&p, "00ff") {
            Err(UpdateError::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, "00ff");
                assert!(actual.starts_with("b94d27"));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn extracts_zip_with_nested_paths_and_modes() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("app.zip");
        write_zip(
            &archive,
            &[
                ("acme/bin/acme", b"#!/bin/sh\necho hi\n", 0o755),
                ("acme/README", b"docs", 0o644),
            ],
        );
        let dest = tmp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        extract(&archive, &dest).unwrap();
        assert_eq!(std::fs::read(dest.join("acme/README")).unwrap(), b"docs");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(dest.join("acme/bin/acme")).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0);
        }
    }

    #[test]
    fn zip_entry_escaping_destination_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("evil.zip");
        write_zip(&archive, &[("../evil.txt", b"x", 0o644)]);
        let dest = tmp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        assert!(matches!(extract(&archive, &dest), Err(UpdateError::ExtractionFailure(_))));
        assert!(!tmp.path().join("evil.txt").exists());
    }

    #[test]
    fn extracts_tar_gz() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("app.tar.gz");
        {
            let gz = flate2::write::GzEncoder::new(
                std::fs::File::create(&archive).unwrap(),
                flate2::Compression::default(),
            );
            let mut builder = tar::Builder::new(gz);
            let data = b"binary";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, "acme", &data[..]).unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }
        let dest = tmp.path().join("out");
        std::fs::create_dir_all(&dest).unwrap();
        extract(&archive, &dest).unwrap();
        assert_eq!(std::fs::read(dest.join("acme")).unwrap(), b"binary");
    }

    #[test]
    fn kind_is_sniffed_without_extension() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("download.bin");
        write_zip(&archive, &[("acme", b"x", 0o755)]);
        assert_eq!(ArchiveKind::detect(&archive).unwrap(), ArchiveKind::Zip);

        let junk = tmp.path().join("junk.bin");
        std::fs::write(&junk, b"nope").unwrap();
        assert!(matches!(ArchiveKind::detect(&junk), Err(UpdateError::ExtractionFailure(_))));
    }

    #[test]
    fn symlink_targets_must_stay_inside() {
        let entry = Path::new("Acme.app/Contents/Frameworks/Lib.framework/Lib");
        assert!(link_stays_within(entry, Path::new("Versions/Current/Lib")));
        assert!(link_stays_within(entry, Path::new("../../MacOS/acme")));
        assert!(!link_stays_within(entry, Path::new("../../../../../etc/passwd")));
        assert!(!link_stays_within(entry, Path::new("/etc/passwd")));
    }
}
