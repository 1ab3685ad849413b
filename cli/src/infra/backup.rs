//! Registry backup — gzip'd tarball plus a sibling SHA-256 checksum file.

use std::fs::File;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Archive written by [`create_archive`].
#[derive(Debug, Serialize)]
pub struct BackupArchive {
    pub archive: PathBuf,
    pub checksum: PathBuf,
    pub sha256: String,
    pub files: usize,
}

/// File name for an archive taken at `at`.
#[must_use]
pub fn archive_name(at: DateTime<Utc>) -> String {
    format!("appfleet-registry-{}.tar.gz", at.format("%Y%m%dT%H%M%SZ"))
}

/// Archive `files` (paths relative to `registry_dir` inside the tarball)
/// into `backup_dir`. Both the archive and the checksum are mode 0600.
///
/// # Errors
///
/// Returns an error if any file cannot be read or the archive cannot be
/// written.
pub fn create_archive(
    registry_dir: &Path,
    files: &[PathBuf],
    backup_dir: &Path,
    at: DateTime<Utc>,
) -> Result<BackupArchive> {
    std::fs::create_dir_all(backup_dir)
        .with_context(|| format!("creating directory {}", backup_dir.display()))?;
    let archive = backup_dir.join(archive_name(at));

    let file = private_file(&archive)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for path in files {
        let name = path.strip_prefix(registry_dir).unwrap_or(path);
        builder
            .append_path_with_name(path, name)
            .with_context(|| format!("adding {} to archive", path.display()))?;
    }
    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .with_context(|| format!("finishing {}", archive.display()))?;

    let sha256 = sha256_file(&archive)?;
    let checksum = archive.with_extension("gz.sha256");
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut sum = private_file(&checksum)?;
    writeln!(sum, "{sha256}  {file_name}")
        .with_context(|| format!("writing {}", checksum.display()))?;

    tracing::info!(archive = %archive.display(), files = files.len(), "registry backup written");
    Ok(BackupArchive {
        archive,
        checksum,
        sha256,
        files: files.len(),
    })
}

/// Manual restore procedure printed by `appfleet backup restore`.
#[must_use]
pub fn restore_instructions(registry_dir: &Path, backup_dir: &Path) -> String {
    let registry = registry_dir.display();
    let backups = backup_dir.display();
    format!(
        "1. Pick an archive:       ls {backups}/appfleet-registry-*.tar.gz\n\
         2. Verify it:             (cd {backups} && sha256sum -c <archive>.sha256)\n\
         3. Move the current copy: mv {registry} {registry}.before-restore\n\
         4. Unpack:                mkdir -p {registry} && tar -xzf <archive> -C {registry}\n\
         5. Lock it down:          chmod 700 {registry} && chmod 600 {registry}/fleet.json {registry}/apps/*.json\n\
         6. Re-apply host state:   appfleet firewall rebuild, then appfleet setup <name> per application"
    )
}

fn private_file(path: &Path) -> Result<File> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
        .open(path)
        .with_context(|| format!("creating {}", path.display()))
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}
