//! On-disk Argos packages: checksum verification, extraction of downloaded
//! `.argosmodel` archives and discovery of packages that are already
//! installed.
//!
//! Layout of the models directory:
//! ```text
//! models/
//! ├── .downloads/                         in-progress archives (*.partial)
//! ├── translate-en_es-1_0/metadata.json   installed packages
//! └── translate-es_en-1_9/metadata.json
//! ```

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use translate_bot_model_cache::{BackendError, LanguagePair};
use zip::ZipArchive;

pub const METADATA_FILE: &str = "metadata.json";
/// In-progress archives and half-extracted packages
pub const DOWNLOADS_DIR: &str = ".downloads";

/// The fields of an installed package's `metadata.json` we care about
#[derive(Debug, Deserialize)]
struct PackageMetadata {
    from_code: String,
    to_code: String,
    #[serde(default = "default_package_type")]
    package_type: String,
}

fn default_package_type() -> String {
    "translate".to_string()
}

/// Read the language pair from an installed package directory.
pub fn read_package_pair(package_dir: &Path) -> Result<LanguagePair, BackendError> {
    let contents = std::fs::read_to_string(package_dir.join(METADATA_FILE))?;
    let metadata: PackageMetadata = serde_json::from_str(&contents).map_err(|e| {
        BackendError::Verification(format!(
            "invalid {} in {:?}: {}",
            METADATA_FILE, package_dir, e
        ))
    })?;

    if metadata.package_type != "translate" {
        return Err(BackendError::Verification(format!(
            "{:?} is a '{}' package, not a translation package",
            package_dir, metadata.package_type
        )));
    }

    Ok(LanguagePair::new(metadata.from_code, metadata.to_code))
}

/// Find every installed translation package under `models_dir`.
///
/// Directories without readable metadata are skipped, not reported as errors.
pub fn scan_installed(models_dir: &Path) -> Result<Vec<(LanguagePair, PathBuf)>, BackendError> {
    if !models_dir.exists() {
        return Ok(Vec::new());
    }

    let mut installed = Vec::new();
    for entry in std::fs::read_dir(models_dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));

        if hidden || !path.is_dir() {
            continue;
        }

        match read_package_pair(&path) {
            Ok(pair) => installed.push((pair, path)),
            Err(e) => debug!("Skipping {:?}: {}", path, e),
        }
    }

    installed.sort();
    Ok(installed)
}

/// Verify SHA-256 checksum of a downloaded file.
pub async fn verify_checksum(file_path: &Path, expected_hash: &str) -> Result<(), BackendError> {
    let mut file = tokio::fs::File::open(file_path).await?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 1024 * 1024];

    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let computed_hash = format!("{:x}", hasher.finalize());
    if !computed_hash.eq_ignore_ascii_case(expected_hash) {
        return Err(BackendError::Verification(format!(
            "hash mismatch: expected {}, got {}",
            expected_hash, computed_hash
        )));
    }

    Ok(())
}

/// Extract a package archive into `dest_dir` and return the package directory.
///
/// Argos archives hold a single top-level directory containing
/// `metadata.json` and the model files. The whole archive is checked before
/// anything is written, unpacked under `dest_dir/.downloads` and only moved
/// next to the installed packages once its metadata names `expected`. A
/// rejected archive leaves nothing behind in `dest_dir`.
pub fn extract_package(
    archive_path: &Path,
    dest_dir: &Path,
    expected: &LanguagePair,
) -> Result<PathBuf, BackendError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| BackendError::Verification(format!("not a package archive: {}", e)))?;

    let (root, entries) = package_layout(&mut archive)?;

    let mut staging_name = root.as_os_str().to_os_string();
    staging_name.push(".extracting");
    let staging = dest_dir.join(DOWNLOADS_DIR).join(staging_name);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }

    let staged = unpack(&mut archive, &entries, &staging)
        .and_then(|()| verify_staged(&staging.join(&root), expected));
    if let Err(e) = staged {
        warn!("Discarding rejected package {:?}: {}", archive_path, e);
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }

    let package_dir = dest_dir.join(&root);
    if package_dir.exists() {
        warn!("Replacing existing package directory {:?}", package_dir);
        std::fs::remove_dir_all(&package_dir)?;
    }
    let moved = std::fs::rename(staging.join(&root), &package_dir);
    let _ = std::fs::remove_dir_all(&staging);
    moved?;

    info!("Extracted package to {:?}", package_dir);
    Ok(package_dir)
}

/// Check every entry stays inside a single top-level directory.
/// Returns that directory and the (index, relative path) of each entry.
fn package_layout(
    archive: &mut ZipArchive<File>,
) -> Result<(PathBuf, Vec<(usize, PathBuf)>), BackendError> {
    let mut package_root: Option<PathBuf> = None;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| BackendError::Verification(format!("corrupt archive entry: {}", e)))?;

        let relative = entry
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| {
                BackendError::Verification(format!("unsafe path in archive: {}", entry.name()))
            })?;

        let root = match relative.components().next() {
            Some(Component::Normal(root)) => PathBuf::from(root),
            _ => continue,
        };

        match &package_root {
            None => package_root = Some(root),
            Some(existing) if *existing != root => {
                return Err(BackendError::Verification(format!(
                    "archive has more than one top-level directory ({:?}, {:?})",
                    existing, root
                )));
            }
            Some(_) => {}
        }

        entries.push((i, relative));
    }

    let root = package_root
        .ok_or_else(|| BackendError::Verification("package archive is empty".to_string()))?;
    Ok((root, entries))
}

fn unpack(
    archive: &mut ZipArchive<File>,
    entries: &[(usize, PathBuf)],
    staging: &Path,
) -> Result<(), BackendError> {
    for (index, relative) in entries {
        let mut entry = archive
            .by_index(*index)
            .map_err(|e| BackendError::Verification(format!("corrupt archive entry: {}", e)))?;

        let outpath = staging.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile)?;
        }
    }

    Ok(())
}

fn verify_staged(package_dir: &Path, expected: &LanguagePair) -> Result<(), BackendError> {
    if !package_dir.join(METADATA_FILE).is_file() {
        return Err(BackendError::Verification(format!(
            "package has no {}",
            METADATA_FILE
        )));
    }

    let pair = read_package_pair(package_dir)?;
    if pair != *expected {
        return Err(BackendError::Verification(format!(
            "package for {} contains {} instead",
            expected, pair
        )));
    }

    Ok(())
}
