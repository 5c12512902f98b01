//! Release archive extraction.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::constants::{APP_BINARY_NAME, EXTRACT_DIR, MACOS_BUNDLE_NAME, UPDATE_BINARY_NAME};
use crate::core::UnpackError;
use crate::platform::{OsBuild, PlatformProfile};

/// Artifact locations inside an extracted release.
///
/// Paths are computed from the fixed artifact names, not discovered; whether the
/// files exist is checked by the replace step before anything is copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedPayload {
    /// Extraction root (`<staging>/new_build`)
    pub root: PathBuf,
    /// Wallet application binary
    pub application_binary_path: PathBuf,
    /// Self-update helper binary
    pub update_helper_binary_path: PathBuf,
    /// Application bundle (macOS only)
    pub application_bundle_path: Option<PathBuf>,
}

impl UnpackedPayload {
    /// Payload paths for an extraction root and platform.
    #[must_use]
    pub fn locate(root: PathBuf, profile: &PlatformProfile) -> Self {
        let suffix = &profile.executable_suffix;
        Self {
            application_binary_path: root.join(format!("{APP_BINARY_NAME}{suffix}")),
            update_helper_binary_path: root.join(format!("{UPDATE_BINARY_NAME}{suffix}")),
            application_bundle_path: (profile.os_build == OsBuild::Darwin)
                .then(|| root.join(MACOS_BUNDLE_NAME)),
            root,
        }
    }
}

/// Extract `archive` into `<staging_dir>/new_build` and locate the payload.
///
/// # Errors
///
/// Returns [`UnpackError::CorruptArchive`] if the archive cannot be opened or any
/// entry fails to extract.
pub async fn unpack(
    archive: &Path,
    staging_dir: &Path,
    profile: &PlatformProfile,
) -> Result<UnpackedPayload, UnpackError> {
    let root = staging_dir.join(EXTRACT_DIR);
    tracing::info!("Extracting {} into {}", archive.display(), root.display());

    let archive_path = archive.to_path_buf();
    let extract_root = root.clone();
    let extracted = tokio::task::spawn_blocking(move || extract(&archive_path, &extract_root))
        .await
        .map_err(|e| corrupt(archive, e))?;
    let count = extracted.map_err(|e| corrupt(archive, e))?;

    tracing::debug!("Extracted {count} entries");
    Ok(UnpackedPayload::locate(root, profile))
}

fn extract(archive: &Path, destination: &Path) -> zip::result::ZipResult<usize> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    std::fs::create_dir_all(destination)?;

    let mut count = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = destination.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out_file = File::create(&out_path)?;
            io::copy(&mut entry, &mut out_file)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))?;
            }
        }

        count += 1;
    }

    Ok(count)
}

fn corrupt(archive: &Path, reason: impl std::fmt::Display) -> UnpackError {
    UnpackError::CorruptArchive {
        path: archive.to_path_buf(),
        reason: reason.to_string(),
    }
}
