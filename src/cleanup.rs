//! Filesystem preparation and cleanup.
//!
//! Every removal here is independent: a path that cannot be removed is recorded
//! and the remaining paths are still attempted. A path that does not exist counts
//! as removed, which makes [`prepare`], [`clean_up`] and [`teardown`] idempotent.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::{
    APP_BINARY_NAME, CHECKSUM_MANIFEST, DEFAULT_SDK_ARTIFACTS, LOG_FILES, PACKAGE_ARCHIVE,
    PARTIAL_SUFFIX, SHORTCUT_NAME, UPDATE_BINARY_NAME, WALLET_DATABASE,
};
use crate::core::{FilesystemError, RemovalFailure};
use crate::platform::PlatformProfile;
use crate::utils::fs::{ensure_dir, ensure_dir_with_mode, is_empty_dir, remove_path};

/// Permissions the install root is created with.
pub const INSTALL_ROOT_MODE: u32 = 0o755;

/// Legacy scratch folder some earlier installers left inside the install root.
const LEGACY_TMP_DIR: &str = "tmp";

/// Result of a teardown: what went away and what could not be removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    /// Paths that existed and were removed
    pub removed: Vec<PathBuf>,
    /// Paths that could not be removed
    pub failures: Vec<RemovalFailure>,
}

/// Collects removal outcomes across a batch of paths.
#[derive(Debug, Default)]
struct Removals {
    report: TeardownReport,
}

impl Removals {
    fn remove(&mut self, path: &Path) {
        match remove_path(path) {
            Ok(true) => {
                debug!("Removed {}", path.display());
                self.report.removed.push(path.to_path_buf());
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Failed to remove {}: {e}", path.display());
                self.report.failures.push(RemovalFailure {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn into_result(self) -> Result<TeardownReport, FilesystemError> {
        if self.report.failures.is_empty() {
            Ok(self.report)
        } else {
            Err(FilesystemError::Removal {
                failures: self.report.failures,
            })
        }
    }
}

/// File names in the install root that would collide with a fresh install:
/// partial and complete downloads, SDK jars, the shortcut and the wallet binary.
#[must_use]
pub fn stale_artifacts(profile: &PlatformProfile) -> Vec<String> {
    let mut names = Vec::new();
    for name in DEFAULT_SDK_ARTIFACTS.iter().chain([PACKAGE_ARCHIVE, CHECKSUM_MANIFEST].iter()) {
        names.push((*name).to_string());
        names.push(format!("{name}{PARTIAL_SUFFIX}"));
    }
    names.push(SHORTCUT_NAME.to_string());
    names.push(format!("{APP_BINARY_NAME}{}", profile.executable_suffix));
    names
}

/// Every file an installation persists in the install root.
#[must_use]
pub fn installed_artifacts(profile: &PlatformProfile) -> Vec<String> {
    let mut names = stale_artifacts(profile);
    names.push(format!("{UPDATE_BINARY_NAME}{}", profile.executable_suffix));
    names.push(WALLET_DATABASE.to_string());
    names.extend(LOG_FILES.iter().map(ToString::to_string));
    names
}

/// Clear stale artifacts and reset the staging directory before an install.
///
/// Removes the stale artifact names from `install_root`, removes `staging_dir`
/// recursively, then creates `install_root` (mode `0o755` on unix) and an empty
/// `staging_dir`. Calling it twice in a row is a no-op the second time.
///
/// # Errors
///
/// [`FilesystemError::Removal`] listing every path that could not be removed, or
/// [`FilesystemError::CreateDir`] if either directory cannot be created.
pub fn prepare(
    install_root: &Path,
    staging_dir: &Path,
    profile: &PlatformProfile,
) -> Result<(), FilesystemError> {
    let mut removals = Removals::default();
    for name in stale_artifacts(profile) {
        removals.remove(&install_root.join(name));
    }
    if let Some(bundle) = &profile.application_bundle_dir {
        removals.remove(bundle);
    }
    removals.remove(staging_dir);
    removals.into_result()?;

    ensure_dir_with_mode(install_root, INSTALL_ROOT_MODE).map_err(|source| {
        FilesystemError::CreateDir {
            path: install_root.to_path_buf(),
            source,
        }
    })?;
    ensure_dir(staging_dir).map_err(|source| FilesystemError::CreateDir {
        path: staging_dir.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Remove the downloaded package, checksum manifest and staging tree after an install.
///
/// # Errors
///
/// [`FilesystemError::Removal`] listing every path that could not be removed.
pub fn clean_up(install_root: &Path, staging_dir: &Path) -> Result<(), FilesystemError> {
    let mut removals = Removals::default();
    for name in [PACKAGE_ARCHIVE, CHECKSUM_MANIFEST] {
        removals.remove(&install_root.join(name));
    }
    removals.remove(staging_dir);
    removals.into_result().map(|_| ())
}

/// Remove every persisted artifact of an installation.
///
/// Covers binaries, logs, the wallet database, downloads and the shortcut in
/// `install_root`, the staging tree, the Start Menu and Desktop shortcuts on
/// Windows and the application bundle on macOS. The install root itself is
/// removed only when nothing else is left in it.
#[must_use]
pub fn teardown(install_root: &Path, staging_dir: &Path, profile: &PlatformProfile) -> TeardownReport {
    let mut removals = Removals::default();

    for name in installed_artifacts(profile) {
        removals.remove(&install_root.join(name));
    }
    removals.remove(&install_root.join(LEGACY_TMP_DIR));
    removals.remove(staging_dir);

    for shortcut in profile.shortcut_copies() {
        removals.remove(&shortcut);
    }
    if let Some(bundle) = &profile.application_bundle_dir {
        removals.remove(bundle);
    }

    match is_empty_dir(install_root) {
        Ok(true) => removals.remove(install_root),
        Ok(false) => debug!("Keeping {}: it still contains files", install_root.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Unable to inspect {}: {e}", install_root.display()),
    }

    removals.report
}
