//! File system helpers used by the preparer, the replacer and the cleaner.
//!
//! These helpers return plain [`std::io::Result`] so callers can attach the
//! path-specific error variant they need (`FilesystemError::Copy`,
//! `RemovalFailure`, ...).

use std::fs;
use std::io;
use std::path::Path;

/// Ensures a directory exists, creating it and any missing parents.
///
/// Fails if `path` exists but is not a directory.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists but is not a directory", path.display()),
            ));
        }
        return Ok(());
    }
    fs::create_dir_all(path)
}

/// Ensures a directory exists with the given Unix permission bits.
///
/// On Windows the mode is ignored.
pub fn ensure_dir_with_mode(path: &Path, mode: u32) -> io::Result<()> {
    ensure_dir(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

/// Recursively copies a directory tree.
///
/// Files are overwritten, directories are merged and symlinks are skipped.
pub fn copy_dir(src: &Path, dst: &Path) -> io::Result<()> {
    ensure_dir(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}

/// Copies a file, making sure the destination's parent exists first.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst)
}

/// Removes a file or a directory tree.
///
/// Returns `Ok(true)` when something was removed and `Ok(false)` when the path
/// did not exist, so callers can treat a missing path as success.
pub fn remove_path(path: &Path) -> io::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Returns whether `path` is a directory with no entries.
pub fn is_empty_dir(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}
