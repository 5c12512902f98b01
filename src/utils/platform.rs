//! Platform helpers that do not belong to the install profile itself.

use anyhow::Result;
use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Returns the current user's home directory.
///
/// # Errors
///
/// Fails when neither `HOME` (Unix) nor `USERPROFILE` (Windows) can be resolved,
/// with a hint naming the variable to check.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Returns the platform's executable suffix (`.exe` on Windows, empty elsewhere).
#[must_use]
pub fn executable_suffix_for(os: &str) -> &'static str {
    if os == "windows" { ".exe" } else { "" }
}
