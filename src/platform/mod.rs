//! Platform profile resolution
//!
//! A [`PlatformProfile`] is computed once at startup from the running OS and the
//! user's home directory. Resolution never fails: an OS with no published wallet
//! build resolves to [`OsBuild::Unsupported`] with empty paths, and the stages
//! that need those paths fail with `UnsupportedPlatformError` when they reach them.

pub mod integration;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{APP_BINARY_NAME, INSTALL_ROOT_DIR, MACOS_BUNDLE_NAME, SHORTCUT_NAME};
use crate::core::UnsupportedPlatformError;
use crate::utils::platform::executable_suffix_for;

pub use integration::{NativePlatform, PlatformIntegration};

/// Wallet build published for an operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsBuild {
    /// macOS
    Darwin,
    /// Linux
    Linux,
    /// Windows
    Windows,
    /// Anything else; no package exists
    Unsupported,
}

impl OsBuild {
    /// Map a [`std::env::consts::OS`] style identifier to a build.
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" | "darwin" => Self::Darwin,
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            _ => Self::Unsupported,
        }
    }

    /// Tag embedded in release URLs (`v1.1.9-linux`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Unsupported => "unsupported",
        }
    }

    /// Whether a package is published for this build.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for OsBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS-specific paths and capabilities, immutable after resolution.
///
/// The shortcut fields are only populated on Windows and the bundle field only
/// on macOS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    /// Build tag used in release URLs
    pub os_build: OsBuild,
    /// OS identifier the profile was resolved from
    pub os: String,
    /// `.exe` on Windows, empty elsewhere
    pub executable_suffix: String,
    /// Where the wallet binary is installed
    pub install_binary_path: PathBuf,
    /// Start Menu programs directory (Windows)
    pub start_menu_shortcut_dir: PathBuf,
    /// Desktop directory (Windows)
    pub desktop_shortcut_dir: PathBuf,
    /// Shortcut created inside the install root (Windows)
    pub shortcut_file_path: PathBuf,
    /// Installed application bundle (macOS)
    pub application_bundle_dir: Option<PathBuf>,
}

impl PlatformProfile {
    /// Resolve the profile for the running OS.
    #[must_use]
    pub fn resolve(home: &Path) -> Self {
        Self::for_os(std::env::consts::OS, home)
    }

    /// Resolve the profile for an explicit OS identifier.
    #[must_use]
    pub fn for_os(os: &str, home: &Path) -> Self {
        let os_build = OsBuild::from_os(os);
        let install_root = home.join(INSTALL_ROOT_DIR);
        let executable_suffix = executable_suffix_for(os).to_string();

        let mut profile = Self {
            os_build,
            os: os.to_string(),
            executable_suffix: String::new(),
            install_binary_path: PathBuf::new(),
            start_menu_shortcut_dir: PathBuf::new(),
            desktop_shortcut_dir: PathBuf::new(),
            shortcut_file_path: PathBuf::new(),
            application_bundle_dir: None,
        };

        match os_build {
            OsBuild::Windows => {
                profile.install_binary_path =
                    install_root.join(format!("{APP_BINARY_NAME}{executable_suffix}"));
                profile.start_menu_shortcut_dir = home
                    .join("AppData")
                    .join("Roaming")
                    .join("Microsoft")
                    .join("Windows")
                    .join("Start Menu")
                    .join("Programs");
                profile.desktop_shortcut_dir = home.join("Desktop");
                profile.shortcut_file_path = install_root.join(SHORTCUT_NAME);
                profile.executable_suffix = executable_suffix;
            }
            OsBuild::Darwin => {
                profile.install_binary_path = install_root.join(APP_BINARY_NAME);
                profile.application_bundle_dir =
                    Some(PathBuf::from("/Applications").join(MACOS_BUNDLE_NAME));
            }
            OsBuild::Linux => {
                profile.install_binary_path = install_root.join(APP_BINARY_NAME);
            }
            OsBuild::Unsupported => {}
        }

        profile
    }

    /// Fail with [`UnsupportedPlatformError`] unless a package exists for this OS.
    ///
    /// # Errors
    ///
    /// Returns an error when the profile is [`OsBuild::Unsupported`].
    pub fn require_supported(&self) -> Result<(), UnsupportedPlatformError> {
        if self.os_build.is_supported() {
            Ok(())
        } else {
            Err(UnsupportedPlatformError { os: self.os.clone() })
        }
    }

    /// Start Menu and Desktop copies of the shortcut (Windows only, empty elsewhere).
    #[must_use]
    pub fn shortcut_copies(&self) -> Vec<PathBuf> {
        if self.os_build != OsBuild::Windows {
            return Vec::new();
        }
        vec![
            self.start_menu_shortcut_dir.join(SHORTCUT_NAME),
            self.desktop_shortcut_dir.join(SHORTCUT_NAME),
        ]
    }
}
