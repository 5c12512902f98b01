//! Names, checkpoints and defaults shared across the installer.
//!
//! Artifact names are fixed by the release layout published for every wallet
//! version; changing any of them breaks compatibility with existing releases
//! and with installs made by earlier installer versions.

use std::time::Duration;

/// Directory under the user's home that holds the installed wallet.
pub const INSTALL_ROOT_DIR: &str = ".dag";

/// Directory under the user's home used as scratch space for a single run.
pub const STAGING_DIR: &str = ".tmp";

/// Subdirectory of the staging root the release archive is extracted into.
pub const EXTRACT_DIR: &str = "new_build";

/// Base name of the wallet application binary (before the executable suffix).
pub const APP_BINARY_NAME: &str = "mollywallet";

/// Base name of the self-update helper binary (before the executable suffix).
pub const UPDATE_BINARY_NAME: &str = "update";

/// File name of the release archive in the object store.
pub const PACKAGE_ARCHIVE: &str = "mollywallet.zip";

/// File name of the checksum manifest published next to the archive.
pub const CHECKSUM_MANIFEST: &str = "checksum.sha256";

/// Shortcut file created on Windows.
pub const SHORTCUT_NAME: &str = "Molly Wallet.lnk";

/// Application bundle installed on macOS.
pub const MACOS_BUNDLE_NAME: &str = "Molly - Constellation Desktop Wallet.app";

/// Suffix appended to a download destination while the transfer is in flight.
pub const PARTIAL_SUFFIX: &str = ".tmp";

/// Embedded database written by the wallet.
pub const WALLET_DATABASE: &str = "store.db";

/// Log files written by the wallet, the update helper and earlier installers.
pub const LOG_FILES: &[&str] = &["wallet.log", "update.log", "install.log"];

/// Default wallet SDK jars fetched next to the wallet.
pub const DEFAULT_SDK_ARTIFACTS: &[&str] = &["cl-keytool.jar", "cl-wallet.jar"];

/// Object store prefix for release packages.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str =
    "https://github.com/grvlle/constellation_wallet/releases/download";

/// Release registry endpoint returning the latest release.
pub const DEFAULT_RELEASE_API_URL: &str =
    "https://api.github.com/repos/grvlle/constellation_wallet/releases/latest";

/// Release host for the wallet SDK jars.
pub const DEFAULT_SDK_BASE_URL: &str =
    "https://github.com/Constellation-Labs/constellation/releases/download/v2.6.0";

/// Number of characters of a release tag (after the leading `v`) that form the version.
pub const RELEASE_VERSION_LEN: usize = 5;

/// Trickle ticker never advances the displayed percentage past this value.
pub const DEFAULT_TICK_CEILING: u8 = 97;

/// Default period of the trickle ticker.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Attempts made to overwrite the installed binary before giving up.
pub const REPLACE_ATTEMPTS: u32 = 5;

/// Delay before the second replace attempt; each later delay is one step shorter.
pub const REPLACE_FIRST_DELAY_MS: u64 = 5000;

/// Amount each successive replace delay shrinks by.
pub const REPLACE_DELAY_STEP_MS: u64 = 1000;

/// How long a fatal notification stays on screen before the run ends.
pub const DEFAULT_FATAL_PAUSE: Duration = Duration::from_secs(10);

/// Upper bound for a single network request.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(600);

/// Upper bound for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable pointing at an alternative configuration file.
pub const CONFIG_ENV_VAR: &str = "MOLLY_INSTALLER_CONFIG";

/// Environment variable that hides animated progress output.
pub const NO_PROGRESS_ENV_VAR: &str = "MOLLY_NO_PROGRESS";

/// User agent sent with every request; the release registry rejects anonymous agents.
pub const USER_AGENT: &str = concat!("molly-installer/", env!("CARGO_PKG_VERSION"));
