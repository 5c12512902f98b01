//! Installer configuration
//!
//! Every setting has a default matching the published wallet releases, so the
//! installer runs without any configuration file. A file is only needed to point
//! at a mirror, change timeouts or tune the replace retry schedule.
//!
//! # Location
//!
//! Resolved in this order:
//!
//! 1. `--config <path>` on the command line
//! 2. the `MOLLY_INSTALLER_CONFIG` environment variable
//! 3. `<config dir>/molly-installer/config.toml` (`~/.config` on Linux,
//!    `~/Library/Application Support` on macOS, `%APPDATA%` on Windows)
//!
//! A missing file yields the defaults. A file that exists but does not parse is an error.
//!
//! # Example
//!
//! ```toml
//! download_base_url = "https://mirror.example.com/wallet/releases/download"
//! fatal_pause_secs = 3
//!
//! [network]
//! timeout_secs = 120
//!
//! [progress]
//! tick_interval_ms = 500
//!
//! [sdk]
//! enabled = false
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    CONFIG_ENV_VAR, DEFAULT_CONNECT_TIMEOUT, DEFAULT_DOWNLOAD_BASE_URL, DEFAULT_FATAL_PAUSE,
    DEFAULT_NETWORK_TIMEOUT, DEFAULT_RELEASE_API_URL, DEFAULT_SDK_ARTIFACTS, DEFAULT_SDK_BASE_URL,
    DEFAULT_TICK_CEILING, DEFAULT_TICK_INTERVAL_MS, REPLACE_ATTEMPTS, REPLACE_DELAY_STEP_MS,
    REPLACE_FIRST_DELAY_MS,
};

/// Top-level installer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Object store prefix; packages live at `{base}/v{version}-{build}/`.
    pub download_base_url: String,

    /// Endpoint returning the latest release as JSON with a `tag_name` field.
    pub release_api_url: String,

    /// Seconds a fatal notification stays visible before the run ends.
    pub fatal_pause_secs: u64,

    /// Whether to start the wallet after a successful install.
    pub launch_after_install: bool,

    /// HTTP client bounds.
    pub network: NetworkConfig,

    /// Trickle ticker settings.
    pub progress: ProgressConfig,

    /// Schedule for overwriting the installed binary.
    pub retry: RetryConfig,

    /// Wallet SDK jar download.
    pub sdk: SdkConfig,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            release_api_url: DEFAULT_RELEASE_API_URL.to_string(),
            fatal_pause_secs: DEFAULT_FATAL_PAUSE.as_secs(),
            launch_after_install: true,
            network: NetworkConfig::default(),
            progress: ProgressConfig::default(),
            retry: RetryConfig::default(),
            sdk: SdkConfig::default(),
        }
    }
}

/// HTTP client bounds applied to every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Upper bound for a whole request, body included.
    pub timeout_secs: u64,
    /// Upper bound for establishing the connection.
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_NETWORK_TIMEOUT.as_secs(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
        }
    }
}

impl NetworkConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Trickle ticker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Ticker period in milliseconds; `0` disables the ticker.
    pub tick_interval_ms: u64,
    /// The ticker never advances the percentage past this value.
    pub tick_ceiling: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            tick_ceiling: DEFAULT_TICK_CEILING,
        }
    }
}

impl ProgressConfig {
    /// Ticker period, or `None` when the ticker is disabled.
    #[must_use]
    pub const fn tick_interval(&self) -> Option<Duration> {
        if self.tick_interval_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.tick_interval_ms))
        }
    }
}

/// Countdown schedule for replacing the installed binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before the second attempt.
    pub first_delay_ms: u64,
    /// Each later delay is this much shorter than the one before.
    pub step_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: REPLACE_ATTEMPTS,
            first_delay_ms: REPLACE_FIRST_DELAY_MS,
            step_ms: REPLACE_DELAY_STEP_MS,
        }
    }
}

/// Wallet SDK jars fetched into the install root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Set to `false` to skip the SDK stage entirely.
    pub enabled: bool,
    /// Release prefix the jars are downloaded from.
    pub base_url: String,
    /// Jar file names, each fetched from `{base_url}/{name}`.
    pub artifacts: Vec<String>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_SDK_BASE_URL.to_string(),
            artifacts: DEFAULT_SDK_ARTIFACTS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl InstallerConfig {
    /// Fatal pause as a [`Duration`].
    #[must_use]
    pub const fn fatal_pause(&self) -> Duration {
        Duration::from_secs(self.fatal_pause_secs)
    }

    /// Load configuration from an explicit path, the environment override or the
    /// default location, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path),
            None => std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from).or_else(Self::default_path),
        };

        match path {
            Some(path) if path.exists() => Self::load_from(&path).await,
            Some(path) => {
                tracing::debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read installer config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse installer config from {}", path.display()))?;
        tracing::debug!("Loaded installer config from {}", path.display());
        Ok(config)
    }

    /// Default configuration file location, if the platform has a config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("molly-installer").join("config.toml"))
    }
}
