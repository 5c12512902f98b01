//! Command-line interface
//!
//! ```bash
//! # Install or update to the latest release
//! molly-installer install
//!
//! # Install without starting the wallet afterwards
//! molly-installer install --no-launch
//!
//! # Remove the wallet and everything it wrote
//! molly-installer uninstall
//! ```
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - errors only
//! - `--no-progress` - hide the progress bar (notifications are still printed)
//! - `--config <PATH>` - use a specific configuration file
//!
//! Without `--verbose` or `--quiet` the log level comes from `RUST_LOG`, falling
//! back to warnings only so log lines do not fight the progress bar.

mod install;
mod uninstall;

pub use install::InstallCommand;
pub use uninstall::UninstallCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::InstallerConfig;

/// Settings derived from global flags, passed to every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Explicit log filter, or `None` to use `RUST_LOG`
    pub log_level: Option<String>,
    /// Hide the progress bar
    pub no_progress: bool,
    /// Configuration file given with `--config`
    pub config_path: Option<PathBuf>,
}

/// Installer for the Molly Constellation desktop wallet.
#[derive(Parser)]
#[command(
    name = "molly-installer",
    about = "Install, update and uninstall Molly Wallet",
    version,
    long_about = "Downloads the latest Molly Wallet release, verifies its checksum and installs it into ~/.dag. \
                  Running it again updates an existing installation."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the installer configuration file.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(long, global = true)]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Install or update Molly Wallet
    Install(InstallCommand),

    /// Remove Molly Wallet and its data
    Uninstall(UninstallCommand),
}

impl Cli {
    /// Run the selected command with settings from the global flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command fails.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the command fails.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        init_logging(config.log_level.as_deref());

        let installer_config = InstallerConfig::load_with_optional(config.config_path.clone()).await?;

        match self.command {
            Commands::Install(cmd) => cmd.execute(installer_config, &config).await,
            Commands::Uninstall(cmd) => cmd.execute(installer_config, &config).await,
        }
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `level` overrides `RUST_LOG`; with neither, only warnings and errors are shown.
/// Calling it again is a no-op.
pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
