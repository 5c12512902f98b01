//! `uninstall` command.

use anyhow::Result;
use clap::Args;

use super::CliConfig;
use crate::config::InstallerConfig;
use crate::installer::{InstallSession, uninstall};
use crate::progress::{ProgressReporter, TerminalObserver};

/// Remove Molly Wallet, its logs, its database and its shortcuts.
#[derive(Args, Debug)]
pub struct UninstallCommand {}

impl UninstallCommand {
    /// Run the uninstall workflow. Individual removal failures are reported but
    /// do not fail the command.
    ///
    /// # Errors
    ///
    /// Returns an error only if the home directory cannot be determined.
    pub async fn execute(self, config: InstallerConfig, cli: &CliConfig) -> Result<()> {
        let (progress, reporter) =
            ProgressReporter::spawn(TerminalObserver::new(cli.no_progress), &config.progress);
        let session = InstallSession::from_environment(config, progress.clone())?;

        let report = uninstall(&session).await;
        tracing::debug!("Uninstall report: {report:?}");

        progress.close().await;
        reporter.join().await;
        Ok(())
    }
}
