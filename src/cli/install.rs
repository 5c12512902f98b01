//! `install` command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use crate::config::InstallerConfig;
use crate::installer::{InstallSession, Installer};
use crate::platform::NativePlatform;
use crate::progress::{ProgressReporter, TerminalObserver};
use crate::release::GithubRegistry;
use crate::transfer::{HttpFetcher, build_client};

/// Install the latest Molly Wallet release, replacing any existing install.
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Do not start the wallet after installing.
    #[arg(long)]
    pub(super) no_launch: bool,
}

impl InstallCommand {
    /// Run the install pipeline with a terminal observer. Ctrl-C cancels the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the run aborts or is cancelled.
    pub async fn execute(self, mut config: InstallerConfig, cli: &CliConfig) -> Result<()> {
        if self.no_launch {
            config.launch_after_install = false;
        }

        let client = build_client(&config.network).context("Failed to initialise the HTTP client")?;
        let registry = GithubRegistry::new(client.clone(), config.release_api_url.clone());
        let fetcher = HttpFetcher::new(client);

        let (progress, reporter) =
            ProgressReporter::spawn(TerminalObserver::new(cli.no_progress), &config.progress);
        let mut session = InstallSession::from_environment(config, progress.clone())?;

        let installer = Installer::new(registry, fetcher, NativePlatform);
        let cancel = installer.cancellation_token();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling installation");
                cancel.cancel();
            }
        });

        let result = installer.install(&mut session).await;
        ctrl_c.abort();
        progress.close().await;
        reporter.join().await;

        let report = result.context("Installation failed")?;
        if !report.warnings.is_empty() {
            eprintln!(
                "{}",
                format!(
                    "Molly Wallet {} was installed with {} warning(s)",
                    report.version,
                    report.warnings.len()
                )
                .yellow()
            );
        }
        Ok(())
    }
}
