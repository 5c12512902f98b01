//! Install and uninstall workflows
//!
//! [`Installer::install`] drives one install run through a fixed sequence of
//! stages. Each stage reports a checkpoint to the progress observer on entry:
//!
//! | Stage | % | On failure |
//! |---|---|---|
//! | `CheckRuntimeDependency` | 8 | abort (Windows only probes) |
//! | `PrepareFilesystem` | 20 | abort |
//! | `ResolveVersion` | 30 | abort |
//! | `DownloadPackage` | 35 | abort |
//! | `VerifyChecksum` | 70 | abort, also on mismatch |
//! | `FetchSdk` | 78 | report and continue |
//! | `ExtractArchive` | 88 | abort |
//! | `ReplaceBinaries` | 95 | retry the wallet binary, then abort; helper, bundle and shortcuts report and continue |
//! | `LaunchApplication` | 98 | report and continue |
//! | `CleanUp` | 99 | report and continue |
//! | `Done` | 100 | |
//!
//! An abort notifies the observer, waits the configured pause so the message can
//! be read, and returns [`PipelineError::Aborted`]. Every stage is raced against
//! the installer's cancellation token; cancelling ends the run with
//! [`PipelineError::Cancelled`].
//!
//! [`uninstall`] is independent of any install state and always ends with a
//! success notification.

mod replace;
mod uninstall;

pub use replace::{ReplaceRetryPolicy, retry_with_countdown};
pub use uninstall::uninstall;

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::archive::{self, UnpackedPayload};
use crate::cleanup;
use crate::config::InstallerConfig;
use crate::constants::{
    APP_BINARY_NAME, CHECKSUM_MANIFEST, INSTALL_ROOT_DIR, PACKAGE_ARCHIVE, STAGING_DIR,
    UPDATE_BINARY_NAME,
};
use crate::core::{FilesystemError, InstallerError};
use crate::platform::{OsBuild, PlatformIntegration, PlatformProfile};
use crate::progress::ProgressHandle;
use crate::release::{ReleaseRegistry, package_url};
use crate::transfer::Fetcher;
use crate::utils::fs::{copy_dir, copy_file};
use crate::utils::platform::get_home_dir;
use crate::verify::ChecksumVerifier;

/// Title of every success notification.
pub const SUCCESS_TITLE: &str = "Success!";

/// Detail of the install success notification.
pub const INSTALL_SUCCESS_DETAIL: &str = "Molly wallet has been successfully installed.";

/// Detail of the uninstall success notification.
pub const UNINSTALL_SUCCESS_DETAIL: &str = "Molly wallet has been successfully uninstalled.";

/// A step of the install pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStage {
    /// Probe for (and on Windows bootstrap) the Java runtime
    CheckRuntimeDependency,
    /// Clear stale artifacts and reset the staging directory
    PrepareFilesystem,
    /// Ask the release registry for the latest version
    ResolveVersion,
    /// Download the release archive into the staging directory
    DownloadPackage,
    /// Compare the archive digest with the published manifest
    VerifyChecksum,
    /// Download the wallet SDK jars into the install root
    FetchSdk,
    /// Extract the archive
    ExtractArchive,
    /// Copy the new binaries, bundle and shortcuts into place
    ReplaceBinaries,
    /// Start the installed wallet
    LaunchApplication,
    /// Remove downloads and the staging tree
    CleanUp,
    /// Finished
    Done,
}

impl InstallStage {
    /// Every stage in execution order.
    pub const ALL: [Self; 11] = [
        Self::CheckRuntimeDependency,
        Self::PrepareFilesystem,
        Self::ResolveVersion,
        Self::DownloadPackage,
        Self::VerifyChecksum,
        Self::FetchSdk,
        Self::ExtractArchive,
        Self::ReplaceBinaries,
        Self::LaunchApplication,
        Self::CleanUp,
        Self::Done,
    ];

    /// Percentage reported when the stage starts.
    #[must_use]
    pub const fn checkpoint(self) -> u8 {
        match self {
            Self::CheckRuntimeDependency => 8,
            Self::PrepareFilesystem => 20,
            Self::ResolveVersion => 30,
            Self::DownloadPackage => 35,
            Self::VerifyChecksum => 70,
            Self::FetchSdk => 78,
            Self::ExtractArchive => 88,
            Self::ReplaceBinaries => 95,
            Self::LaunchApplication => 98,
            Self::CleanUp => 99,
            Self::Done => 100,
        }
    }

    /// Status text reported when the stage starts.
    #[must_use]
    pub const fn status(self) -> &'static str {
        match self {
            Self::CheckRuntimeDependency => "Checking for a Java runtime",
            Self::PrepareFilesystem => "Preparing the install directory",
            Self::ResolveVersion => "Looking up the latest release",
            Self::DownloadPackage => "Downloading Molly Wallet",
            Self::VerifyChecksum => "Verifying package integrity",
            Self::FetchSdk => "Downloading the wallet SDK",
            Self::ExtractArchive => "Extracting the package",
            Self::ReplaceBinaries => "Installing Molly Wallet",
            Self::LaunchApplication => "Launching Molly Wallet",
            Self::CleanUp => "Cleaning up",
            Self::Done => "Installation complete",
        }
    }

    /// Headline of the error notification for a failure in this stage.
    #[must_use]
    pub const fn failure_title(self) -> &'static str {
        match self {
            Self::CheckRuntimeDependency => "Unable to install Java",
            Self::PrepareFilesystem => "Unable to prepare the install directory",
            Self::ResolveVersion => "Unable to find the latest release",
            Self::DownloadPackage => "Unable to download Molly Wallet",
            Self::VerifyChecksum => "Unable to verify the download",
            Self::FetchSdk => "Unable to download the wallet SDK",
            Self::ExtractArchive => "Unable to extract the package",
            Self::ReplaceBinaries => "Unable to install Molly Wallet",
            Self::LaunchApplication => "Unable to launch Molly Wallet",
            Self::CleanUp => "Unable to clean up",
            Self::Done => "Installation failed",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Terminal failure of an install run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A fatal stage failed.
    #[error("Installation aborted during {stage}")]
    Aborted {
        /// Stage that failed
        stage: InstallStage,
        /// What went wrong
        #[source]
        source: InstallerError,
    },

    /// The cancellation token fired.
    #[error("Installation cancelled during {stage}")]
    Cancelled {
        /// Stage that was running
        stage: InstallStage,
    },
}

impl PipelineError {
    /// Stage the run ended in.
    #[must_use]
    pub const fn stage(&self) -> InstallStage {
        match self {
            Self::Aborted { stage, .. } | Self::Cancelled { stage } => *stage,
        }
    }
}

/// A non-fatal failure that was reported and skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageWarning {
    /// Stage the failure happened in
    pub stage: InstallStage,
    /// Rendered error
    pub message: String,
}

/// Outcome of a successful install run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Version that was installed
    pub version: String,
    /// Non-fatal failures, in the order they happened
    pub warnings: Vec<StageWarning>,
}

/// State for one installer process, shared by install and uninstall.
#[derive(Debug)]
pub struct InstallSession {
    /// Object store prefix for packages
    pub download_base_url: String,
    /// Persistent install root (`~/.dag`)
    pub install_root: PathBuf,
    /// Per-run scratch directory (`~/.tmp`)
    pub staging_dir: PathBuf,
    /// Version resolved during the current install run
    pub resolved_version: Option<String>,
    /// Paths for the running OS
    pub profile: PlatformProfile,
    /// Loaded configuration
    pub config: InstallerConfig,
    /// Sender side of the progress reporter
    pub progress: ProgressHandle,
}

impl InstallSession {
    /// Create a session rooted at `home`.
    #[must_use]
    pub fn new(
        home: &Path,
        profile: PlatformProfile,
        config: InstallerConfig,
        progress: ProgressHandle,
    ) -> Self {
        Self {
            download_base_url: config.download_base_url.clone(),
            install_root: home.join(INSTALL_ROOT_DIR),
            staging_dir: home.join(STAGING_DIR),
            resolved_version: None,
            profile,
            config,
            progress,
        }
    }

    /// Create a session for the current user and OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn from_environment(config: InstallerConfig, progress: ProgressHandle) -> anyhow::Result<Self> {
        let home = get_home_dir()?;
        let profile = PlatformProfile::resolve(&home);
        debug!("Resolved platform profile: {profile:?}");
        Ok(Self::new(&home, profile, config, progress))
    }

    /// Where the release archive is downloaded.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.staging_dir.join(PACKAGE_ARCHIVE)
    }

    /// Where the checksum manifest is downloaded.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.staging_dir.join(CHECKSUM_MANIFEST)
    }

    /// Installed location of the update helper.
    #[must_use]
    pub fn update_helper_path(&self) -> PathBuf {
        self.install_root.join(format!("{UPDATE_BINARY_NAME}{}", self.profile.executable_suffix))
    }

    /// Binary to start after installing: the bundle executable on macOS when the
    /// bundle is present, the install root binary otherwise.
    #[must_use]
    pub fn launch_target(&self) -> PathBuf {
        if let Some(bundle) = &self.profile.application_bundle_dir {
            let executable = bundle.join("Contents").join("MacOS").join(APP_BINARY_NAME);
            if executable.exists() {
                return executable;
            }
        }
        self.profile.install_binary_path.clone()
    }
}

/// Runs the install pipeline against its collaborators.
pub struct Installer<R, F, P> {
    registry: R,
    fetcher: F,
    platform: P,
    cancel: CancellationToken,
}

impl<R, F, P> Installer<R, F, P>
where
    R: ReleaseRegistry,
    F: Fetcher,
    P: PlatformIntegration,
{
    /// Create an installer with its own cancellation token.
    pub fn new(registry: R, fetcher: F, platform: P) -> Self {
        Self {
            registry,
            fetcher,
            platform,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels a running install.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the full install pipeline.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Aborted`] after a fatal stage failure (the observer has
    /// been notified and the pause has elapsed), or [`PipelineError::Cancelled`].
    pub async fn install(&self, session: &mut InstallSession) -> Result<InstallReport, PipelineError> {
        let mut report = InstallReport::default();
        match self.run(session, &mut report).await {
            Ok(()) => Ok(report),
            Err(failure) => Err(self.fail(session, failure).await),
        }
    }

    async fn run(&self, session: &mut InstallSession, report: &mut InstallReport) -> Result<(), PipelineError> {
        let stage = InstallStage::CheckRuntimeDependency;
        self.enter(session, stage).await?;
        if session.profile.os_build == OsBuild::Windows {
            self.guard(stage, self.ensure_runtime()).await?;
        }

        let stage = InstallStage::PrepareFilesystem;
        self.enter(session, stage).await?;
        self.guard(stage, async {
            session.profile.require_supported()?;
            cleanup::prepare(&session.install_root, &session.staging_dir, &session.profile)?;
            Ok::<_, InstallerError>(())
        })
        .await?;

        let stage = InstallStage::ResolveVersion;
        self.enter(session, stage).await?;
        let version = self
            .guard(stage, async { self.registry.latest_version().await.map_err(InstallerError::from) })
            .await?;
        session.resolved_version = Some(version.clone());
        report.version.clone_from(&version);

        let stage = InstallStage::DownloadPackage;
        self.enter(session, stage).await?;
        let url = package_url(&session.download_base_url, &version, session.profile.os_build, PACKAGE_ARCHIVE);
        info!("Downloading {url}");
        let archive_path = session.archive_path();
        self.guard(stage, async { self.fetcher.fetch(&url, &archive_path).await.map_err(InstallerError::from) })
            .await?;

        let stage = InstallStage::VerifyChecksum;
        self.enter(session, stage).await?;
        self.guard(stage, self.verify_package(session, &version)).await?;

        if session.config.sdk.enabled {
            let stage = InstallStage::FetchSdk;
            self.enter(session, stage).await?;
            self.tolerate(session, report, stage, self.fetch_sdk(session)).await?;
        } else {
            debug!("Wallet SDK download disabled");
        }

        let stage = InstallStage::ExtractArchive;
        self.enter(session, stage).await?;
        let payload = self
            .guard(stage, async {
                archive::unpack(&archive_path, &session.staging_dir, &session.profile)
                    .await
                    .map_err(InstallerError::from)
            })
            .await?;

        let stage = InstallStage::ReplaceBinaries;
        self.enter(session, stage).await?;
        self.guard(stage, self.replace_application(session, &payload)).await?;
        self.tolerate(session, report, stage, self.replace_update_helper(session, &payload))
            .await?;
        if session.profile.os_build == OsBuild::Darwin {
            self.tolerate(session, report, stage, Self::replace_bundle(session, &payload))
                .await?;
        }
        if session.profile.os_build == OsBuild::Windows {
            self.tolerate(session, report, stage, self.create_shortcuts(session)).await?;
        }

        if session.config.launch_after_install {
            let stage = InstallStage::LaunchApplication;
            self.enter(session, stage).await?;
            let target = session.launch_target();
            self.tolerate(session, report, stage, async { self.platform.launch(&target) })
                .await?;
        } else {
            debug!("Skipping launch");
        }

        let stage = InstallStage::CleanUp;
        self.enter(session, stage).await?;
        self.tolerate(session, report, stage, async {
            cleanup::clean_up(&session.install_root, &session.staging_dir).map_err(InstallerError::from)
        })
        .await?;

        self.enter(session, InstallStage::Done).await?;
        info!("Installed Molly Wallet {version}");
        session.progress.notify_success(SUCCESS_TITLE, INSTALL_SUCCESS_DETAIL).await;
        session.progress.close().await;
        Ok(())
    }

    async fn enter(&self, session: &InstallSession, stage: InstallStage) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled { stage });
        }
        info!("{stage} ({}%): {}", stage.checkpoint(), stage.status());
        session.progress.report(stage.checkpoint(), stage.status()).await;
        Ok(())
    }

    /// Race a stage against cancellation; a failure aborts the run.
    async fn guard<T>(
        &self,
        stage: InstallStage,
        step: impl Future<Output = Result<T, InstallerError>>,
    ) -> Result<T, PipelineError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(PipelineError::Cancelled { stage }),
            result = step => result.map_err(|source| PipelineError::Aborted { stage, source }),
        }
    }

    /// Race a stage against cancellation; a failure is reported and skipped.
    async fn tolerate(
        &self,
        session: &InstallSession,
        report: &mut InstallReport,
        stage: InstallStage,
        step: impl Future<Output = Result<(), InstallerError>>,
    ) -> Result<(), PipelineError> {
        match self.guard(stage, step).await {
            Ok(()) => Ok(()),
            Err(PipelineError::Aborted { stage, source }) => {
                let message = source.to_string();
                warn!("{stage} failed, continuing: {message}");
                session.progress.notify_error(stage.failure_title(), message.clone()).await;
                report.warnings.push(StageWarning { stage, message });
                Ok(())
            }
            Err(cancelled) => Err(cancelled),
        }
    }

    async fn fail(&self, session: &InstallSession, failure: PipelineError) -> PipelineError {
        match &failure {
            PipelineError::Aborted { stage, source } => {
                error!("{stage} failed: {source}");
                session.progress.notify_error(stage.failure_title(), source.to_string()).await;
                let pause = session.config.fatal_pause();
                if !pause.is_zero() {
                    debug!("Pausing {}s before exiting", pause.as_secs());
                    tokio::time::sleep(pause).await;
                }
            }
            PipelineError::Cancelled { stage } => {
                warn!("Installation cancelled during {stage}");
                session
                    .progress
                    .notify_error("Installation cancelled", format!("Cancelled during {stage}"))
                    .await;
            }
        }
        failure
    }

    async fn ensure_runtime(&self) -> Result<(), InstallerError> {
        if self.platform.runtime_installed().await {
            debug!("Java runtime already installed");
            return Ok(());
        }
        info!("Java runtime not found, installing");
        self.platform.install_runtime().await?;
        Ok(())
    }

    async fn verify_package(&self, session: &InstallSession, version: &str) -> Result<(), InstallerError> {
        let verifier = ChecksumVerifier::new(&self.fetcher, &session.download_base_url);
        let outcome = verifier
            .check(&session.archive_path(), version, session.profile.os_build, &session.manifest_path())
            .await?;

        if outcome.matches() {
            Ok(())
        } else {
            Err(InstallerError::ChecksumMismatch {
                expected: outcome.expected,
                actual: outcome.actual,
            })
        }
    }

    async fn fetch_sdk(&self, session: &InstallSession) -> Result<(), InstallerError> {
        let sdk = &session.config.sdk;
        let base = sdk.base_url.trim_end_matches('/');

        for name in &sdk.artifacts {
            let url = format!("{base}/{name}");
            info!("Downloading {url}");
            self.fetcher.fetch(&url, &session.install_root.join(name)).await?;
        }

        for name in &sdk.artifacts {
            let path = session.install_root.join(name);
            if !path.exists() {
                return Err(FilesystemError::MissingArtifact { path }.into());
            }
        }
        Ok(())
    }

    async fn replace_application(
        &self,
        session: &InstallSession,
        payload: &UnpackedPayload,
    ) -> Result<(), InstallerError> {
        for artifact in [&payload.application_binary_path, &payload.update_helper_binary_path] {
            if !artifact.exists() {
                return Err(FilesystemError::MissingArtifact { path: artifact.clone() }.into());
            }
        }

        let policy = ReplaceRetryPolicy::from_config(&session.config.retry);
        let from = &payload.application_binary_path;
        let to = &session.profile.install_binary_path;
        retry_with_countdown(&policy, || async move { copy(from, to) }).await?;
        info!("Installed {}", to.display());
        Ok(())
    }

    async fn replace_update_helper(
        &self,
        session: &InstallSession,
        payload: &UnpackedPayload,
    ) -> Result<(), InstallerError> {
        copy(&payload.update_helper_binary_path, &session.update_helper_path())?;
        Ok(())
    }

    async fn replace_bundle(session: &InstallSession, payload: &UnpackedPayload) -> Result<(), InstallerError> {
        let (Some(from), Some(to)) = (&payload.application_bundle_path, &session.profile.application_bundle_dir)
        else {
            return Ok(());
        };
        if !from.exists() {
            return Err(FilesystemError::MissingArtifact { path: from.clone() }.into());
        }
        copy_dir(from, to).map_err(|source| FilesystemError::Copy {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        info!("Installed {}", to.display());
        Ok(())
    }

    async fn create_shortcuts(&self, session: &InstallSession) -> Result<(), InstallerError> {
        let profile = &session.profile;
        self.platform
            .create_shortcut(&profile.shortcut_file_path, &profile.install_binary_path)
            .await?;
        for destination in profile.shortcut_copies() {
            copy(&profile.shortcut_file_path, &destination)?;
        }
        Ok(())
    }
}

fn copy(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    copy_file(from, to).map(|_| ()).map_err(|source| FilesystemError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}
