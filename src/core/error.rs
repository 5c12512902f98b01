//! Error handling for the installer
//!
//! Every component reports failures through its own strongly-typed error so the
//! orchestrator can decide, per stage, whether a failure is fatal or merely worth
//! reporting. The component errors fold into [`InstallerError`], and the CLI turns
//! any error into an [`ErrorContext`] with a suggestion before printing it.
//!
//! # Error Categories
//!
//! - **Transfer**: [`TransferError`] for network and filesystem failures while fetching
//! - **Registry**: [`RegistryError`] for release lookups and malformed release tags
//! - **Integrity**: [`VerifyError`] for checksum manifest retrieval and hashing
//! - **Archive**: [`UnpackError`] for unreadable or corrupt release archives
//! - **Filesystem**: [`FilesystemError`] for prepare, replace and cleanup failures
//! - **Platform**: [`UnsupportedPlatformError`] and [`DependencyInstallError`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use molly_installer::core::{InstallerError, UnsupportedPlatformError, user_friendly_error};
//!
//! let error = InstallerError::from(UnsupportedPlatformError { os: "plan9".to_string() });
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while fetching a remote resource to a local path.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The request could not be sent, returned a non-success status, or the
    /// body stream broke off mid-transfer.
    #[error("Network failure while fetching {url}: {reason}")]
    NetworkFailure {
        /// URL being fetched
        url: String,
        /// Transport-level reason
        reason: String,
    },

    /// Creating, writing or renaming the local file failed.
    #[error("I/O failure while writing {path}: {source}")]
    IoFailure {
        /// File being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    pub(crate) fn network(url: &str, reason: impl fmt::Display) -> Self {
        Self::NetworkFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }
}

/// Failure while asking the release registry for the latest version.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry could not be reached or answered with an error status.
    #[error("Release registry request to {url} failed: {reason}")]
    Request {
        /// Registry endpoint
        url: String,
        /// Transport or status reason
        reason: String,
    },

    /// The registry answered but the body was not the expected JSON document.
    #[error("Release registry returned an unreadable response: {reason}")]
    Decode {
        /// Parse failure description
        reason: String,
    },

    /// The release tag did not contain a usable version.
    #[error("Malformed release tag '{tag}'")]
    MalformedTag {
        /// Tag as returned by the registry
        tag: String,
    },
}

/// Failure while checking a downloaded archive against its checksum manifest.
///
/// A digest mismatch is not represented here: the verifier reports it as
/// `Ok(false)` and leaves the policy decision to its caller.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The running OS has no published packages.
    #[error("Checksum verification is not available on an unsupported platform")]
    UnsupportedPlatform,

    /// The checksum manifest could not be downloaded.
    #[error("Unable to download the checksum manifest: {0}")]
    Transfer(#[from] TransferError),

    /// The manifest or archive could not be read.
    #[error("Unable to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Failure while extracting a release archive.
#[derive(Error, Debug)]
pub enum UnpackError {
    /// The archive is not a readable zip file or extraction failed part way.
    #[error("Corrupt archive {path}: {reason}")]
    CorruptArchive {
        /// Archive path
        path: PathBuf,
        /// Extraction failure description
        reason: String,
    },
}

/// A single path that could not be removed during prepare, cleanup or teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalFailure {
    /// Path that was left behind
    pub path: PathBuf,
    /// Why the removal failed
    pub reason: String,
}

impl fmt::Display for RemovalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Filesystem failure while preparing, replacing or cleaning up an installation.
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// One or more removals failed; every other removal was still attempted.
    #[error("Unable to remove {} path(s): {}", failures.len(), format_failures(failures))]
    Removal {
        /// Every path that could not be removed
        failures: Vec<RemovalFailure>,
    },

    /// A directory could not be created.
    #[error("Unable to create directory {path}: {source}")]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A file or bundle could not be copied into place.
    #[error("Unable to copy {from} to {to}: {source}")]
    Copy {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// An artifact expected inside the extracted package is missing.
    #[error("Expected artifact is missing: {path}")]
    MissingArtifact {
        /// Path that does not exist
        path: PathBuf,
    },
}

fn format_failures(failures: &[RemovalFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// The running operating system is not one the wallet is published for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Operating system '{os}' is not supported")]
pub struct UnsupportedPlatformError {
    /// OS identifier reported by the standard library
    pub os: String,
}

/// Failure while bootstrapping the Windows runtime prerequisite.
#[derive(Error, Debug)]
pub enum DependencyInstallError {
    /// A bootstrap command could not be started.
    #[error("Unable to run '{command}': {source}")]
    Spawn {
        /// Command line being run
        command: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A bootstrap command ran but reported failure.
    #[error("'{command}' failed: {reason}")]
    CommandFailed {
        /// Command line being run
        command: String,
        /// Exit status or captured stderr
        reason: String,
    },
}

/// Top-level error for every installer operation.
///
/// Component errors convert into this type with `?`, which lets the orchestrator
/// attach the failing stage without caring which component failed.
#[derive(Error, Debug)]
pub enum InstallerError {
    /// Download failed
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Version lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Checksum manifest could not be checked
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// The downloaded archive does not match the published digest
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// First line of the remote manifest
        expected: String,
        /// Digest of the downloaded archive
        actual: String,
    },

    /// Archive extraction failed
    #[error(transparent)]
    Unpack(#[from] UnpackError),

    /// Filesystem preparation, replacement or cleanup failed
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// The OS is not supported
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatformError),

    /// Runtime bootstrap failed
    #[error(transparent)]
    DependencyInstall(#[from] DependencyInstallError),

    /// A Windows shortcut could not be created
    #[error("Unable to create shortcut {path}: {reason}")]
    Shortcut {
        /// Shortcut path
        path: PathBuf,
        /// Script or copy failure
        reason: String,
    },

    /// The application could not be started
    #[error("Unable to launch {path}: {source}")]
    Launch {
        /// Binary being started
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Error with user-facing details and an actionable suggestion.
///
/// Details are printed in yellow and suggestions in green so the actionable part
/// stands out in a terminal.
#[derive(Debug)]
pub struct ErrorContext {
    /// Rendered error message
    pub error: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// Recognises [`InstallerError`] (directly or wrapped in a pipeline failure),
/// [`std::io::Error`] and `toml` parse errors; anything else is rendered with its
/// full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(installer_error) = cause.downcast_ref::<InstallerError>() {
            return create_error_context(&error, installer_error);
        }
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(render_chain(&error))
                .with_suggestion("Check the ownership of your home directory or run with elevated permissions");
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(format!("Invalid configuration file: {toml_error}"))
            .with_suggestion("Fix the TOML syntax or remove the file to fall back to defaults");
    }

    ErrorContext::new(render_chain(&error))
}

fn create_error_context(error: &anyhow::Error, installer_error: &InstallerError) -> ErrorContext {
    let context = ErrorContext::new(render_chain(error));
    match installer_error {
        InstallerError::Transfer(_) | InstallerError::Registry(_) => context
            .with_suggestion("Check your internet connection and try again")
            .with_details("Releases are downloaded from GitHub; proxies or rate limits can interrupt them"),
        InstallerError::Verify(_) | InstallerError::ChecksumMismatch { .. } => context
            .with_suggestion("Run the installer again to download a fresh copy of the package")
            .with_details("The downloaded package did not match its published checksum and was not installed"),
        InstallerError::Unpack(_) => context
            .with_suggestion("Run the installer again; the downloaded archive could not be extracted"),
        InstallerError::Filesystem(_) => context
            .with_suggestion("Close any running Molly Wallet instance and try again")
            .with_details("Installed files may be locked by a running wallet or another program"),
        InstallerError::UnsupportedPlatform(_) => context
            .with_suggestion("Molly Wallet is published for Windows, macOS and Linux only"),
        InstallerError::DependencyInstall(_) => context
            .with_suggestion("Install a Java runtime manually and run the installer again"),
        InstallerError::Shortcut { .. } => context
            .with_suggestion("Start Molly Wallet from the install directory or create a shortcut manually"),
        InstallerError::Launch { .. } => {
            context.with_suggestion("Start Molly Wallet manually from the install directory")
        }
    }
}

fn render_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}
