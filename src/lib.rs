//! Molly Wallet installer
//!
//! Installs, updates and uninstalls the Molly Constellation desktop wallet. An
//! install run resolves the latest release, downloads the platform package into
//! a staging directory, verifies it against the published SHA-256 manifest,
//! extracts it and copies the binaries into `~/.dag`, reporting progress to an
//! observer throughout.
//!
//! # Modules
//!
//! - [`installer`] - the install pipeline, its session state and the uninstall workflow
//! - [`progress`] - the progress reporter, its trickle ticker and the terminal observer
//! - [`platform`] - OS profile resolution and OS integration (runtime, shortcuts, launch)
//! - [`transfer`] - atomic downloads over HTTP
//! - [`release`] - release registry client and package URL layout
//! - [`verify`] - checksum verification
//! - [`archive`] - package extraction
//! - [`cleanup`] - filesystem preparation, post-install cleanup and teardown
//! - [`config`] - TOML configuration
//! - [`core`] - error types and user-facing error rendering
//! - [`cli`] - command-line interface
//! - [`utils`] - filesystem and home directory helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use molly_installer::config::InstallerConfig;
//! use molly_installer::installer::{InstallSession, Installer};
//! use molly_installer::platform::NativePlatform;
//! use molly_installer::progress::{ProgressReporter, TerminalObserver};
//! use molly_installer::release::GithubRegistry;
//! use molly_installer::transfer::{HttpFetcher, build_client};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = InstallerConfig::default();
//! let client = build_client(&config.network)?;
//! let registry = GithubRegistry::new(client.clone(), config.release_api_url.clone());
//! let (progress, reporter) = ProgressReporter::spawn(TerminalObserver::new(false), &config.progress);
//!
//! let mut session = InstallSession::from_environment(config, progress)?;
//! let installer = Installer::new(registry, HttpFetcher::new(client), NativePlatform);
//! let report = installer.install(&mut session).await?;
//! reporter.join().await;
//! println!("Installed {}", report.version);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod installer;
pub mod platform;
pub mod progress;
pub mod release;
pub mod transfer;
pub mod utils;
pub mod verify;
