//! Checksum verification of downloaded packages.
//!
//! The expected digest is the first line of `checksum.sha256`, published next to
//! the archive. Comparison is exact string equality against the lowercase hex
//! SHA-256 of the archive: no case folding and no whitespace trimming, so a
//! manifest line with a trailing space or `\r` does not match.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::constants::CHECKSUM_MANIFEST;
use crate::core::VerifyError;
use crate::platform::OsBuild;
use crate::release::package_url;
use crate::transfer::Fetcher;

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Both digests from a verification, kept for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumOutcome {
    /// First line of the remote manifest
    pub expected: String,
    /// Hex digest of the local archive
    pub actual: String,
}

impl ChecksumOutcome {
    /// Whether the digests are identical.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

/// Verifies archives against manifests in the object store.
pub struct ChecksumVerifier<'a, F> {
    fetcher: &'a F,
    download_base_url: &'a str,
}

impl<'a, F: Fetcher> ChecksumVerifier<'a, F> {
    /// Create a verifier fetching manifests from `download_base_url`.
    pub const fn new(fetcher: &'a F, download_base_url: &'a str) -> Self {
        Self {
            fetcher,
            download_base_url,
        }
    }

    /// Verify `archive` against the manifest published for `version` and `build`.
    ///
    /// The manifest is downloaded to `manifest_dest`. Returns `Ok(false)` on a
    /// digest mismatch; only transfer and I/O problems are errors.
    ///
    /// # Errors
    ///
    /// [`VerifyError::UnsupportedPlatform`] before any network access when
    /// `build` is unsupported, otherwise transfer or read failures.
    pub async fn verify(
        &self,
        archive: &Path,
        version: &str,
        build: OsBuild,
        manifest_dest: &Path,
    ) -> Result<bool, VerifyError> {
        Ok(self.check(archive, version, build, manifest_dest).await?.matches())
    }

    /// Like [`verify`](Self::verify) but returns both digests.
    ///
    /// # Errors
    ///
    /// Same as [`verify`](Self::verify).
    pub async fn check(
        &self,
        archive: &Path,
        version: &str,
        build: OsBuild,
        manifest_dest: &Path,
    ) -> Result<ChecksumOutcome, VerifyError> {
        if !build.is_supported() {
            return Err(VerifyError::UnsupportedPlatform);
        }

        let url = package_url(self.download_base_url, version, build, CHECKSUM_MANIFEST);
        info!("Fetching checksum manifest from {url}");
        self.fetcher.fetch(&url, manifest_dest).await?;

        let expected = read_expected_digest(manifest_dest).await?;
        let actual = compute_sha256(archive).await?;

        let outcome = ChecksumOutcome { expected, actual };
        if outcome.matches() {
            debug!("Checksum verified for {}", archive.display());
        } else {
            warn!(
                "Checksum mismatch for {}: expected {}, got {}",
                archive.display(),
                outcome.expected,
                outcome.actual
            );
        }
        Ok(outcome)
    }
}

/// First `\n`-delimited line of a checksum manifest, untrimmed.
///
/// # Errors
///
/// Returns [`VerifyError::Io`] if the manifest cannot be read.
pub async fn read_expected_digest(manifest: &Path) -> Result<String, VerifyError> {
    let content = fs::read_to_string(manifest).await.map_err(|source| io_error(manifest, source))?;
    Ok(content.split('\n').next().unwrap_or_default().to_string())
}

/// Lowercase hex SHA-256 of a file, read in fixed-size chunks.
///
/// # Errors
///
/// Returns [`VerifyError::Io`] if the file cannot be opened or read.
pub async fn compute_sha256(path: &Path) -> Result<String, VerifyError> {
    debug!("Computing SHA256 checksum for: {}", path.display());

    let mut file = fs::File::open(path).await.map_err(|source| io_error(path, source))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await.map_err(|source| io_error(path, source))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn io_error(path: &Path, source: std::io::Error) -> VerifyError {
    VerifyError::Io {
        path: PathBuf::from(path),
        source,
    }
}
