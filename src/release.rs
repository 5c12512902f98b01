//! Release registry client and object store layout.
//!
//! The registry answers "what is the latest wallet version"; the object store
//! hosts each version's package under `{base}/v{version}-{build}/`.

use serde::Deserialize;
use std::future::Future;

use crate::constants::RELEASE_VERSION_LEN;
use crate::core::RegistryError;
use crate::platform::OsBuild;

/// Resolves the latest published wallet version.
pub trait ReleaseRegistry: Send + Sync {
    /// Latest version as a bare `X.Y.Z` string.
    fn latest_version(&self) -> impl Future<Output = Result<String, RegistryError>> + Send;
}

/// Subset of the GitHub release document the installer reads.
#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

/// [`ReleaseRegistry`] backed by the GitHub releases API.
#[derive(Debug, Clone)]
pub struct GithubRegistry {
    client: reqwest::Client,
    api_url: String,
}

impl GithubRegistry {
    /// Create a registry client for a `.../releases/latest` endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }
}

impl ReleaseRegistry for GithubRegistry {
    async fn latest_version(&self) -> Result<String, RegistryError> {
        tracing::debug!("Querying latest release from {}", self.api_url);

        let response = self
            .client
            .get(&self.api_url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RegistryError::Request {
                url: self.api_url.clone(),
                reason: e.to_string(),
            })?;

        let release: LatestRelease = response.json().await.map_err(|e| RegistryError::Decode {
            reason: e.to_string(),
        })?;

        let version = parse_release_tag(&release.tag_name)?;
        tracing::info!("Latest release is {} (tag {})", version, release.tag_name);
        Ok(version)
    }
}

/// Extract the version from a release tag.
///
/// The tag must start with `v`; the version is the next five characters, which
/// must form a valid semantic version. Anything after them (`v1.1.9-linux`) is
/// ignored.
///
/// # Errors
///
/// Returns [`RegistryError::MalformedTag`] for any tag that does not fit that shape.
pub fn parse_release_tag(tag: &str) -> Result<String, RegistryError> {
    let malformed = || RegistryError::MalformedTag { tag: tag.to_string() };

    let rest = tag.strip_prefix('v').ok_or_else(malformed)?;
    let version = rest.get(..RELEASE_VERSION_LEN).ok_or_else(malformed)?;
    semver::Version::parse(version).map_err(|_| malformed())?;

    Ok(version.to_string())
}

/// URL of a file published for a version and build.
#[must_use]
pub fn package_url(base_url: &str, version: &str, build: OsBuild, file: &str) -> String {
    format!("{}/v{version}-{build}/{file}", base_url.trim_end_matches('/'))
}
