//! Fetching remote resources to local files.
//!
//! Every download in the installer goes through [`Fetcher::fetch`]. The body is
//! streamed into `<dest>.tmp` and renamed over `<dest>` only after the last byte
//! has been written and synced, so a reader never sees a truncated destination.
//! There is no retry here; callers decide whether a failed transfer is fatal.

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::NetworkConfig;
use crate::constants::{PARTIAL_SUFFIX, USER_AGENT};
use crate::core::TransferError;

/// Fetches the resource at a URL into a local path.
pub trait Fetcher: Send + Sync {
    /// Download `url` to `dest`, replacing any previous file only on success.
    fn fetch(&self, url: &str, dest: &Path) -> impl Future<Output = Result<(), TransferError>> + Send;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Wrap an existing client.
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), TransferError> {
        tracing::debug!("GET {url} -> {}", dest.display());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| TransferError::network(url, e))?;

        let stream = response.bytes_stream().map_err(|e| TransferError::network(url, e));
        let written = write_stream_atomically(dest, stream).await?;
        tracing::debug!("Fetched {written} bytes from {url}");
        Ok(())
    }
}

/// Build the HTTP client shared by every network collaborator.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_client(config: &NetworkConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .build()
}

/// Path a download to `dest` is written to while in flight.
#[must_use]
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Write a byte stream to `dest` through a temporary sibling file.
///
/// Returns the number of bytes written. On any failure the temporary file is
/// removed and `dest` is left exactly as it was.
///
/// # Errors
///
/// Returns the stream's own error if it breaks off, or
/// [`TransferError::IoFailure`] if the temporary file cannot be written or renamed.
pub async fn write_stream_atomically<S>(dest: &Path, stream: S) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<Bytes, TransferError>>,
{
    let partial = partial_path(dest);

    match write_partial(&partial, stream).await {
        Ok(written) => {
            if let Err(e) = fs::rename(&partial, dest).await {
                discard_partial(&partial).await;
                return Err(TransferError::io(dest, e));
            }
            Ok(written)
        }
        Err(e) => {
            discard_partial(&partial).await;
            Err(e)
        }
    }
}

async fn write_partial<S>(partial: &Path, stream: S) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<Bytes, TransferError>>,
{
    let mut file = fs::File::create(partial).await.map_err(|e| TransferError::io(partial, e))?;
    let mut stream = std::pin::pin!(stream);
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(|e| TransferError::io(partial, e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| TransferError::io(partial, e))?;
    file.sync_all().await.map_err(|e| TransferError::io(partial, e))?;
    Ok(written)
}

async fn discard_partial(partial: &Path) {
    match fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove partial download {}: {e}", partial.display()),
    }
}
