//! Streaming artifact downloads.
//!
//! Bodies are streamed straight to disk and hashed with SHA-256 on the way
//! through, so the digest is available without a second read.

use std::io::Write;
use std::path::{Path, PathBuf};

use corefetch_schema::Checksum;
use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;

#[derive(Error, Debug)]
/// Errors raised while fetching the index or an artifact.
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, connection reset, bad URL).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code received.
        status: u16,
    },

    /// Creating or writing the destination failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Downloaded bytes do not match the index checksum.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Digest from the index.
        expected: String,
        /// Digest of the downloaded file.
        actual: String,
    },

    /// Verification was requested for a checksum algorithm we cannot compute.
    #[error("Unsupported checksum algorithm '{0}'")]
    UnsupportedChecksum(String),
}

/// A file written by [`fetch_artifact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    /// Where the body was written.
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
    /// Lowercase hex SHA-256 of the body.
    pub sha256: String,
}

/// Request for a single artifact download.
pub struct DownloadRequest<'a, R: Reporter> {
    /// HTTP client.
    pub client: &'a Client,
    /// Display name for progress reporting.
    pub name: &'a str,
    /// Display version for progress reporting.
    pub version: &'a str,
    /// Source URL.
    pub url: &'a str,
    /// Destination file.
    pub dest: &'a Path,
    /// Progress sink.
    pub reporter: &'a R,
}

impl<R: Reporter> std::fmt::Debug for DownloadRequest<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("url", &self.url)
            .field("dest", &self.dest)
            .finish_non_exhaustive()
    }
}

impl<'a, R: Reporter> DownloadRequest<'a, R> {
    /// Build a request.
    pub fn new(
        client: &'a Client,
        name: &'a str,
        version: &'a str,
        url: &'a str,
        dest: &'a Path,
        reporter: &'a R,
    ) -> Self {
        Self {
            client,
            name,
            version,
            url,
            dest,
            reporter,
        }
    }

    /// Execute the download.
    ///
    /// # Errors
    ///
    /// See [`fetch_artifact`].
    pub async fn execute(self) -> Result<FetchedArtifact, FetchError> {
        fetch_artifact(self).await
    }
}

/// Send a GET with our user agent and reject non-success statuses.
async fn get(client: &Client, url: &str) -> Result<reqwest::Response, FetchError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

/// Fetch a small document (the index) fully into memory.
///
/// # Errors
///
/// Returns [`FetchError`] on transport failure or a non-success status.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = get(client, url).await?;
    Ok(response.bytes().await?.to_vec())
}

/// Stream an artifact to `req.dest`, creating its parent directory.
///
/// # Errors
///
/// Returns [`FetchError`] on transport failure, a non-success status, or a
/// filesystem write failure. A partially written file is removed.
pub async fn fetch_artifact<R: Reporter>(
    req: DownloadRequest<'_, R>,
) -> Result<FetchedArtifact, FetchError> {
    if let Some(parent) = req.dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tracing::debug!(url = req.url, dest = %req.dest.display(), "Downloading");

    let result = stream_to_file(&req).await;
    if result.is_err() {
        tokio::fs::remove_file(req.dest).await.ok();
    }
    result
}

async fn stream_to_file<R: Reporter>(
    req: &DownloadRequest<'_, R>,
) -> Result<FetchedArtifact, FetchError> {
    let response = get(req.client, req.url).await?;
    let total_size = response.content_length();

    req.reporter.downloading(req.name, req.version, 0, total_size);

    let mut file = File::create(req.dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        req.reporter
            .downloading(req.name, req.version, downloaded, total_size);
    }

    file.flush().await?;

    Ok(FetchedArtifact {
        path: req.dest.to_path_buf(),
        size: downloaded,
        sha256: hex::encode(hasher.finalize()),
    })
}

/// Compare a fetched artifact against the checksum from the index.
///
/// An empty checksum cannot be verified and is let through with a warning.
/// On mismatch the downloaded file is removed.
///
/// # Errors
///
/// Returns [`FetchError::ChecksumMismatch`] if the digests differ and
/// [`FetchError::UnsupportedChecksum`] if the algorithm is not SHA-256.
pub async fn verify_checksum(
    fetched: &FetchedArtifact,
    expected: &Checksum,
) -> Result<(), FetchError> {
    if expected.is_empty() {
        tracing::warn!(path = %fetched.path.display(), "No checksum in index, skipping verification");
        return Ok(());
    }
    if !expected.is_sha256() {
        return Err(FetchError::UnsupportedChecksum(
            expected.algorithm().to_string(),
        ));
    }
    if fetched.sha256 != expected.digest() {
        tokio::fs::remove_file(&fetched.path).await.ok();
        return Err(FetchError::ChecksumMismatch {
            expected: expected.digest().to_string(),
            actual: fetched.sha256.clone(),
        });
    }
    tracing::debug!(path = %fetched.path.display(), "Checksum verified");
    Ok(())
}
