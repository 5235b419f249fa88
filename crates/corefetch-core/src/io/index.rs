//! Package index loading.

use corefetch_schema::PackageIndex;
use reqwest::Client;
use thiserror::Error;

use super::download::{FetchError, fetch_bytes};
use crate::config::{is_local_location, local_path};

#[derive(Error, Debug)]
/// Errors raised while loading the package index.
pub enum IndexError {
    /// The document could not be retrieved.
    #[error("failed to fetch index {location}")]
    Fetch {
        /// URL or path that was requested.
        location: String,
        /// Underlying failure.
        #[source]
        source: FetchError,
    },

    /// The document is not well-formed JSON of the expected shape.
    #[error("failed to parse index: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fetch and parse the package index.
///
/// `location` is an `http(s)://` URL, a `file://` URL, or a filesystem path.
///
/// # Errors
///
/// Returns [`IndexError::Fetch`] when the document cannot be retrieved and
/// [`IndexError::Parse`] when it is malformed.
pub async fn load_index(client: &Client, location: &str) -> Result<PackageIndex, IndexError> {
    tracing::info!(location, "Loading package index");

    let bytes = if is_local_location(location) {
        tokio::fs::read(local_path(location))
            .await
            .map_err(FetchError::from)
    } else {
        fetch_bytes(client, location).await
    }
    .map_err(|source| IndexError::Fetch {
        location: location.to_string(),
        source,
    })?;

    let index = PackageIndex::from_json(&bytes)?;
    tracing::debug!(packages = index.packages.len(), "Parsed package index");
    Ok(index)
}
