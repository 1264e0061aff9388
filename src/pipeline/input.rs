//! Input resolution: load a user-supplied path or URL into memory.
//!
//! The extractor works on a byte buffer, so a URL is downloaded straight into
//! memory and a local file is read whole. Either way the `%PDF` magic bytes
//! are checked before returning, so a mislabelled upload fails here with a
//! clear error instead of reaching the extractor.

use crate::error::ReviewError;
use std::path::PathBuf;
use tracing::{debug, info};

/// A PDF loaded into memory, with the name it was given.
#[derive(Debug, Clone)]
pub struct LoadedPdf {
    /// File name or URL the bytes came from.
    pub source: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load the input string into memory.
///
/// URLs are downloaded with the given timeout; anything else is a local path.
pub async fn load_input(input: &str, timeout_secs: u64) -> Result<LoadedPdf, ReviewError> {
    let loaded = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    check_magic(&loaded)?;
    Ok(loaded)
}

async fn read_local(path_str: &str) -> Result<LoadedPdf, ReviewError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ReviewError::PermissionDenied { path: path.clone() },
        _ => ReviewError::FileNotFound { path: path.clone() },
    })?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(LoadedPdf {
        source: path_str.to_string(),
        bytes,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<LoadedPdf, ReviewError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReviewError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReviewError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(LoadedPdf {
        source: url.to_string(),
        bytes: bytes.to_vec(),
    })
}

/// Reject anything that does not start with `%PDF`.
fn check_magic(pdf: &LoadedPdf) -> Result<(), ReviewError> {
    if pdf.bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(ReviewError::NotAPdf {
            source_name: pdf.source.clone(),
            magic: pdf.bytes.iter().take(4).copied().collect(),
        })
    }
}
