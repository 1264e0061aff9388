//! Error types for the edgequake-pdfreview library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReviewError`] — **Fatal**: the review cannot proceed at all (missing
//!   API key, no document supplied, unreadable input, every model failed).
//!   Returned as `Err(ReviewError)` from the top-level `review*` functions.
//!
//! * [`GenerateError`] — **Non-fatal**: one model identifier failed. The
//!   fallback loop records it as an [`AttemptError`] and moves on to the next
//!   candidate; it only surfaces when every candidate has failed.

use crate::bundle::UserMode;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfreview library.
#[derive(Debug, Error)]
pub enum ReviewError {
    // ── Missing input ─────────────────────────────────────────────────────
    /// No API key was supplied for the Gemini backend.
    #[error("No API key configured.\nSet GEMINI_API_KEY or pass --api-key <KEY>.")]
    MissingApiKey,

    /// Nothing was uploaded; the bundle is empty.
    #[error("No documents supplied for {mode} mode.\nUpload at least one PDF with --doc <category>=<file>.")]
    NoDocuments { mode: UserMode },

    /// The mode's primary document was not supplied.
    #[error("{mode} mode requires the '{label}' document.\nProvide it with --doc {slug}=<file>.")]
    MissingRequiredDocument {
        mode: UserMode,
        slug: &'static str,
        label: &'static str,
    },

    /// A category slug was not recognised, or belongs to the other mode.
    #[error("Category '{slug}' is not valid in {mode} mode (expected one of: {expected})")]
    CategoryNotInMode {
        mode: UserMode,
        slug: String,
        expected: String,
    },

    /// The category accepts pasted text only, or PDF only, and got the other.
    #[error("Category '{slug}' does not accept {kind} input")]
    WrongInputKind { slug: String, kind: &'static str },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every model candidate failed; no output was produced.
    #[error(
        "All {} model(s) failed: {}.\nLast error: {last_error}\n\
Check your API usage quota and try again later.",
        .attempts.len(),
        attempted_models(.attempts)
    )]
    AllModelsFailed {
        attempts: Vec<AttemptError>,
        last_error: String,
    },

    /// Listing models failed.
    #[error("Failed to list models: {0}")]
    ListModelsFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn attempted_models(attempts: &[AttemptError]) -> String {
    attempts
        .iter()
        .map(|a| a.model.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single generation call failed.
///
/// Every variant is handled identically by the fallback loop; the split only
/// exists so log lines say something useful.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum GenerateError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The API answered 200 but with no usable text (safety block, empty candidate).
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The backend could not be created for this model.
    #[error("provider unavailable: {0}")]
    Provider(String),
}

/// One failed model attempt, as recorded by the fallback loop.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("model '{model}': {error}")]
pub struct AttemptError {
    pub model: String,
    pub error: GenerateError,
}
