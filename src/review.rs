//! Review entry points.
//!
//! A review runs one straight line: validate the submission, prepare the
//! backend, read every document into a [`DocumentBundle`], assemble one
//! request string, and hand it to the model fallback loop. Missing input is
//! reported before any network call; only then are documents read and the
//! model contacted.

use crate::bundle::DocumentBundle;
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::generator::{GeminiGenerator, Generator, ModelInfo, ProviderGenerator};
use crate::output::{DocumentSummary, ReviewOutput, ReviewStats};
use crate::pipeline::extract::extract_text;
use crate::pipeline::input::{load_input, LoadedPdf};
use crate::pipeline::invoke::invoke_with_fallback;
use crate::pipeline::normalize::{clean_response, normalize_text};
use crate::prompts::{build_request, instruction_prompt};
use crate::request::{DocumentSource, ReviewRequest};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Text used for a PDF that opened fine but contained no extractable text.
pub const NO_TEXT_PLACEHOLDER: &str = "[No extractable text found in PDF; it may be a scanned image]";

/// Run a review with the backend selected by `config`.
///
/// Uses the `edgequake-llm` provider named in `config.provider_name` when
/// set, otherwise the built-in Gemini client (which needs `config.api_key`).
///
/// # Errors
/// - Missing input ([`ReviewError::NoDocuments`], [`ReviewError::MissingRequiredDocument`],
///   [`ReviewError::MissingApiKey`]) — nothing is read or sent
/// - Unreadable input (file not found, not a PDF, download failure)
/// - [`ReviewError::AllModelsFailed`] — every model candidate failed
pub async fn review(
    request: &ReviewRequest,
    config: &ReviewConfig,
) -> Result<ReviewOutput, ReviewError> {
    request.validate()?;

    match config.provider_name.as_deref() {
        Some(name) => {
            info!("Using edgequake-llm provider '{}'", name);
            let generator = ProviderGenerator::new(name, config);
            notify_connecting(config);
            review_with(&generator, request, config).await
        }
        None => {
            let generator = GeminiGenerator::from_config(config)?;
            notify_connecting(config);
            review_with(&generator, request, config).await
        }
    }
}

fn notify_connecting(config: &ReviewConfig) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_connecting();
    }
}

/// Run a review against an explicit backend.
///
/// This is what [`review`] calls once the backend is chosen; tests and
/// embedders use it to plug in their own [`Generator`].
pub async fn review_with<G: Generator>(
    generator: &G,
    request: &ReviewRequest,
    config: &ReviewConfig,
) -> Result<ReviewOutput, ReviewError> {
    let total_start = Instant::now();
    request.validate()?;
    info!(
        "Starting {} review with {} document(s)",
        request.mode(),
        request.inputs().len()
    );

    // ── Step 1: Read documents ───────────────────────────────────────────
    let extraction_start = Instant::now();
    let bundle = collect_bundle(request, config).await?;
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;

    // ── Step 2: Nothing to send, nothing to call ─────────────────────────
    bundle.validate()?;

    // ── Step 3: Assemble the request ─────────────────────────────────────
    let prompt = config
        .instruction_prompt
        .as_deref()
        .unwrap_or_else(|| instruction_prompt(bundle.mode()));
    let request_text = build_request(prompt, &bundle, config.max_chars_per_document);
    let request_chars = request_text.chars().count();
    debug!("Assembled request: {} chars", request_chars);

    // ── Step 4: Model fallback ───────────────────────────────────────────
    let success = invoke_with_fallback(
        generator,
        &request_text,
        &config.models,
        config.progress_callback.as_deref(),
    )
    .await?;

    let stats = ReviewStats {
        request_chars,
        input_tokens: success.generation.input_tokens,
        output_tokens: success.generation.output_tokens,
        attempts: success.failed_attempts.len() + 1,
        extraction_duration_ms,
        llm_duration_ms: success.duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Review complete: model {} after {} attempt(s), {}ms total",
        success.model, stats.attempts, stats.total_duration_ms
    );

    Ok(ReviewOutput {
        text: clean_response(&success.generation.text),
        model: success.model,
        mode: bundle.mode(),
        documents: summarize(&bundle, config.max_chars_per_document),
        failed_attempts: success.failed_attempts,
        stats,
    })
}

/// Read every input of `request` into a bundle.
///
/// PDFs are loaded and their text extracted; pasted text is normalised and
/// used as-is. Extraction failures become literal error text, but a path
/// that does not exist or is not a PDF is a fatal error.
pub async fn collect_bundle(
    request: &ReviewRequest,
    config: &ReviewConfig,
) -> Result<DocumentBundle, ReviewError> {
    let mut bundle = DocumentBundle::new(request.mode());

    for input in request.inputs() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_reading(input.category);
        }

        let text = match &input.source {
            DocumentSource::Pdf(path_or_url) => {
                let pdf = load_input(path_or_url, config.download_timeout_secs).await?;
                read_pdf(pdf).await
            }
            DocumentSource::PdfBytes { name, bytes } => {
                let pdf = LoadedPdf {
                    source: name.clone(),
                    bytes: bytes.clone(),
                };
                if !pdf.bytes.starts_with(b"%PDF") {
                    return Err(ReviewError::NotAPdf {
                        source_name: name.clone(),
                        magic: bytes.iter().take(4).copied().collect(),
                    });
                }
                read_pdf(pdf).await
            }
            DocumentSource::Text(text) => normalize_text(text),
        };

        let chars = text.chars().count();
        debug!("{}: {} chars", input.category.label(), chars);
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_ready(input.category, chars);
        }
        bundle.insert(input.category, text)?;
    }

    Ok(bundle)
}

async fn read_pdf(pdf: LoadedPdf) -> String {
    let text = extract_text(pdf).await;
    if text.trim().is_empty() {
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        text
    }
}

/// Assemble the request that would be sent, without contacting any model.
///
/// Used by `--show-request`; needs no API key.
pub async fn prepare_request(
    request: &ReviewRequest,
    config: &ReviewConfig,
) -> Result<String, ReviewError> {
    request.validate()?;
    let bundle = collect_bundle(request, config).await?;
    bundle.validate()?;
    let prompt = config
        .instruction_prompt
        .as_deref()
        .unwrap_or_else(|| instruction_prompt(bundle.mode()));
    Ok(build_request(prompt, &bundle, config.max_chars_per_document))
}

/// Run a review and write the response text to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn review_to_file(
    request: &ReviewRequest,
    output_path: impl AsRef<Path>,
    config: &ReviewConfig,
) -> Result<ReviewOutput, ReviewError> {
    let output = review(request, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ReviewError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &output.text)
        .await
        .map_err(|e| ReviewError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ReviewError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output)
}

/// Synchronous wrapper around [`review`].
///
/// Creates a temporary tokio runtime internally.
pub fn review_sync(
    request: &ReviewRequest,
    config: &ReviewConfig,
) -> Result<ReviewOutput, ReviewError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReviewError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(review(request, config))
}

/// List models available to the configured API key that support `generateContent`.
pub async fn list_models(config: &ReviewConfig) -> Result<Vec<ModelInfo>, ReviewError> {
    GeminiGenerator::from_config(config)?.list_models().await
}

fn summarize(bundle: &DocumentBundle, max_chars: usize) -> Vec<DocumentSummary> {
    bundle
        .iter()
        .map(|(category, text)| {
            let chars = text.chars().count();
            DocumentSummary {
                category,
                label: category.label().to_string(),
                chars,
                truncated: chars > max_chars,
            }
        })
        .collect()
}
