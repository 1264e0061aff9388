//! PDF text extraction.
//!
//! `pdf-extract` is CPU-bound and synchronous, so it runs inside
//! `spawn_blocking`. Extraction failures do not abort the review: the error
//! is rendered as literal text in place of the document so the model (and
//! the reader) can see that this document could not be read.

use crate::pipeline::input::LoadedPdf;
use crate::pipeline::normalize::normalize_text;
use tracing::{debug, warn};

/// Prefix of the text substituted when extraction fails.
pub const EXTRACTION_ERROR_PREFIX: &str = "[Error reading PDF";

/// Extract and normalise the text of a loaded PDF.
///
/// Never fails: extraction errors and extractor panics come back as
/// `[Error reading PDF: …]`.
pub async fn extract_text(pdf: LoadedPdf) -> String {
    let source = pdf.source.clone();
    let result = tokio::task::spawn_blocking(move || extract_blocking(&pdf.bytes)).await;

    match result {
        Ok(Ok(text)) => {
            let text = normalize_text(&text);
            debug!("Extracted {} chars from {}", text.chars().count(), source);
            text
        }
        Ok(Err(detail)) => {
            warn!("Text extraction failed for {}: {}", source, detail);
            extraction_failure_text(&detail)
        }
        Err(join_err) => {
            warn!("Text extraction panicked for {}: {}", source, join_err);
            extraction_failure_text(&join_err.to_string())
        }
    }
}

fn extract_blocking(bytes: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())
}

/// The literal text used in place of a document that could not be read.
pub fn extraction_failure_text(detail: &str) -> String {
    format!("{EXTRACTION_ERROR_PREFIX}: {detail}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_text_format() {
        assert_eq!(
            extraction_failure_text("invalid xref"),
            "[Error reading PDF: invalid xref]"
        );
    }

    #[tokio::test]
    async fn corrupt_pdf_becomes_literal_text() {
        let pdf = LoadedPdf {
            source: "broken.pdf".into(),
            bytes: b"%PDF-1.4\nthis is not a real document".to_vec(),
        };
        let text = extract_text(pdf).await;
        assert!(text.starts_with(EXTRACTION_ERROR_PREFIX), "got: {text}");
    }
}
