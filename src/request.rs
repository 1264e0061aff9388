//! What the user submitted: a mode plus uploaded files and pasted text.
//!
//! [`ReviewRequest`] is the command-line equivalent of the submission form.
//! Adding an input checks the category slug against the mode and the input
//! kind against the category, so a malformed submission fails before any
//! file is read.

use crate::bundle::{DocumentCategory, InputKind, UserMode};
use crate::error::ReviewError;

/// Where a document's content comes from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// Local file path or HTTP/HTTPS URL of a PDF.
    Pdf(String),
    /// PDF bytes already in memory (e.g. from an upload handler).
    PdfBytes { name: String, bytes: Vec<u8> },
    /// Pasted text, used as-is.
    Text(String),
}

impl DocumentSource {
    fn kind(&self) -> InputKind {
        match self {
            DocumentSource::Pdf(_) | DocumentSource::PdfBytes { .. } => InputKind::Pdf,
            DocumentSource::Text(_) => InputKind::Pasted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub category: DocumentCategory,
    pub source: DocumentSource,
}

/// One submission for one mode.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    mode: UserMode,
    inputs: Vec<DocumentInput>,
}

impl ReviewRequest {
    pub fn new(mode: UserMode) -> Self {
        Self {
            mode,
            inputs: Vec::new(),
        }
    }

    pub fn mode(&self) -> UserMode {
        self.mode
    }

    pub fn inputs(&self) -> &[DocumentInput] {
        &self.inputs
    }

    /// Add a PDF (path or URL) under a category slug.
    pub fn with_pdf(self, slug: &str, path_or_url: impl Into<String>) -> Result<Self, ReviewError> {
        self.with_source(slug, DocumentSource::Pdf(path_or_url.into()))
    }

    /// Add in-memory PDF bytes under a category slug.
    pub fn with_pdf_bytes(
        self,
        slug: &str,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, ReviewError> {
        self.with_source(
            slug,
            DocumentSource::PdfBytes {
                name: name.into(),
                bytes,
            },
        )
    }

    /// Add pasted text to the mode's notes category.
    pub fn with_notes(self, text: impl Into<String>) -> Result<Self, ReviewError> {
        let slug = self.mode.notes_category().slug();
        self.with_source(slug, DocumentSource::Text(text.into()))
    }

    /// Add any source under a category slug, checking mode and input kind.
    ///
    /// A later input for the same category replaces the earlier one.
    pub fn with_source(mut self, slug: &str, source: DocumentSource) -> Result<Self, ReviewError> {
        let category = self.mode.category(slug)?;
        if category.input_kind() != source.kind() {
            return Err(ReviewError::WrongInputKind {
                slug: category.slug().to_string(),
                kind: source.kind().as_str(),
            });
        }
        self.inputs.retain(|i| i.category != category);
        self.inputs.push(DocumentInput { category, source });
        Ok(self)
    }

    /// Check for missing required input without touching any file.
    pub fn validate(&self) -> Result<(), ReviewError> {
        let has_upload = self
            .inputs
            .iter()
            .any(|i| i.source.kind() == InputKind::Pdf);
        if !has_upload {
            return Err(ReviewError::NoDocuments { mode: self.mode });
        }
        let required = self.mode.required_category();
        if !self.inputs.iter().any(|i| i.category == required) {
            return Err(ReviewError::MissingRequiredDocument {
                mode: self.mode,
                slug: required.slug(),
                label: required.label(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_request_accepts_student_slugs_only() {
        let req = ReviewRequest::new(UserMode::Student)
            .with_pdf("application", "app.pdf")
            .unwrap()
            .with_notes("Supervisor is happy")
            .unwrap();
        assert_eq!(req.inputs().len(), 2);
        assert_eq!(
            req.inputs()[1].category,
            DocumentCategory::SupervisorNotes
        );

        let err = ReviewRequest::new(UserMode::Student)
            .with_pdf("consent-form", "c.pdf")
            .unwrap_err();
        assert!(matches!(err, ReviewError::CategoryNotInMode { .. }));
    }

    #[test]
    fn wrong_input_kind_is_rejected() {
        let err = ReviewRequest::new(UserMode::Researcher)
            .with_pdf("notes", "notes.pdf")
            .unwrap_err();
        assert!(matches!(err, ReviewError::WrongInputKind { .. }));

        let err = ReviewRequest::new(UserMode::Researcher)
            .with_source("protocol", DocumentSource::Text("inline".into()))
            .unwrap_err();
        assert!(matches!(err, ReviewError::WrongInputKind { .. }));
    }

    #[test]
    fn later_input_replaces_earlier() {
        let req = ReviewRequest::new(UserMode::Researcher)
            .with_pdf("protocol", "v1.pdf")
            .unwrap()
            .with_pdf("protocol", "v2.pdf")
            .unwrap();
        assert_eq!(req.inputs().len(), 1);
        assert!(matches!(&req.inputs()[0].source, DocumentSource::Pdf(p) if p == "v2.pdf"));
    }

    #[test]
    fn validate_reports_missing_input() {
        let empty = ReviewRequest::new(UserMode::Researcher);
        assert!(matches!(empty.validate(), Err(ReviewError::NoDocuments { .. })));

        let notes_only = ReviewRequest::new(UserMode::Researcher)
            .with_notes("just notes")
            .unwrap();
        assert!(matches!(notes_only.validate(), Err(ReviewError::NoDocuments { .. })));

        let no_primary = ReviewRequest::new(UserMode::Researcher)
            .with_pdf("consent-form", "c.pdf")
            .unwrap();
        assert!(matches!(
            no_primary.validate(),
            Err(ReviewError::MissingRequiredDocument { slug: "protocol", .. })
        ));
    }
}
